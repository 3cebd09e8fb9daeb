//! CSV rendering of binset rows
//!
//! Output is one header line followed by one line per row. Lines are encoded
//! as the row stream is polled, so an export never holds the whole table.

use super::model::Binset;
use super::store::RowStream;
use crate::core::StorageError;
use chrono::{DateTime, Local};
use futures::stream::{self, BoxStream, StreamExt};

/// Timestamp format of the `create_time` / `update_time` columns
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Encoded CSV lines
pub type CsvStream = BoxStream<'static, Result<String, ExportError>>;

/// Errors raised while producing an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Header language of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Chinese,
    English,
}

impl Locale {
    /// `zh-hans` selects Chinese headers; anything else, including no
    /// value, selects English.
    pub fn from_lang(lang: Option<&str>) -> Self {
        match lang {
            Some("zh-hans") => Locale::Chinese,
            _ => Locale::English,
        }
    }

    /// Column labels, in column order
    pub const fn headers(self) -> [&'static str; 5] {
        match self {
            Locale::Chinese => ["库位名称", "库位尺寸", "库位属性", "创建时间", "更新时间"],
            Locale::English => [
                "Bin Name",
                "Bin Size",
                "Bin Property",
                "Create Time",
                "Update Time",
            ],
        }
    }
}

/// Render `rows` as CSV lines, header first
pub fn render(locale: Locale, rows: RowStream) -> CsvStream {
    let header = stream::once(async move { encode_line(&locale.headers()) });
    let body = rows.map(|row| row_line(&row?));

    header.chain(body).boxed()
}

/// Encode one binset as a CSV line
pub fn row_line(row: &Binset) -> Result<String, ExportError> {
    let create_time = row.create_time.format(TIME_FORMAT).to_string();
    let update_time = row.update_time.format(TIME_FORMAT).to_string();

    encode_line(&[
        row.bin_name.as_str(),
        row.bin_size.as_str(),
        row.bin_property.as_str(),
        create_time.as_str(),
        update_time.as_str(),
    ])
}

fn encode_line(fields: &[&str]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;

    Ok(String::from_utf8(bytes)?)
}

/// Attachment filename stamped with the generation time, to the microsecond
pub fn export_filename(now: DateTime<Local>) -> String {
    format!("binset_{}.csv", now.format("%Y%m%d%H%M%S%6f"))
}
