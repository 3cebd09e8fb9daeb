//! Binset record and request bodies

use crate::core::entity::impl_record;
use crate::core::field::{FieldKind, FieldValue, Filterable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A named bin size + bin property combination owned by one account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Binset {
    pub id: i64,
    pub openid: String,
    pub bin_name: String,
    pub bin_size: String,
    pub bin_property: String,
    pub is_delete: bool,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl_record!(Binset, "binset");

impl Binset {
    /// Build an unsaved row; the store assigns `id`
    pub fn new(openid: impl Into<String>, draft: BinsetDraft) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            openid: openid.into(),
            bin_name: draft.bin_name,
            bin_size: draft.bin_size,
            bin_property: draft.bin_property,
            is_delete: false,
            create_time: now,
            update_time: now,
        }
    }

    /// The writable fields as they currently stand
    pub fn draft(&self) -> BinsetDraft {
        BinsetDraft {
            bin_name: self.bin_name.clone(),
            bin_size: self.bin_size.clone(),
            bin_property: self.bin_property.clone(),
        }
    }

    /// Overwrite the writable fields
    pub fn apply(&mut self, draft: BinsetDraft) {
        self.bin_name = draft.bin_name;
        self.bin_size = draft.bin_size;
        self.bin_property = draft.bin_property;
    }
}

impl Filterable for Binset {
    fn field_kind(field: &str) -> Option<FieldKind> {
        match field {
            "id" => Some(FieldKind::Integer),
            "openid" | "bin_name" | "bin_size" | "bin_property" => Some(FieldKind::String),
            "is_delete" => Some(FieldKind::Boolean),
            "create_time" | "update_time" => Some(FieldKind::DateTime),
            _ => None,
        }
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        Some(match field {
            "id" => FieldValue::Integer(self.id),
            "openid" => FieldValue::String(self.openid.clone()),
            "bin_name" => FieldValue::String(self.bin_name.clone()),
            "bin_size" => FieldValue::String(self.bin_size.clone()),
            "bin_property" => FieldValue::String(self.bin_property.clone()),
            "is_delete" => FieldValue::Boolean(self.is_delete),
            "create_time" => FieldValue::DateTime(self.create_time),
            "update_time" => FieldValue::DateTime(self.update_time),
            _ => return None,
        })
    }
}

/// The client-writable fields of a binset, fully resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinsetDraft {
    pub bin_name: String,
    pub bin_size: String,
    pub bin_property: String,
}

const REQUIRED: &str = "This field is required.";

/// POST body. `openid` and any other unknown keys are ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BinsetPost {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub bin_name: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub bin_size: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub bin_property: Option<String>,
}

/// PUT body: every writable field must be present
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BinsetUpdate {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub bin_name: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub bin_size: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub bin_property: Option<String>,
}

/// PATCH body: any subset of the writable fields
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BinsetPatch {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Ensure this field has between 1 and 255 characters."
    ))]
    pub bin_name: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Ensure this field has between 1 and 255 characters."
    ))]
    pub bin_size: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Ensure this field has between 1 and 255 characters."
    ))]
    pub bin_property: Option<String>,
}

impl BinsetPatch {
    /// Overlay the patch on the stored values
    pub fn merge(self, current: BinsetDraft) -> BinsetDraft {
        BinsetDraft {
            bin_name: self.bin_name.unwrap_or(current.bin_name),
            bin_size: self.bin_size.unwrap_or(current.bin_size),
            bin_property: self.bin_property.unwrap_or(current.bin_property),
        }
    }
}

/// Turn three validated-required fields into a draft.
///
/// Only called after `validate()` succeeded, so a `None` here is reported as
/// the same field error the validator would have produced.
pub(crate) fn require_all(
    bin_name: Option<String>,
    bin_size: Option<String>,
    bin_property: Option<String>,
) -> Result<BinsetDraft, crate::core::ValidationError> {
    let missing = |field: &str| crate::core::ValidationError::field(field, REQUIRED);
    Ok(BinsetDraft {
        bin_name: bin_name.ok_or_else(|| missing("bin_name"))?,
        bin_size: bin_size.ok_or_else(|| missing("bin_size"))?,
        bin_property: bin_property.ok_or_else(|| missing("bin_property"))?,
    })
}
