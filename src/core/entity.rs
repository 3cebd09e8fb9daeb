//! Record trait shared by every owner-scoped table

use chrono::{DateTime, Utc};

/// Base trait for all owner-scoped, soft-deletable records.
///
/// Every record has:
/// - id: store-assigned identifier
/// - openid: owner identity issued by the auth layer
/// - is_delete: soft-delete marker
/// - create_time / update_time
///
/// Rows are never physically removed; a deleted row keeps its data and
/// simply stops being visible.
pub trait Record: Clone + Send + Sync + 'static {
    /// Table name, used in logs and storage errors
    fn table_name() -> &'static str;

    fn id(&self) -> i64;

    /// Assign the identifier chosen by the store
    fn set_id(&mut self, id: i64);

    fn openid(&self) -> &str;

    fn is_delete(&self) -> bool;

    fn create_time(&self) -> DateTime<Utc>;

    fn update_time(&self) -> DateTime<Utc>;

    /// Mark the row as deleted
    fn soft_delete(&mut self);

    /// Refresh `update_time`
    fn touch(&mut self);

    /// Check if the row is visible to `openid`
    fn is_live_for(&self, openid: &str) -> bool {
        !self.is_delete() && self.openid() == openid
    }
}

/// Implement [`Record`] for a struct with the standard owner-scoped columns
macro_rules! impl_record {
    ($type:ident, $table:expr) => {
        impl $crate::core::Record for $type {
            fn table_name() -> &'static str {
                $table
            }

            fn id(&self) -> i64 {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = id;
            }

            fn openid(&self) -> &str {
                &self.openid
            }

            fn is_delete(&self) -> bool {
                self.is_delete
            }

            fn create_time(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.create_time
            }

            fn update_time(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.update_time
            }

            fn soft_delete(&mut self) {
                self.is_delete = true;
                self.update_time = ::chrono::Utc::now();
            }

            fn touch(&mut self) {
                self.update_time = ::chrono::Utc::now();
            }
        }
    };
}

pub(crate) use impl_record;
