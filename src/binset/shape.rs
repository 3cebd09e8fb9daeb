//! Action -> request/response shape mapping
//!
//! Each controller action has one fixed shape, resolved once per call.

use super::model::{BinsetDraft, BinsetPatch, BinsetPost, BinsetUpdate, require_all};
use crate::core::ApiError;
use serde::de::DeserializeOwned;
use std::fmt;
use validator::Validate;

/// Controller actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    /// The request/response shape for this action
    pub const fn shape(self) -> Shape {
        match self {
            Action::List | Action::Retrieve | Action::Destroy => Shape::Get,
            Action::Create => Shape::Post,
            Action::Update => Shape::Update,
            Action::PartialUpdate => Shape::PartialUpdate,
        }
    }

    /// Action name as routed (`destroy` for soft deletes)
    pub const fn name(self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::PartialUpdate => "partial_update",
            Action::Destroy => "destroy",
        }
    }

    /// Verb used in ownership error messages
    pub const fn verb(self) -> &'static str {
        match self {
            Action::Destroy => "delete",
            other => other.name(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request body shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// No request body; responds with the full record representation
    Get,
    /// All writable fields required, owner injected by the server
    Post,
    /// All writable fields required
    Update,
    /// Any subset of writable fields
    PartialUpdate,
}

/// A decoded and field-validated request body
#[derive(Debug, Clone)]
pub enum Payload {
    Post(BinsetPost),
    Update(BinsetUpdate),
    PartialUpdate(BinsetPatch),
}

impl Shape {
    /// Decode and validate a JSON request body for this shape
    pub fn decode(self, body: &[u8]) -> Result<Payload, ApiError> {
        match self {
            Shape::Get => Err(ApiError::Internal(
                "read actions do not take a request body".to_string(),
            )),
            Shape::Post => decode_validated(body).map(Payload::Post),
            Shape::Update => decode_validated(body).map(Payload::Update),
            Shape::PartialUpdate => decode_validated(body).map(Payload::PartialUpdate),
        }
    }
}

fn decode_validated<T: DeserializeOwned + Validate>(body: &[u8]) -> Result<T, ApiError> {
    // An empty PATCH/PUT body is an empty object, like a form with no fields.
    let value: T = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_slice(b"{}")?
    } else {
        serde_json::from_slice(body)?
    };
    value.validate()?;
    Ok(value)
}

impl Payload {
    /// Resolve the writable fields, overlaying partial updates on `current`
    pub fn into_draft(self, current: Option<BinsetDraft>) -> Result<BinsetDraft, ApiError> {
        match self {
            Payload::Post(p) => Ok(require_all(p.bin_name, p.bin_size, p.bin_property)?),
            Payload::Update(u) => Ok(require_all(u.bin_name, u.bin_size, u.bin_property)?),
            Payload::PartialUpdate(patch) => match current {
                Some(current) => Ok(patch.merge(current)),
                None => Err(ApiError::Internal(
                    "partial update needs the stored row".to_string(),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValidationError;

    #[test]
    fn test_action_shapes() {
        assert_eq!(Action::List.shape(), Shape::Get);
        assert_eq!(Action::Retrieve.shape(), Shape::Get);
        assert_eq!(Action::Destroy.shape(), Shape::Get);
        assert_eq!(Action::Create.shape(), Shape::Post);
        assert_eq!(Action::Update.shape(), Shape::Update);
        assert_eq!(Action::PartialUpdate.shape(), Shape::PartialUpdate);
    }

    #[test]
    fn test_ownership_verbs() {
        assert_eq!(Action::Update.verb(), "update");
        assert_eq!(Action::PartialUpdate.verb(), "partial_update");
        assert_eq!(Action::Destroy.verb(), "delete");
        assert_eq!(Action::Destroy.to_string(), "destroy");
        assert_eq!(Action::PartialUpdate.to_string(), "partial_update");
    }

    #[test]
    fn test_decode_post() {
        let payload = Shape::Post
            .decode(br#"{"bin_name":"A","bin_size":"S1","bin_property":"P1"}"#)
            .unwrap();
        let draft = payload.into_draft(None).unwrap();
        assert_eq!(draft.bin_name, "A");
    }

    #[test]
    fn test_decode_update_requires_all_fields() {
        let err = Shape::Update.decode(br#"{"bin_name":"A"}"#).unwrap_err();
        match err {
            ApiError::Validation(ValidationError::FieldErrors(fields)) => {
                assert!(fields.contains_key("bin_size"));
                assert!(fields.contains_key("bin_property"));
                assert!(!fields.contains_key("bin_name"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_patch_is_noop() {
        let current = BinsetDraft {
            bin_name: "A".to_string(),
            bin_size: "S1".to_string(),
            bin_property: "P1".to_string(),
        };
        let payload = Shape::PartialUpdate.decode(b"").unwrap();
        assert_eq!(payload.into_draft(Some(current.clone())).unwrap(), current);
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = Shape::Post.decode(b"{not json").unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_get_shape_has_no_body() {
        assert!(matches!(Shape::Get.decode(b"{}"), Err(ApiError::Internal(_))));
    }
}
