//! Internal helpers for input normalization and id conversion.
//!
//! These utilities are **not** part of the public API.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Trim and NFC-normalize a display name so visually identical names collide
/// on the unique index.
///
/// Returns `None` when nothing is left after trimming.
pub(crate) fn normalize_name(value: &str) -> Option<String> {
    let normalized: String = value.trim().nfc().collect();
    (!normalized.is_empty()).then_some(normalized)
}

/// Normalize the name of an account that is about to be created or looked up.
pub(crate) fn normalize_account_name(value: &str) -> ResultEngine<String> {
    normalize_name(value).ok_or_else(|| {
        EngineError::InvalidAccountName("account name must not be empty".to_string())
    })
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}
