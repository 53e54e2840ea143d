pub mod orders;
pub mod products;
pub mod reports;

use crate::errors::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Money fields are non-negative across both ledgers.
pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> Result<(), ServiceError> {
    if value < Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "{field} must not be negative"
        )));
    }
    Ok(())
}

/// Deserializes a patch field so that an absent key stays `None` while an
/// explicit JSON `null` becomes `Some(None)`. Pair with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
