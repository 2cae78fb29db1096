use serde::{Deserialize, Deserializer};

pub mod discovery;
pub mod fulfillment;
pub mod message;
pub mod thread;

/// Reads an explicit JSON `null` as the type's default.
///
/// Store rows carry every column, so nullable columns arrive as `null`
/// rather than as missing keys. Pair with `#[serde(default)]` to cover both.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
