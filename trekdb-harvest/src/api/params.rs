//! Lenient query-string values
//!
//! List endpoints treat a blank or unparsable value (`keep=`,
//! `pageNumber=abc`) as if the parameter were absent.

use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// `Option<T>` from an optional string; blank or invalid becomes `None`
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}
