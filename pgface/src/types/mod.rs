//! Value integration with external types
//!
//! Conversion of external types into [`Value`][crate::Value].
//!
//! Available for:
//!
//! - [`serde`]'s [`Serialize`][ss] via [`Json`], requires `json` feature
//! - [`time`][::time]'s [`Date`][td], [`PrimitiveDateTime`][tp], [`UtcDateTime`][tu], requires `time` feature
//!
//! [ss]: serde::Serialize
//! [td]: ::time::Date
//! [tp]: ::time::PrimitiveDateTime
//! [tu]: ::time::UtcDateTime

#[cfg(feature = "json")]
mod json;
#[cfg(feature = "json")]
pub use json::Json;

#[cfg(feature = "time")]
mod time;
#[cfg(feature = "time")]
pub(crate) use self::time::{fmt_date, fmt_timestamp};
