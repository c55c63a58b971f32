use serde::Serialize;

use crate::Value;

/// Convert any [`Serialize`] into a json [`Value`].
///
/// # Panics
///
/// Note that when converting, if [`Serialize`] implementation decide
/// to fail, it will panics.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T: Serialize> From<Json<T>> for Value {
    fn from(Json(value): Json<T>) -> Self {
        Value::Json(serde_json::to_value(value).expect("serialize json value"))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}
