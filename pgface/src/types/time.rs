use std::fmt;
use time::{
    Date, PrimitiveDateTime, UtcDateTime,
    format_description::{BorrowedFormatItem as I, Component as C, modifier},
};

use crate::Value;

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(value: PrimitiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<UtcDateTime> for Value {
    /// The offset is dropped, the value is always UTC.
    fn from(value: UtcDateTime) -> Self {
        Value::Timestamp(PrimitiveDateTime::new(value.date(), value.time()))
    }
}

pub(crate) fn fmt_date(date: &Date, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = date.format(&DATE).map_err(|_| fmt::Error)?;
    f.write_str(&text)
}

pub(crate) fn fmt_timestamp(ts: &PrimitiveDateTime, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = ts.format(&TIMESTAMP).map_err(|_| fmt::Error)?;
    f.write_str(&text)
}

const DATE: &[I<'_>] = &[
    I::Component(C::Year(modifier::Year::default())),
    I::Literal(b"-"),
    I::Component(C::Month(modifier::Month::default())),
    I::Literal(b"-"),
    I::Component(C::Day(modifier::Day::default())),
];

const TIMESTAMP: &[I<'_>] = &[
    I::Compound(DATE),
    I::Literal(b" "),
    I::Component(C::Hour(modifier::Hour::default())),
    I::Literal(b":"),
    I::Component(C::Minute(modifier::Minute::default())),
    I::Literal(b":"),
    I::Component(C::Second(modifier::Second::default())),
    I::Literal(b"."),
    I::Component(C::Subsecond(modifier::Subsecond::default())),
];
