//! Prepared statement and portal registered by the extended query protocol.
use bytes::Bytes;

use crate::{
    common::ByteStr,
    postgres::{Oid, PgFormat},
};

/// A statement created by `Parse` message.
///
/// Empty name is the unnamed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    pub name: ByteStr,
    pub query: ByteStr,
    /// Parameter types prespecified by the client, zero is unspecified.
    pub param_types: Vec<Oid>,
}

/// A statement bound with parameters by `Bind` message.
///
/// Empty name is the unnamed portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    pub name: ByteStr,
    /// The source statement, as it was when the portal is bound.
    pub statement: PreparedStatement,
    pub param_formats: Vec<i16>,
    /// Raw parameter values, [`None`] is `NULL`.
    pub params: Vec<Option<Bytes>>,
    pub result_formats: Vec<i16>,
}

impl Portal {
    pub fn query(&self) -> &str {
        &self.statement.query
    }

    /// Returns the format of the `nth` parameter.
    pub fn param_format(&self, nth: usize) -> Option<PgFormat> {
        PgFormat::nth(&self.param_formats, nth)
    }

    /// Returns the format the client requested for the `nth` result column.
    pub fn result_format(&self, nth: usize) -> Option<PgFormat> {
        PgFormat::nth(&self.result_formats, nth)
    }

    /// Returns the `nth` parameter as text.
    ///
    /// Outer [`None`] for out of bound, inner [`None`] for `NULL`. Invalid
    /// utf8 is replaced, so binary parameter should be read from [`params`][Portal::params].
    pub fn param_str(&self, nth: usize) -> Option<Option<ByteStr>> {
        let param = self.params.get(nth)?;
        Some(param.clone().map(ByteStr::from_utf8_lossy))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn portal_params() {
        let portal = Portal {
            name: ByteStr::from_static("p1"),
            statement: PreparedStatement {
                name: ByteStr::from_static("s1"),
                query: ByteStr::from_static("SELECT $1, $2"),
                param_types: vec![25, 23],
            },
            param_formats: vec![0, 1],
            params: vec![Some(Bytes::from_static(b"foo")), None],
            result_formats: vec![],
        };

        assert_eq!(portal.query(), "SELECT $1, $2");
        assert_eq!(portal.param_str(0), Some(Some(ByteStr::from_static("foo"))));
        assert_eq!(portal.param_str(1), Some(None));
        assert_eq!(portal.param_str(2), None);
        assert_eq!(portal.param_format(1), Some(PgFormat::Binary));
        assert_eq!(portal.result_format(5), Some(PgFormat::Text));
    }
}
