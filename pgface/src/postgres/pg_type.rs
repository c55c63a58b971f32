//! Postgres builtin types.
//!
//! Result columns are described by type name, e.g. `"text"`, which is resolved
//! by [`lookup`] into its oid and size.

/// Postgres object identifier.
///
/// The oid type is implemented as an unsigned four-byte integer.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
pub type Oid = u32;

/// Oid and storage size of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgTypeInfo {
    pub oid: Oid,
    /// Storage size in bytes, negative for variable length type.
    pub size: i16,
}

macro_rules! pg_types {
    ($(
        $(#[$doc:meta])* $name:ident = $oid:literal, $size:literal, $($alias:literal)|*;
    )*) => {
        $(
            $(#[$doc])*
            pub const $name: PgTypeInfo = PgTypeInfo { oid: $oid, size: $size };
        )*

        /// Resolve type name into [`PgTypeInfo`], case insensitive.
        ///
        /// Returns [`None`] for unknown type name.
        pub fn lookup(name: &str) -> Option<PgTypeInfo> {
            match name.trim().to_ascii_lowercase().as_str() {
                $($($alias)|* => Some($name),)*
                _ => None,
            }
        }
    };
}

pg_types! {
    /// `bool` boolean, 'true'/'false'
    BOOL = 16, 1, "bool" | "boolean";
    /// `bytea` variable-length string, binary values escaped
    BYTEA = 17, -1, "bytea";
    /// `char` single character
    CHAR = 18, 1, "char" | "\"char\"";
    /// `name` 63-byte type for storing system identifiers
    NAME = 19, 64, "name";
    /// `int8` ~18 digit integer, 8-byte storage
    INT8 = 20, 8, "int8" | "bigint";
    /// `int2` -32 thousand to 32 thousand, 2-byte storage
    INT2 = 21, 2, "int2" | "smallint";
    /// `int4` -2 billion to 2 billion integer, 4-byte storage
    INT4 = 23, 4, "int4" | "int" | "integer";
    /// `text` variable-length string, no limit specified
    TEXT = 25, -1, "text" | "string";
    /// `oid` object identifier(oid), maximum 4 billion
    OID = 26, 4, "oid";
    /// `json` JSON stored as text
    JSON = 114, -1, "json";
    /// `float4` single-precision floating point number, 4-byte storage
    FLOAT4 = 700, 4, "float4" | "real";
    /// `float8` double-precision floating point number, 8-byte storage
    FLOAT8 = 701, 8, "float8" | "double precision" | "double" | "float";
    /// `bpchar` blank-padded string, fixed storage length
    BPCHAR = 1042, -1, "bpchar" | "character";
    /// `varchar` non-blank-padded string, variable storage length
    VARCHAR = 1043, -1, "varchar" | "character varying";
    /// `date` date
    DATE = 1082, 4, "date";
    /// `time` time of day
    TIME = 1083, 8, "time";
    /// `timestamp` date and time
    TIMESTAMP = 1114, 8, "timestamp";
    /// `timestamptz` date and time with time zone
    TIMESTAMPTZ = 1184, 8, "timestamptz";
    /// `interval` time interval
    INTERVAL = 1186, 16, "interval";
    /// `numeric` exact numeric of selectable precision
    NUMERIC = 1700, -1, "numeric" | "decimal";
    /// `uuid` UUID
    UUID = 2950, 16, "uuid";
    /// `jsonb` Binary JSON
    JSONB = 3802, -1, "jsonb";
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_names() {
        assert_eq!(lookup("text"), Some(TEXT));
        assert_eq!(lookup("Integer"), Some(INT4));
        assert_eq!(lookup(" double precision "), Some(FLOAT8));
        assert_eq!(lookup("date").map(|e| e.size), Some(4));
        assert_eq!(lookup("geometry"), None);
    }
}
