
/// Postgres data transmission format.
///
/// For specific information, see its variant documentation.
///
/// <https://www.postgresql.org/docs/current/protocol-overview.html#PROTOCOL-FORMAT-CODES>
///
/// [t]: PgFormat::Text
/// [b]: PgFormat::Binary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PgFormat {
    /// Text has format code zero.
    ///
    /// In the [`Text`][t] transmitted representation, there is no trailing null character;
    /// the frontend must add one to received values if it wants to process them as C strings.
    /// (The [`Text`][t] format does not allow embedded nulls, by the way.)
    ///
    /// [t]: PgFormat::Text
    #[default]
    Text,
    /// Binary has format code one.
    ///
    /// [`Binary`][b] representations for integers use network byte order (most significant byte first).
    /// For other data types consult the documentation or source code to learn about the binary representation.
    /// Keep in mind that binary representations for complex data types might change across server versions.
    ///
    /// [b]: PgFormat::Binary
    Binary,
}

impl PgFormat {
    /// Return format code for current format.
    pub fn format_code(&self) -> i16 {
        match self {
            PgFormat::Text => 0,
            PgFormat::Binary => 1,
        }
    }

    /// Returns format from format code, [`None`] for unknown code.
    pub fn from_code(code: i16) -> Option<PgFormat> {
        match code {
            0 => Some(PgFormat::Text),
            1 => Some(PgFormat::Binary),
            _ => None,
        }
    }

    /// Resolve the format of the `nth` item from a list of format codes.
    ///
    /// The list can be empty to use [`Text`][PgFormat::Text] for all items, or one
    /// to apply the format to all items, or it contains format for each item.
    pub fn nth(codes: &[i16], nth: usize) -> Option<PgFormat> {
        match codes {
            [] => Some(PgFormat::Text),
            [code] => PgFormat::from_code(*code),
            codes => PgFormat::from_code(*codes.get(nth)?),
        }
    }
}
