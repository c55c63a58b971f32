//! SQLSTATE error codes.
//!
//! Only the codes a protocol server is likely to report are listed.
//!
//! <https://www.postgresql.org/docs/current/errcodes-appendix.html>

// Class 00 - Successful Completion
pub const SUCCESSFUL_COMPLETION: &str = "00000";

// Class 08 - Connection Exception
pub const CONNECTION_EXCEPTION: &str = "08000";
pub const PROTOCOL_VIOLATION: &str = "08P01";

// Class 0A - Feature Not Supported
pub const FEATURE_NOT_SUPPORTED: &str = "0A000";

// Class 26 - Invalid SQL Statement Name
pub const INVALID_SQL_STATEMENT_NAME: &str = "26000";

// Class 28 - Invalid Authorization Specification
pub const INVALID_AUTHORIZATION_SPECIFICATION: &str = "28000";
pub const INVALID_PASSWORD: &str = "28P01";

// Class 34 - Invalid Cursor Name
pub const INVALID_CURSOR_NAME: &str = "34000";

// Class 42 - Syntax Error or Access Rule Violation
pub const SYNTAX_ERROR: &str = "42601";
pub const UNDEFINED_TABLE: &str = "42P01";

// Class 57 - Operator Intervention
pub const ADMIN_SHUTDOWN: &str = "57P01";

// Class 58 - System Error (errors external to PostgreSQL itself)
pub const SYSTEM_ERROR: &str = "58000";
pub const IO_ERROR: &str = "58030";

// Class XX - Internal Error
pub const INTERNAL_ERROR: &str = "XX000";
