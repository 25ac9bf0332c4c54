//! Namespace and collation URIs shared across the crate.

pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

pub const CODEPOINT_URI: &str = "http://www.w3.org/2005/xpath-functions/collation/codepoint";
pub const SIMPLE_CASE_URI: &str = "urn:quarry:collation:simple-case";
pub const SIMPLE_ACCENT_URI: &str = "urn:quarry:collation:simple-accent";
pub const SIMPLE_CASE_ACCENT_URI: &str = "urn:quarry:collation:simple-case-accent";

/// Largest timezone offset accepted anywhere, in minutes (14:00).
pub const MAX_TZ_MINUTES: i32 = 14 * 60;
