//! Common utilities shared across modules.

use chrono::Utc;

/// Current UTC time as an RFC 3339 string, for output metadata.
pub fn utc_now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
