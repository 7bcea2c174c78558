//! HTTP basic authentication for Gerrit

use base64::{engine::general_purpose, Engine as _};
use std::fmt;

/// Adds `Authorization: Basic ...` to outgoing requests
///
/// Built from a `user:secret` string. Surrounding whitespace (a trailing
/// newline from an auth file, typically) is ignored.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    encoded: String,
}

impl BasicAuth {
    pub fn new(who: &str) -> Self {
        Self {
            encoded: general_purpose::STANDARD.encode(who.trim()),
        }
    }

    /// Base64 of the trimmed `user:secret` string
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.encoded)
    }
}

// Never print the credential.
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth").finish_non_exhaustive()
    }
}
