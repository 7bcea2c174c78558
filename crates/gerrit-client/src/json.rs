//! Gerrit JSON helpers
//!
//! Gerrit prepends `)]}'` to every JSON response so the body cannot be
//! evaluated as a script. The marker is stripped here, before any parsing.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;

/// Anti-XSSI marker prepended to every Gerrit JSON response
pub const XSSI_PREFIX: &[u8] = b")]}'";

/// Longest body excerpt quoted in decode errors
const SNIPPET_LEN: usize = 100;

/// Strip the anti-XSSI marker, if present
pub fn strip_xssi_prefix(body: &[u8]) -> &[u8] {
    body.strip_prefix(XSSI_PREFIX).unwrap_or(body)
}

/// Decode a Gerrit response body
///
/// The body must start with [`XSSI_PREFIX`]. Errors quote at most the first
/// 100 bytes of the body.
pub fn unmarshal<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let Some(content) = body.strip_prefix(XSSI_PREFIX) else {
        return Err(Error::MissingXssiPrefix {
            snippet: snippet(body),
        });
    };

    serde_json::from_slice(content).map_err(|source| Error::Decode {
        snippet: snippet(body),
        source,
    })
}

fn snippet(body: &[u8]) -> String {
    let end = body.len().min(SNIPPET_LEN);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
