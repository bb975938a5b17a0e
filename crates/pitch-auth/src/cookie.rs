//! Segmented credential cookies.
//!
//! The server-side credential is a JSON payload, base64url encoded with
//! a `base64-` prefix. Browsers cap a cookie at roughly 4 KiB, so the
//! value is split into chunks named `<name>.0`, `<name>.1`, ... A value
//! that fits in one chunk is written under the bare name.
//!
//! Writing one form expires the other, so a browser never holds a stale
//! bare cookie next to fresh chunks (or the reverse).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

pub const DEFAULT_CHUNK_SIZE: usize = 3180;
const PAYLOAD_PREFIX: &str = "base64-";

/// Tokens carried by the server-side credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPayload {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPayload {
    pub fn encode(&self) -> String {
        // Serializing two strings cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        format!("{PAYLOAD_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let encoded = raw.strip_prefix(PAYLOAD_PREFIX)?;
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// Parse a `Cookie` request header into name/value pairs.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Split `value` into cookies of at most `chunk_size` bytes.
///
/// Chunks end on char boundaries. When a single char is wider than
/// `chunk_size` it gets a chunk of its own.
pub fn split_into_chunks(name: &str, value: &str, chunk_size: usize) -> Vec<(String, String)> {
    let chunk_size = chunk_size.max(1);
    if value.len() <= chunk_size {
        return vec![(name.to_string(), value.to_string())];
    }

    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = chunk_size.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = rest
                .char_indices()
                .nth(1)
                .map_or(rest.len(), |(idx, _)| idx);
        }
        let (head, tail) = rest.split_at(end);
        chunks.push((format!("{name}.{}", chunks.len()), head.to_string()));
        rest = tail;
    }
    chunks
}

/// Reassemble a value written by [`split_into_chunks`].
///
/// Chunks are read in index order until the first gap. Empty values
/// are expired cookies and count as absent.
pub fn combine_chunks(name: &str, cookies: &[(String, String)]) -> Option<String> {
    let lookup = |wanted: &str| {
        cookies
            .iter()
            .find(|(n, v)| n == wanted && !v.is_empty())
            .map(|(_, v)| v.as_str())
    };

    if let Some(whole) = lookup(name) {
        return Some(whole.to_string());
    }

    let mut combined = String::new();
    for idx in 0.. {
        match lookup(&format!("{name}.{idx}")) {
            Some(part) => combined.push_str(part),
            None => break,
        }
    }
    (!combined.is_empty()).then_some(combined)
}

fn attributes(config: &AuthConfig, max_age: u64) -> String {
    let mut attrs = format!("Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if config.cookie_secure {
        attrs.push_str("; Secure");
    }
    attrs
}

/// `Set-Cookie` header values for a freshly issued credential.
///
/// The live cookies come first, followed by expiring headers for the
/// form not written: the bare name when chunked, `<name>.0` when bare,
/// and the chunk index right after the last one written.
pub fn set_cookie_headers(config: &AuthConfig, payload: &CredentialPayload) -> Vec<String> {
    let name = &config.cookie_name;
    let attrs = attributes(config, config.refresh_token_lifetime_secs);
    let expired = attributes(config, 0);

    let chunks = split_into_chunks(name, &payload.encode(), config.cookie_chunk_size);
    let stale = if chunks.len() == 1 && &chunks[0].0 == name {
        vec![format!("{name}.0")]
    } else {
        vec![name.clone(), format!("{name}.{}", chunks.len())]
    };

    chunks
        .into_iter()
        .map(|(name, value)| format!("{name}={value}; {attrs}"))
        .chain(stale.into_iter().map(|name| format!("{name}=; {expired}")))
        .collect()
}

/// `Set-Cookie` header values that expire every credential chunk the
/// request carried.
pub fn clear_cookie_headers(config: &AuthConfig, cookies: &[(String, String)]) -> Vec<String> {
    let attrs = attributes(config, 0);
    let prefix = format!("{}.", config.cookie_name);
    cookies
        .iter()
        .filter(|(name, _)| {
            name == &config.cookie_name
                || name
                    .strip_prefix(&prefix)
                    .is_some_and(|idx| idx.parse::<usize>().is_ok())
        })
        .map(|(name, _)| format!("{name}=; {attrs}"))
        .collect()
}
