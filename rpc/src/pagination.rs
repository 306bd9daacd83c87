//! Cursor-based pagination for the badge listing endpoint.
//!
//! A cursor is the base64 of the decimal badge id the next page starts at.
//! Clients treat it as opaque; an unreadable cursor silently restarts the
//! listing from the first badge.

use serde::{Deserialize, Serialize};

/// Default page size when `count` is not specified.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum allowed page size.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Query parameters accepted by the badge listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    /// Opaque cursor from a previous response.
    pub cursor: Option<String>,
    /// Requested page size.
    pub count: Option<u32>,
}

impl PaginationParams {
    /// The page size to serve, after defaulting and clamping to
    /// [1, `MAX_PAGE_SIZE`].
    pub fn page_size(&self) -> u32 {
        self.count
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Badge id the page starts at: the decoded cursor, or 1 (the first id
    /// ever assigned) when the cursor is absent or unreadable.
    pub fn start_id(&self) -> u64 {
        self.cursor.as_deref().and_then(decode_cursor).unwrap_or(1)
    }
}

/// Paging trailer attached to list responses.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    /// Cursor for the next page; omitted on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Encode a badge id into an opaque cursor string.
pub fn encode_cursor(id: u64) -> String {
    base64_encode(id.to_string().as_bytes())
}

/// Decode a cursor string back to a badge id.
pub fn decode_cursor(cursor: &str) -> Option<u64> {
    let bytes = base64_decode(cursor)?;
    std::str::from_utf8(&bytes).ok()?.parse::<u64>().ok()
}

/// Cursor for the page after one ending at `last_id`, or `None` when the
/// short page shows the listing is exhausted.
pub fn next_cursor(last_id: u64, returned: usize, page_size: u32) -> Option<String> {
    if (returned as u32) < page_size {
        None
    } else {
        Some(encode_cursor(last_id + 1))
    }
}

// Minimal base64, unpadded on output, so cursors stay dependency-free and
// query-string friendly.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() + 2) / 3 * 4);
    for chunk in data.chunks(3) {
        let mut window = 0u32;
        for (i, &byte) in chunk.iter().enumerate() {
            window |= (byte as u32) << (16 - 8 * i);
        }
        // One output character per 6 bits: 2 for one byte, 3 for two, 4 for three.
        for slot in 0..=chunk.len() {
            let sextet = (window >> (18 - 6 * slot)) & 0x3F;
            out.push(ALPHABET[sextet as usize] as char);
        }
    }
    out
}

/// Padding is accepted but not required.
fn base64_decode(input: &str) -> Option<Vec<u8>> {
    let sextets: Vec<u32> = input
        .bytes()
        .take_while(|&b| b != b'=')
        .map(sextet_value)
        .collect::<Option<_>>()?;
    let mut out = Vec::with_capacity(sextets.len() * 3 / 4);
    for group in sextets.chunks(4) {
        if group.len() == 1 {
            // A lone sextet cannot form a byte.
            return None;
        }
        let mut window = 0u32;
        for (i, &sextet) in group.iter().enumerate() {
            window |= sextet << (18 - 6 * i);
        }
        for byte in 0..group.len() - 1 {
            out.push((window >> (16 - 8 * byte)) as u8);
        }
    }
    Some(out)
}

fn sextet_value(c: u8) -> Option<u32> {
    ALPHABET.iter().position(|&a| a == c).map(|i| i as u32)
}
