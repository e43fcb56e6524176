//! Boundary-aware text chunking with overlap.
//!
//! Lengths and offsets are measured in characters, not bytes, so multi-byte
//! text never splits inside a code point.

use std::ops::Range;

use super::error::TradesimError;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Cut markers in priority order. The marker stays with the chunk it ends.
const BOUNDARIES: [&str; 5] = [". ", ".\n", "\n\n", "\n", " "];

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, TradesimError> {
    let chars: Vec<char> = text.chars().collect();
    let spans = chunk_spans_chars(&chars, chunk_size, overlap)?;
    Ok(spans
        .into_iter()
        .map(|span| chars[span].iter().collect())
        .collect())
}

/// Character ranges of the chunks `chunk_text` would produce.
///
/// Consecutive ranges overlap by `prev.end - next.start` characters, which is
/// `overlap` unless a boundary cut left too little room to step back that far.
pub fn chunk_spans(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Range<usize>>, TradesimError> {
    let chars: Vec<char> = text.chars().collect();
    chunk_spans_chars(&chars, chunk_size, overlap)
}

fn chunk_spans_chars(
    chars: &[char],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Range<usize>>, TradesimError> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(TradesimError::InvalidChunking {
            chunk_size,
            overlap,
        });
    }

    let len = chars.len();
    if len <= chunk_size {
        return Ok(vec![0..len]);
    }

    let mut spans = Vec::with_capacity(len / (chunk_size - overlap) + 1);
    let mut start = 0usize;

    loop {
        let tentative_end = start + chunk_size;
        if tentative_end >= len {
            spans.push(start..len);
            break;
        }

        let end = find_boundary(chars, start, tentative_end).unwrap_or(tentative_end);
        spans.push(start..end);

        // Step back by the overlap, but always move forward.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    Ok(spans)
}

/// Latest cut position for the highest-priority marker found fully inside
/// `(start, end]`, or `None` if the window has no marker.
fn find_boundary(chars: &[char], start: usize, end: usize) -> Option<usize> {
    let window = &chars[start..end];
    BOUNDARIES.iter().find_map(|marker| {
        let marker: Vec<char> = marker.chars().collect();
        window
            .windows(marker.len())
            .rposition(|w| w == marker.as_slice())
            .filter(|&pos| pos > 0)
            .map(|pos| start + pos + marker.len())
    })
}
