//! Text chunking with configurable size and overlap.

/// A slice of a source text, ready to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Index of the chunk within its source
    pub position: u32,
    /// Byte offset of the chunk start in the source text
    pub start: usize,
    /// Byte offset one past the chunk end
    pub end: usize,
    /// Trimmed chunk text, never empty
    pub text: String,
}

/// Split text into overlapping chunks of at most `chunk_size` bytes.
///
/// Chunk ends prefer the last whitespace in the second half of the
/// window so words are not cut in two. Boundaries always fall on UTF-8
/// character boundaries. Whitespace-only chunks are dropped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0usize;

    while start < text.len() {
        let end = chunk_end(text, start, chunk_size);

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            chunks.push(TextChunk {
                position,
                start,
                end,
                text: piece.to_string(),
            });
            position += 1;
        }

        if end >= text.len() {
            break;
        }

        let mut next = end.saturating_sub(overlap);
        if next <= start {
            next = end;
        }
        while next < text.len() && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    tracing::debug!(
        "Chunked {} bytes into {} chunks (size: {}, overlap: {})",
        text.len(),
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

fn chunk_end(text: &str, start: usize, chunk_size: usize) -> usize {
    let limit = start.saturating_add(chunk_size);
    if limit >= text.len() {
        return text.len();
    }

    let mut end = limit;
    while end > start && !text.is_char_boundary(end) {
        end -= 1;
    }
    if end == start {
        // Window narrower than one character: take the whole character
        end = limit;
        while !text.is_char_boundary(end) {
            end += 1;
        }
        return end;
    }

    let floor = start + chunk_size / 2;
    match text[start..end].rfind(char::is_whitespace) {
        Some(offset) if start + offset > floor => start + offset,
        _ => end,
    }
}
