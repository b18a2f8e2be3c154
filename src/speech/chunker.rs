//! Splitting long text into chunks a speech engine will accept
//!
//! Engines reject or silently truncate very long utterances, so article text
//! is cut into segments at natural boundaries. Lengths are counted in chars.

/// Longest chunk handed to the engine when a boundary allows it
pub const MAX_CHUNK_LENGTH: usize = 4000;

/// Shortest chunk produced before the final one, to avoid many tiny utterances
pub const MIN_CHUNK_LENGTH: usize = 500;

/// Split `text` into ordered chunks of at most `max_len` chars where possible.
///
/// Sentence boundaries are preferred, then word boundaries. A buffer is only
/// flushed once it holds at least `min_len` chars, so a single long sentence
/// can push a chunk past `max_len` rather than being cut mid-sentence. Only an
/// unbroken token with no whitespace is force-split at exactly `max_len`.
///
/// Returns an empty vector for empty input.
pub fn split_text_into_chunks(text: &str, max_len: usize, min_len: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if char_len(text) <= max_len {
        return vec![text.to_string()];
    }

    let sentences = split_sentences(text);
    if sentences.len() > 1 {
        return accumulate(sentences, max_len, min_len, 0);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > 1 {
        // The joining space counts towards the limit for words
        return accumulate(words, max_len, min_len, 1);
    }

    force_split(text, max_len.max(1))
}

/// Join pieces with single spaces, flushing when the next piece would overflow
fn accumulate(
    pieces: Vec<&str>,
    max_len: usize,
    min_len: usize,
    separator_cost: usize,
) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let piece_len = char_len(piece);

        let overflows = current_len + piece_len + separator_cost > max_len;
        if overflows && current_len > 0 && current_len >= min_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(piece);
        current_len += piece_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }

    chunks
}

/// Sentences end with a run of `.`, `!` or `?`. Trailing text without a
/// terminator is kept as a final sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        while let Some(&(_, next)) = chars.peek() {
            if is_terminator(next) {
                chars.next();
            } else {
                break;
            }
        }
        let end = chars.peek().map(|&(i, _)| i).unwrap_or(text.len());
        sentences.push(&text[start..end]);
        start = end;
    }

    if start < text.len() && !text[start..].trim().is_empty() {
        sentences.push(&text[start..]);
    }

    sentences
}

fn force_split(text: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max_len).map(|c| c.iter().collect()).collect()
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
