//! # Message Chunker Module
//!
//! Telegram caps message length, so long AI answers have to be delivered
//! in several messages. This module splits MarkdownV2-ish text into chunks
//! below a limit, preferring paragraph boundaries, then spaces, while
//! never cutting inside an italic `*...*` span and never leaving a chunk
//! that ends on a lone escape backslash.

/// Default chunk limit, safely below Telegram's 4096-character cap
pub const DEFAULT_CHUNK_LIMIT: usize = 3500;

/// Split `text` into chunks of at most `limit` characters.
///
/// Paragraphs (blank-line separated) are accumulated greedily; an oversized
/// paragraph is cut at the last space before the limit, backing off past
/// italic spans. An already-fitting text comes back as a single chunk, so
/// the function is idempotent. Empty input yields no chunks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let candidate_len = if current.is_empty() {
            char_len(paragraph)
        } else {
            char_len(&current) + 2 + char_len(paragraph)
        };
        if candidate_len <= limit {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current = paragraph.to_string();

        while char_len(&current) > limit {
            let split_at = find_split_position(&current, limit);
            chunks.push(current[..split_at].trim_end().to_string());
            current = current[split_at..]
                .trim_start_matches(['\n', ' '])
                .to_string();
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `limit`-th character, or the full length for shorter text
fn limit_byte_index(block: &str, limit: usize) -> usize {
    block
        .char_indices()
        .nth(limit)
        .map(|(idx, _)| idx)
        .unwrap_or(block.len())
}

/// Italic `*...*` spans as byte ranges. An escaped opening asterisk ends the
/// scan; escaped closing asterisks are skipped over.
fn italic_spans(block: &str) -> Vec<(usize, usize)> {
    let bytes = block.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;

    loop {
        let open = match find_byte(bytes, b'*', start) {
            Some(idx) => idx,
            None => break,
        };
        if open > 0 && bytes[open - 1] == b'\\' {
            break;
        }
        let mut close = find_byte(bytes, b'*', open + 1);
        while let Some(idx) = close {
            if idx > 0 && bytes[idx - 1] == b'\\' {
                close = find_byte(bytes, b'*', idx + 1);
            } else {
                break;
            }
        }
        match close {
            Some(idx) => {
                spans.push((open, idx));
                start = idx + 1;
            }
            None => break,
        }
    }

    spans
}

fn find_byte(haystack: &[u8], needle: u8, from: usize) -> Option<usize> {
    haystack
        .iter()
        .skip(from)
        .position(|&b| b == needle)
        .map(|offset| from + offset)
}

/// Pick the byte position to cut an oversized block at.
fn find_split_position(block: &str, limit: usize) -> usize {
    let limit_byte = limit_byte_index(block, limit);
    if limit_byte >= block.len() {
        return block.len();
    }

    let spans = italic_spans(block);
    let inside_italic = |pos: usize| spans.iter().any(|&(s, e)| s < pos && pos < e);

    let mut split_at = match block[..limit_byte].rfind(' ') {
        Some(idx) if idx > 0 => idx,
        _ => limit_byte,
    };

    if inside_italic(split_at) {
        // back off to just before the italic span, then to the nearest space
        if let Some(&(span_start, _)) = spans.iter().filter(|&&(s, _)| s < split_at).last() {
            split_at = match block[..span_start].rfind(' ') {
                Some(idx) if idx > 0 => idx,
                _ => span_start,
            };
        }
    }

    // never end a chunk on a trailing escape character
    while split_at > 0 && block.as_bytes()[split_at - 1] == b'\\' {
        split_at -= 1;
    }

    if split_at == 0 {
        split_at = limit_byte;
    }
    split_at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(split_message("", 100).is_empty());
    }

    #[test]
    fn test_short_paragraph_is_single_chunk() {
        let text = "hello world";
        assert_eq!(split_message(text, 100), vec![text.to_string()]);
    }

    #[test]
    fn test_paragraphs_accumulate_under_limit() {
        let text = "first paragraph\n\nsecond paragraph";
        assert_eq!(split_message(text, 100), vec![text.to_string()]);
    }

    #[test]
    fn test_split_at_paragraph_boundary() {
        let first = "a".repeat(60);
        let second = "b".repeat(60);
        let text = format!("{first}\n\n{second}");
        let chunks = split_message(&text, 100);
        assert_eq!(chunks, vec![first, second]);
    }

    #[test]
    fn test_oversized_paragraph_cut_at_space() {
        let text = format!("{} {}", "a".repeat(50), "b".repeat(50));
        let chunks = split_message(&text, 60);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(50));
        assert_eq!(chunks[1], "b".repeat(50));
    }

    #[test]
    fn test_every_chunk_below_limit() {
        let text = "lorem ipsum dolor sit amet ".repeat(100);
        for chunk in split_message(&text, 120) {
            assert!(chunk.chars().count() <= 120, "chunk too long: {chunk}");
        }
    }

    #[test]
    fn test_hard_cut_without_spaces() {
        let text = "x".repeat(250);
        let chunks = split_message(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_does_not_cut_inside_italic_span() {
        let prefix = "word ".repeat(10);
        let text = format!("{prefix}*{}* tail", "i".repeat(30));
        let limit = prefix.chars().count() + 20;
        let chunks = split_message(&text, limit);
        // the cut happens before the span opens, not inside it
        assert!(chunks[0].chars().filter(|&c| c == '*').count() != 1);
    }

    #[test]
    fn test_no_trailing_backslash() {
        let text = format!("{}\\ {}", "a".repeat(98), "b".repeat(50));
        for chunk in split_message(&text, 100) {
            assert!(!chunk.ends_with('\\'), "chunk ends with escape: {chunk}");
        }
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let text = "para one with some words\n\npara two with more words ".repeat(40);
        for chunk in split_message(&text, 200) {
            assert_eq!(split_message(&chunk, 200), vec![chunk.clone()]);
        }
    }

    #[test]
    fn test_content_preserved_modulo_whitespace() {
        let text = "alpha beta gamma delta ".repeat(30);
        let chunks = split_message(&text, 100);
        let rejoined: String = chunks.join(" ");
        let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(normalize(&rejoined), normalize(&text));
    }

    #[test]
    fn test_multibyte_text_respects_char_limit() {
        let text = "слово ".repeat(100);
        for chunk in split_message(&text, 80) {
            assert!(chunk.chars().count() <= 80);
        }
    }
}
