//! Overlapping fixed-window text chunker.
//!
//! Splits a document's content into windows of at most `chunk_size`
//! characters. A window prefers to end on a paragraph break, then a line
//! break, then a space, as long as that keeps it at least half full;
//! otherwise it is cut hard at `chunk_size`. Each following window starts
//! `chunk_overlap` characters before the previous end, nudged forward to the
//! next word boundary inside the overlap.
//!
//! Lengths are counted in `char`s so a split never lands inside a UTF-8
//! sequence.

use crate::models::{Chunk, Document};

/// Split one document into chunks.
///
/// An empty document yields no chunks. A non-empty document whose content
/// yields no non-blank window is kept whole as a single chunk.
pub fn chunk_document(doc: &Document, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    if doc.content.is_empty() {
        return Vec::new();
    }

    let pieces = split_text(&doc.content, chunk_size, chunk_overlap);

    if pieces.is_empty() {
        return vec![Chunk {
            content: doc.content.clone(),
            source_id: doc.source_id.clone(),
        }];
    }

    pieces
        .into_iter()
        .map(|content| Chunk {
            content,
            source_id: doc.source_id.clone(),
        })
        .collect()
}

/// Split text into trimmed, non-empty windows of at most `chunk_size` chars.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut pieces = Vec::new();

    if chunk_size == 0 {
        return pieces;
    }

    let mut start = 0;
    while start < n {
        while start < n && chars[start].is_whitespace() {
            start += 1;
        }
        if start >= n {
            break;
        }

        let hard_end = (start + chunk_size).min(n);
        let end = if hard_end < n {
            find_break(&chars, start, hard_end)
        } else {
            hard_end
        };

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed.to_string());
        }

        if end >= n {
            break;
        }

        let mut next = end.saturating_sub(chunk_overlap).max(start + 1);
        if !chars[next - 1].is_whitespace() {
            if let Some(offset) = chars[next..end].iter().position(|c| c.is_whitespace()) {
                next += offset + 1;
            }
        }
        start = next;
    }

    pieces
}

/// Find the best split position in `(start, hard_end]`, never earlier than
/// the window midpoint. Returns an exclusive end index.
fn find_break(chars: &[char], start: usize, hard_end: usize) -> usize {
    let floor = start + (hard_end - start) / 2;

    // Paragraph break
    for p in (floor.max(start + 1)..hard_end).rev() {
        if chars[p] == '\n' && chars[p - 1] == '\n' {
            return p + 1;
        }
    }
    // Line break
    if let Some(p) = (floor..hard_end).rev().find(|&p| chars[p] == '\n') {
        return p + 1;
    }
    // Word break
    if let Some(p) = (floor..hard_end).rev().find(|&p| chars[p].is_whitespace()) {
        return p + 1;
    }

    hard_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            source_id: "about.md".to_string(),
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_document(&doc("Hello, world!"), 200, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello, world!");
        assert_eq!(chunks[0].source_id, "about.md");
    }

    #[test]
    fn test_blank_document_kept_whole() {
        let chunks = chunk_document(&doc("  \n\n "), 200, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "  \n\n ");
    }

    #[test]
    fn test_empty_document_yields_no_chunks() {
        assert!(chunk_document(&doc(""), 200, 50).is_empty());
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let text = (0..200)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        for piece in split_text(&text, 200, 50) {
            assert!(piece.chars().count() <= 200, "chunk too long: {}", piece);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text = (0..200)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let pieces = split_text(&text, 200, 50);
        assert!(pieces.len() > 2);
        for pair in pieces.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(
                pair[0].contains(first_word),
                "expected '{}' to carry over from previous chunk",
                first_word
            );
        }
    }

    #[test]
    fn test_covers_whole_text() {
        let text = (0..120)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let pieces = split_text(&text, 60, 10);
        assert!(pieces.first().unwrap().starts_with("w0 "));
        assert!(pieces.last().unwrap().ends_with("w119"));
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let text = format!("{}\n\n{}", "a".repeat(120), "b".repeat(120));
        let pieces = split_text(&text, 200, 50);
        assert_eq!(pieces[0], "a".repeat(120));
    }

    #[test]
    fn test_hard_split_without_whitespace() {
        let text = "x".repeat(450);
        let pieces = split_text(&text, 200, 50);
        assert_eq!(pieces[0].len(), 200);
        assert!(pieces.iter().all(|p| p.len() <= 200));
        // 0..200, 150..350, 300..450
        assert_eq!(pieces.len(), 3);
    }

    #[test]
    fn test_multibyte_text_is_not_split_mid_char() {
        let text = "é".repeat(500);
        let pieces = split_text(&text, 200, 50);
        for piece in &pieces {
            assert!(piece.chars().all(|c| c == 'é'));
            assert!(piece.chars().count() <= 200);
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma.\n\nDelta epsilon.\nZeta eta theta iota kappa.";
        assert_eq!(split_text(text, 20, 5), split_text(text, 20, 5));
    }
}
