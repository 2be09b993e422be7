//! Overlapping, position-tagged text chunking.
//!
//! Offsets are counted in characters (Unicode scalar values), never bytes,
//! so a chunk boundary can not split a multi-byte character.

use docaudit_shared::{DocAuditError, Result};

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkParams {
    /// Validate `chunk_size > 0` and `0 <= overlap < chunk_size`.
    pub fn new(chunk_size: i64, overlap: i64) -> Result<Self> {
        if chunk_size <= 0 {
            return Err(DocAuditError::invalid_parameter(format!(
                "chunk_size must be a positive integer (got {chunk_size})"
            )));
        }
        if overlap < 0 {
            return Err(DocAuditError::invalid_parameter(format!(
                "overlap must be non-negative (got {overlap})"
            )));
        }
        if overlap >= chunk_size {
            return Err(DocAuditError::invalid_parameter(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }

        let chunk_size = usize::try_from(chunk_size)
            .map_err(|_| DocAuditError::invalid_parameter("chunk_size is too large"))?;
        let overlap = usize::try_from(overlap)
            .map_err(|_| DocAuditError::invalid_parameter("overlap is too large"))?;

        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive chunk starts.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 300,
        }
    }
}

/// One chunk of a text, borrowed from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan<'a> {
    pub text: &'a str,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
}

/// Lazy iterator over the chunks of a text.
///
/// Cloning the iterator (or calling [`chunk`] again) restarts the sequence.
#[derive(Debug, Clone)]
pub struct TextChunks<'a> {
    text: &'a str,
    params: ChunkParams,
    start_char: usize,
    start_byte: usize,
}

impl<'a> Iterator for TextChunks<'a> {
    type Item = TextSpan<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start_byte >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.start_byte..];
        let size = self.params.chunk_size;
        let stride = self.params.stride();

        let mut end_rel = rest.len();
        let mut next_rel = None;
        let mut taken = 0;

        for (i, (byte, _)) in rest.char_indices().enumerate() {
            if i == stride {
                next_rel = Some(byte);
            }
            if i == size {
                end_rel = byte;
                break;
            }
            taken = i + 1;
        }

        let span = TextSpan {
            text: &rest[..end_rel],
            start: self.start_char,
            end: self.start_char + taken,
        };

        self.start_char += stride;
        self.start_byte = match next_rel {
            Some(rel) => self.start_byte + rel,
            None => self.text.len(),
        };

        Some(span)
    }
}

impl std::iter::FusedIterator for TextChunks<'_> {}

/// Chunk `text` with already-validated parameters.
pub fn chunk(text: &str, params: ChunkParams) -> TextChunks<'_> {
    TextChunks {
        text,
        params,
        start_char: 0,
        start_byte: 0,
    }
}

/// Validate the parameters, then chunk `text`.
///
/// Fails with [`DocAuditError::InvalidParameter`] before yielding anything
/// when the parameters are malformed.
pub fn chunk_text(text: &str, chunk_size: i64, overlap: i64) -> Result<TextChunks<'_>> {
    Ok(chunk(text, ChunkParams::new(chunk_size, overlap)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(text: &str, size: i64, overlap: i64) -> Vec<usize> {
        chunk_text(text, size, overlap)
            .unwrap()
            .map(|s| s.start)
            .collect()
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let err = chunk_text("abc", 0, 0).unwrap_err();
        assert!(matches!(err, DocAuditError::InvalidParameter { .. }));
    }

    #[test]
    fn rejects_negative_overlap() {
        let err = chunk_text("abc", 10, -1).unwrap_err();
        assert!(matches!(err, DocAuditError::InvalidParameter { .. }));
    }

    #[test]
    fn rejects_overlap_equal_to_chunk_size() {
        let err = chunk_text("abc", 10, 10).unwrap_err();
        assert!(matches!(err, DocAuditError::InvalidParameter { .. }));
    }

    #[test]
    fn rejects_invalid_params_even_for_empty_text() {
        assert!(chunk_text("", -5, 0).is_err());
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(chunk_text("", 1000, 300).unwrap().count(), 0);
    }

    #[test]
    fn default_params_on_2500_chars() {
        let text = "x".repeat(2500);
        let spans: Vec<_> = chunk_text(&text, 1000, 300).unwrap().collect();
        let ranges: Vec<_> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(
            ranges,
            vec![(0, 1000), (700, 1700), (1400, 2400), (2100, 2500)]
        );
        assert_eq!(spans[3].text.len(), 400);
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let text = "Sentence one has a typo. Sentence two is fine.";
        let spans: Vec<_> = chunk_text(text, 1000, 0).unwrap().collect();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, text);
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[0].end, text.chars().count());
    }

    #[test]
    fn zero_overlap_tiles_exactly() {
        assert_eq!(starts("abcdefghij", 3, 0), vec![0, 3, 6, 9]);
    }

    #[test]
    fn chunks_cover_text_and_overlap_exactly() {
        let text: String = (0..937).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for (size, overlap) in [(1, 0), (10, 3), (100, 99), (250, 0), (1000, 300)] {
            let spans: Vec<_> = chunk_text(&text, size, overlap).unwrap().collect();
            assert_eq!(spans[0].start, 0);
            assert_eq!(spans.last().unwrap().end, text.len());
            for pair in spans.windows(2) {
                // Consecutive ranges leave no gap...
                assert!(pair[1].start <= pair[0].end);
                // ...and overlap by exactly `overlap` unless the first is clipped.
                if pair[0].end - pair[0].start == size as usize {
                    assert_eq!(pair[0].end - pair[1].start, overlap as usize);
                }
            }
        }
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let text = "가나다라마바사";
        let spans: Vec<_> = chunk_text(text, 3, 1).unwrap().collect();
        let ranges: Vec<_> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(0, 3), (2, 5), (4, 7), (6, 7)]);
        assert_eq!(spans[0].text, "가나다");
        assert_eq!(spans[1].text, "다라마");
        assert_eq!(spans[3].text, "사");
    }

    #[test]
    fn chunking_is_idempotent_and_restartable() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let first: Vec<_> = chunk_text(&text, 64, 16).unwrap().collect();
        let second: Vec<_> = chunk_text(&text, 64, 16).unwrap().collect();
        assert_eq!(first, second);

        let iter = chunk_text(&text, 64, 16).unwrap();
        let restarted: Vec<_> = iter.clone().collect();
        assert_eq!(restarted, iter.collect::<Vec<_>>());
    }
}
