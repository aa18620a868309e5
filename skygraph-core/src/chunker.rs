// Copyright 2025 Skygraph Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Overlapping fixed-size text windows for embedding.

use thiserror::Error;

/// Errors from chunker construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkerError {
    /// Overlap must stay below the chunk size or the window never advances.
    #[error("overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },

    /// Zero-length chunks are a configuration error.
    #[error("chunk size must be non-zero")]
    ZeroChunkSize,
}

/// Splits text into overlapping windows of at most `chunk_size` characters.
///
/// Windows advance by `chunk_size - overlap` characters; the final window may
/// be shorter and is still emitted when non-empty after trimming. Boundaries
/// are `char` boundaries, so multi-byte input never splits a codepoint.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker, rejecting degenerate configurations up front.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkerError> {
        if chunk_size == 0 {
            return Err(ChunkerError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ChunkerError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Window size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive windows in characters.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazy iterator over the chunks of `text`.
    ///
    /// Deterministic and restartable: calling this twice on the same input
    /// yields the same sequence.
    pub fn chunks(&self, text: &str) -> Chunks {
        Chunks {
            chars: text.chars().collect(),
            pos: 0,
            chunk_size: self.chunk_size,
            step: self.chunk_size - self.overlap,
            done: text.is_empty(),
        }
    }
}

/// Iterator state for [`TextChunker::chunks`].
pub struct Chunks {
    chars: Vec<char>,
    pos: usize,
    chunk_size: usize,
    step: usize,
    done: bool,
}

impl Iterator for Chunks {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.done {
            let end = (self.pos + self.chunk_size).min(self.chars.len());
            let window: String = self.chars[self.pos..end].iter().collect();
            // The window touching the end of the text is the last one.
            if end == self.chars.len() {
                self.done = true;
            } else {
                self.pos += self.step;
            }
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                return Some(window);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collect(chunker: &TextChunker, text: &str) -> Vec<String> {
        chunker.chunks(text).collect()
    }

    #[test]
    fn rejects_overlap_at_or_above_chunk_size() {
        assert_eq!(
            TextChunker::new(4, 4).unwrap_err(),
            ChunkerError::OverlapTooLarge {
                chunk_size: 4,
                overlap: 4
            }
        );
        assert!(TextChunker::new(4, 5).is_err());
        assert_eq!(TextChunker::new(0, 0).unwrap_err(), ChunkerError::ZeroChunkSize);
    }

    #[test]
    fn exact_window_arithmetic() {
        // size 4, overlap 1 => step 3: windows at 0, 3, 6; the window at 6
        // reaches the end of the text, so iteration stops there.
        let chunker = TextChunker::new(4, 1).unwrap();
        assert_eq!(collect(&chunker, "abcdefghij"), vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn short_final_chunk_is_emitted() {
        let chunker = TextChunker::new(4, 0).unwrap();
        assert_eq!(collect(&chunker, "abcdefghijk"), vec!["abcd", "efgh", "ijk"]);
    }

    #[test]
    fn input_shorter_than_chunk_size() {
        let chunker = TextChunker::new(100, 10).unwrap();
        assert_eq!(collect(&chunker, "short"), vec!["short"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let chunker = TextChunker::new(4, 1).unwrap();
        assert!(collect(&chunker, "").is_empty());
    }

    #[test]
    fn whitespace_only_windows_are_dropped() {
        let chunker = TextChunker::new(2, 0).unwrap();
        assert_eq!(collect(&chunker, "ab    cd"), vec!["ab", "cd"]);
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        let chunker = TextChunker::new(3, 1).unwrap();
        let chunks = collect(&chunker, "héllo wörld");
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.chars().count() <= 3);
        }
    }

    #[test]
    fn restartable_same_sequence() {
        let chunker = TextChunker::new(5, 2).unwrap();
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(collect(&chunker, text), collect(&chunker, text));
    }

    proptest! {
        #[test]
        fn full_coverage(
            text in "[a-z]{0,200}",
            chunk_size in 1usize..20,
            overlap in 0usize..19,
        ) {
            prop_assume!(overlap < chunk_size);
            let chunker = TextChunker::new(chunk_size, overlap).unwrap();
            let rebuilt: String = chunker
                .chunks(&text)
                .enumerate()
                .map(|(i, c)| {
                    // Drop the overlapping prefix of every chunk after the first.
                    if i == 0 {
                        c
                    } else {
                        c.chars().skip(overlap).collect()
                    }
                })
                .collect();
            // Non-whitespace input is fully covered in order.
            prop_assert!(text.starts_with(&rebuilt) || text == rebuilt);
            if !text.is_empty() {
                prop_assert_eq!(rebuilt, text);
            }
        }

        #[test]
        fn chunks_never_exceed_size(
            text in ".{0,200}",
            chunk_size in 1usize..30,
        ) {
            let chunker = TextChunker::new(chunk_size, 0).unwrap();
            for chunk in chunker.chunks(&text) {
                prop_assert!(chunk.chars().count() <= chunk_size);
            }
        }
    }
}
