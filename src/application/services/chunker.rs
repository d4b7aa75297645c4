/// Overlapping fixed-size windows over a transcript.
///
/// The cursor advances by `size - overlap` per step, so a passage that
/// straddles a window boundary is still fully contained in at least one
/// window. Pure and deterministic.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptChunker {
    size: usize,
    overlap: usize,
}

/// One window, with char offsets back into the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkWindow {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl TranscriptChunker {
    pub const DEFAULT_SIZE: usize = 1000;
    pub const DEFAULT_OVERLAP: usize = 200;

    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkerError> {
        if size == 0 {
            return Err(ChunkerError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkerError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    pub fn split(&self, text: &str) -> Vec<ChunkWindow> {
        chunk_text(text, self.size, self.overlap)
            .expect("chunker parameters validated at construction")
    }
}

impl Default for TranscriptChunker {
    fn default() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
            overlap: Self::DEFAULT_OVERLAP,
        }
    }
}

/// Split `text` into windows of at most `size` chars, consecutive windows
/// sharing `overlap` chars. Empty text yields no windows; the final window
/// may be shorter than `size`.
pub fn chunk_text(
    text: &str,
    size: usize,
    overlap: usize,
) -> Result<Vec<ChunkWindow>, ChunkerError> {
    if size == 0 {
        return Err(ChunkerError::ZeroSize);
    }
    if overlap >= size {
        return Err(ChunkerError::OverlapTooLarge { size, overlap });
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut windows = Vec::new();

    let step = size - overlap;
    let mut cursor = 0;
    while cursor < total {
        let end = (cursor + size).min(total);
        windows.push(ChunkWindow {
            text: chars[cursor..end].iter().collect(),
            start_offset: cursor,
            end_offset: end,
        });
        cursor += step;
    }

    Ok(windows)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkerError {
    #[error("chunk size must be greater than zero")]
    ZeroSize,
    #[error("overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}
