use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive i/o: {0}")]
    Io(#[from] io::Error),
    #[error("unrecognised record header")]
    BadMagic,
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u8),
    #[error("record written for chunk size {found}, expected {expected}")]
    ChunkSizeMismatch { expected: usize, found: usize },
    #[error("record ends early")]
    Truncated,
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl ArchiveError {
    pub(crate) fn from_read(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ArchiveError::Truncated
        } else {
            ArchiveError::Io(e)
        }
    }
}
