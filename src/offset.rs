use std::fmt;

use bytes::Bytes;

/// A log position as reported by the local log or a fetching replica.
///
/// Two values with the same `offset` may still describe physically distinct
/// positions (a segment roll, a truncation and re-append). The opaque
/// `metadata` blob disambiguates them: listeners waiting on the high
/// watermark must be woken when the physical position changes even if the
/// logical offset does not.
#[derive(Clone, PartialEq, Eq)]
pub struct LogOffsetMetadata {
    offset: u64,
    metadata: Option<Bytes>,
}

impl LogOffsetMetadata {
    pub fn new(
        offset: u64,
        metadata: Option<Bytes>,
    ) -> Self {
        Self { offset, metadata }
    }

    /// Position with no physical metadata attached.
    pub fn without_metadata(offset: u64) -> Self {
        Self {
            offset,
            metadata: None,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn metadata(&self) -> Option<&Bytes> {
        self.metadata.as_ref()
    }
}

impl fmt::Debug for LogOffsetMetadata {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match &self.metadata {
            Some(metadata) => write!(f, "(offset={}, metadata={:?})", self.offset, metadata),
            None => write!(f, "(offset={}, metadata=None)", self.offset),
        }
    }
}
