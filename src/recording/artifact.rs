// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Finished recording handed from the recorder to whoever saves it.

use std::sync::Arc;

/// MIME type used when the encoder does not name one
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Encoded bytes of one recording plus the filename to offer on download.
///
/// Immutable; clones share the same buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingArtifact {
    bytes: Arc<[u8]>,
    suggested_filename: Arc<str>,
    mime_type: &'static str,
}

impl RecordingArtifact {
    /// Create a new artifact
    pub fn new(bytes: impl Into<Arc<[u8]>>, suggested_filename: impl Into<Arc<str>>) -> Self {
        Self {
            bytes: bytes.into(),
            suggested_filename: suggested_filename.into(),
            mime_type: DEFAULT_MIME_TYPE,
        }
    }

    /// Tag the artifact with the format its encoder produced
    pub fn with_mime_type(mut self, mime_type: &'static str) -> Self {
        self.mime_type = mime_type;
        self
    }

    /// Encoded bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Filename offered to the user
    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    /// MIME type of the encoded bytes
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if no bytes were captured
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check whether two artifacts share one buffer
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_accessors() {
        let artifact = RecordingArtifact::new(vec![1u8, 2, 3], "recording.webm");
        assert_eq!(artifact.bytes(), &[1, 2, 3]);
        assert_eq!(artifact.suggested_filename(), "recording.webm");
        assert_eq!(artifact.len(), 3);
        assert!(!artifact.is_empty());
        assert_eq!(artifact.mime_type(), DEFAULT_MIME_TYPE);

        let tagged = artifact.with_mime_type("audio/webm");
        assert_eq!(tagged.mime_type(), "audio/webm");
    }

    #[test]
    fn test_clones_share_buffer() {
        let artifact = RecordingArtifact::new(vec![0u8; 16], "recording.webm");
        let copy = artifact.clone();
        assert!(artifact.same_buffer(&copy));

        let other = RecordingArtifact::new(vec![0u8; 16], "recording.webm");
        assert_eq!(artifact, other);
        assert!(!artifact.same_buffer(&other));
    }
}
