use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FILENAME;

/// Opaque job identifier assigned by the server when it accepts an upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a finished result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(String);

impl ResultId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which completion strategy delivered the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionSource {
    Push,
    Poll,
}

impl fmt::Display for CompletionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => f.write_str("push"),
            Self::Poll => f.write_str("poll"),
        }
    }
}

/// Event delivered to the observer of an upload session.
///
/// A session emits `Started`, any number of `Progress`, `Accepted`, and then
/// exactly one of `Completed` / `Failed`. `Failed` may also end the session
/// before `Accepted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    Started,
    Progress {
        percent: u8,
    },
    Accepted {
        job: JobHandle,
    },
    Completed {
        result_id: ResultId,
        source: CompletionSource,
    },
    Failed {
        reason: String,
    },
}

impl ProgressEvent {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// A binary asset to upload.
///
/// The payload is shared, so cloning a request never copies the bytes.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    data: Arc<[u8]>,
    file_name: String,
    content_type: Option<String>,
}

impl UploadRequest {
    pub fn new(data: impl Into<Arc<[u8]>>, file_name: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            file_name: file_name.into(),
            content_type: None,
        }
    }

    /// Sets the MIME type sent with the file part.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Filename for the upload, falling back to [`DEFAULT_FILENAME`].
    pub fn file_name(&self) -> &str {
        if self.file_name.is_empty() {
            DEFAULT_FILENAME
        } else {
            &self.file_name
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}
