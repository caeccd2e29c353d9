use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub type TaskId = u64;
pub type MaterialId = u64;
pub type FormId = u64;

/// One multipart upload: plain text fields plus at most one file part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadJob {
    pub endpoint: String,
    pub fields: Vec<(String, String)>,
    pub file: Option<FilePart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub task_id: TaskId,
    pub bytes_sent: u64,
    pub bytes_total: u64,
}

/// Material descriptor returned by the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MaterialRecord {
    pub material_id: MaterialId,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub info_string: Option<String>,
    #[serde(default)]
    pub can_set_public: bool,
}

/// Answer of the ownership endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnershipRecord {
    pub is_owner: bool,
    #[serde(default)]
    pub owners: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(UploadProgress),
    UploadCompleted {
        task_id: TaskId,
        result: Result<MaterialRecord, EngineError>,
    },
    DeleteCompleted {
        material_id: MaterialId,
        result: Result<(), EngineError>,
    },
    PublicCompleted {
        material_id: MaterialId,
        requested: bool,
        result: Result<(), EngineError>,
    },
    OwnershipCompleted {
        material_id: MaterialId,
        requested: bool,
        result: Result<OwnershipRecord, EngineError>,
    },
    DraftSaved {
        form: FormId,
        summary: String,
        result: Result<(), EngineError>,
    },
    TeamConfirmCompleted {
        material_id: MaterialId,
        result: Result<(), EngineError>,
    },
    TransferCompleted {
        material_id: MaterialId,
        result: Result<(), EngineError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct EngineError {
    pub kind: FailureKind,
    pub message: String,
}

impl EngineError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: u64 },
    Io,
    InvalidResponse,
    Network,
    /// The request task died before reporting.
    Aborted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "file too large (max {max_bytes}, actual {actual})")
            }
            FailureKind::Io => write!(f, "io error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Aborted => write!(f, "request aborted"),
        }
    }
}
