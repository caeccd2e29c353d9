//! Uploader engine: HTTP requests and effect execution.
mod client;
mod engine;
mod persist;
mod types;

pub use client::{
    ChannelProgressSink, ClientSettings, MaterialApi, ProgressSink, ReqwestClient, Uploader,
};
pub use engine::EngineHandle;
pub use persist::{remove_if_exists, write_atomic, PersistError};
pub use types::{
    EngineError, EngineEvent, FailureKind, FilePart, FormId, MaterialId, MaterialRecord,
    OwnershipRecord, TaskId, UploadJob, UploadProgress,
};
