//! Uploader core: pure upload orchestration state machine and view-model helpers.
mod context;
mod effect;
mod form;
mod material;
mod msg;
pub mod render;
mod state;
mod update;
mod view_model;

pub use context::{
    validate, EventBlockUploadContext, FileUploadContext, SummaryUploadContext, UploadContext,
};
pub use effect::{Effect, UploadRequest};
pub use form::{is_blank_rich_text, FormFields, InputMode, SelectedFile};
pub use material::{
    Material, MaterialEntry, MaterialId, Ownership, RequestFailure, TransferDestination,
};
pub use msg::Msg;
pub use state::{
    AppState, DraftSnapshot, Form, FormId, TaskId, TaskStage, UploadLimits, UploadTask,
    UNLOAD_WARNING,
};
pub use update::{file_too_large_message, parallel_limit_message, update, REQUEST_FAILED_MESSAGE};
pub use view_model::{AppViewModel, EntryView, FinishedTaskView, FormView, ProgressRowView};
