use crate::{FormId, MaterialId, SelectedFile, TaskId, TransferDestination};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Dispatch one multipart POST.
    Upload { task_id: TaskId, request: UploadRequest },
    /// Blocking notice for the user.
    Alert { message: String },
    /// Ask the user to confirm; answer with `Msg::DeleteConfirmed`.
    ConfirmDelete { material_id: MaterialId },
    DeleteMaterial {
        material_id: MaterialId,
        extra: Vec<(String, String)>,
    },
    /// Ask the user to confirm; answer with `Msg::TransferConfirmed`.
    ConfirmTransfer {
        material_id: MaterialId,
        destination: TransferDestination,
    },
    TransferMaterial {
        material_id: MaterialId,
        destination: TransferDestination,
    },
    /// Mark a team member's upload as accepted.
    AcceptTeamUpload { material_id: MaterialId },
    SetPublic { material_id: MaterialId, is_public: bool },
    SetOwnership { material_id: MaterialId, claim: bool },
    SaveDraft { form: FormId, summary: String },
}

/// Everything one upload request carries: a copy of the form fields plus at
/// most one file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadRequest {
    pub endpoint: String,
    pub file: Option<SelectedFile>,
    pub link: Option<String>,
    pub summary: Option<String>,
    pub comment: String,
    pub is_public: bool,
    pub category: Option<String>,
    pub extra: Vec<(String, String)>,
}
