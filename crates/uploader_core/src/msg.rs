use crate::{
    DraftSnapshot, FormId, Material, MaterialId, Ownership, RequestFailure, SelectedFile, TaskId,
    TransferDestination,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked files in a form's file input.
    FilesSelected {
        form: FormId,
        files: Vec<SelectedFile>,
    },
    /// User edited the link input.
    UrlEdited { form: FormId, text: String },
    /// Rich-text editor change event.
    SummaryEdited { form: FormId, text: String },
    CommentEdited { form: FormId, text: String },
    PublicChecked { form: FormId, checked: bool },
    CategorySelected {
        form: FormId,
        category: Option<String>,
    },
    /// User submitted a form.
    SubmitClicked { form: FormId },
    /// Byte-level progress of an upload body.
    UploadProgress {
        task_id: TaskId,
        bytes_sent: u64,
        bytes_total: u64,
    },
    /// Upload request finished.
    UploadDone {
        task_id: TaskId,
        result: Result<Material, RequestFailure>,
    },
    /// Materials already listed under a form when the page was built.
    RestoreEntries {
        form: FormId,
        materials: Vec<Material>,
    },
    DeleteClicked { material_id: MaterialId },
    /// Answer to `Effect::ConfirmDelete`.
    DeleteConfirmed {
        material_id: MaterialId,
        confirmed: bool,
    },
    DeleteDone {
        material_id: MaterialId,
        result: Result<(), RequestFailure>,
    },
    /// Move a listed material elsewhere; removes it on success.
    TransferClicked {
        material_id: MaterialId,
        destination: TransferDestination,
    },
    /// Answer to `Effect::ConfirmTransfer`.
    TransferConfirmed {
        material_id: MaterialId,
        destination: TransferDestination,
        confirmed: bool,
    },
    TransferDone {
        material_id: MaterialId,
        result: Result<(), RequestFailure>,
    },
    /// Assistant accepts a team member's upload.
    TeamUploadConfirmClicked { material_id: MaterialId },
    TeamUploadConfirmDone {
        material_id: MaterialId,
        result: Result<(), RequestFailure>,
    },
    PublicToggled {
        material_id: MaterialId,
        is_public: bool,
    },
    PublicDone {
        material_id: MaterialId,
        requested: bool,
        result: Result<(), RequestFailure>,
    },
    OwnershipToggled { material_id: MaterialId },
    OwnershipDone {
        material_id: MaterialId,
        requested: bool,
        result: Result<Ownership, RequestFailure>,
    },
    /// Periodic timer for summary draft saving.
    AutosaveTick,
    DraftSaved {
        form: FormId,
        summary: String,
        result: Result<(), RequestFailure>,
    },
    /// Drafts persisted locally by a previous run.
    RestoreDrafts(Vec<DraftSnapshot>),
    /// UI/render tick to coalesce rendering.
    Tick,
}
