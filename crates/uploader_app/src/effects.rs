use std::time::Duration;

use uploader_core::{
    Effect, Material, Msg, Ownership, RequestFailure, TransferDestination, UploadRequest,
};
use uploader_engine::{
    ClientSettings, EngineError, EngineEvent, EngineHandle, FilePart, MaterialRecord,
    OwnershipRecord, UploadJob,
};
use uploader_logging::{uploader_debug, uploader_info, uploader_warn};

/// Hands request effects to the engine and turns its events back into
/// messages. Alerts and confirmations stay with the caller.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
        })
    }

    /// Returns `true` when a request was sent and a completion event will
    /// follow. `draft_fields` supplies the form fields posted with a draft.
    pub fn execute(&self, effect: Effect, draft_fields: &[(String, String)]) -> bool {
        match effect {
            Effect::Upload { task_id, request } => {
                uploader_info!(
                    "Upload task_id={} endpoint={} file={:?}",
                    task_id,
                    request.endpoint,
                    request.file.as_ref().map(|f| f.name.as_str())
                );
                self.engine.upload(task_id, upload_job(request));
                true
            }
            Effect::DeleteMaterial { material_id, extra } => {
                uploader_info!("Delete material_id={}", material_id);
                self.engine.delete(material_id, extra);
                true
            }
            Effect::TransferMaterial {
                material_id,
                destination,
            } => {
                uploader_info!("Transfer material_id={} to {}", material_id, destination.kind);
                self.engine.transfer(material_id, transfer_fields(destination));
                true
            }
            Effect::AcceptTeamUpload { material_id } => {
                self.engine.confirm_team_upload(material_id);
                true
            }
            Effect::SetPublic {
                material_id,
                is_public,
            } => {
                self.engine.set_public(material_id, is_public);
                true
            }
            Effect::SetOwnership { material_id, claim } => {
                self.engine.set_ownership(material_id, claim);
                true
            }
            Effect::SaveDraft { form, summary } => {
                let mut fields = draft_fields.to_vec();
                fields.push(("summary".to_string(), summary.clone()));
                self.engine.save_draft(form, summary, fields);
                true
            }
            other @ (Effect::Alert { .. }
            | Effect::ConfirmDelete { .. }
            | Effect::ConfirmTransfer { .. }) => {
                uploader_debug!("Effect {:?} is handled by the app", other);
                false
            }
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.engine.recv_timeout(timeout)
    }
}

/// Multipart fields as the upload view expects them. Unused inputs are sent
/// empty, like a browser posting the whole form.
pub fn upload_job(request: UploadRequest) -> UploadJob {
    let mut fields = vec![
        ("url_field".to_string(), request.link.unwrap_or_default()),
        ("comment".to_string(), request.comment),
    ];
    if let Some(summary) = request.summary {
        fields.push(("summary".to_string(), summary));
    }
    if request.is_public {
        fields.push(("is_public".to_string(), "on".to_string()));
    }
    if let Some(category) = request.category {
        fields.push(("event_block".to_string(), category));
    }
    fields.extend(request.extra);
    fields.push(("add_btn".to_string(), String::new()));

    UploadJob {
        endpoint: request.endpoint,
        fields,
        file: request.file.map(|file| FilePart {
            name: file.name,
            path: file.path,
        }),
    }
}

/// Transfer view fields; absent targets are left out.
pub fn transfer_fields(destination: TransferDestination) -> Vec<(String, String)> {
    let mut fields = vec![("type".to_string(), destination.kind)];
    if let Some(dest_id) = destination.dest_id {
        fields.push(("dest_id".to_string(), dest_id));
    }
    if let Some(from_user) = destination.from_user {
        fields.push(("from_user".to_string(), from_user));
    }
    fields
}

/// Translate one engine event into the message the core understands.
pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress(progress) => Msg::UploadProgress {
            task_id: progress.task_id,
            bytes_sent: progress.bytes_sent,
            bytes_total: progress.bytes_total,
        },
        EngineEvent::UploadCompleted { task_id, result } => Msg::UploadDone {
            task_id,
            result: result
                .map(to_material)
                .map_err(|err| failure(&format!("Upload task {task_id}"), err)),
        },
        EngineEvent::DeleteCompleted {
            material_id,
            result,
        } => Msg::DeleteDone {
            material_id,
            result: result.map_err(|err| failure(&format!("Delete of {material_id}"), err)),
        },
        EngineEvent::PublicCompleted {
            material_id,
            requested,
            result,
        } => Msg::PublicDone {
            material_id,
            requested,
            result: result
                .map_err(|err| failure(&format!("Visibility change of {material_id}"), err)),
        },
        EngineEvent::OwnershipCompleted {
            material_id,
            requested,
            result,
        } => Msg::OwnershipDone {
            material_id,
            requested,
            result: result
                .map(to_ownership)
                .map_err(|err| failure(&format!("Ownership change of {material_id}"), err)),
        },
        EngineEvent::DraftSaved {
            form,
            summary,
            result,
        } => Msg::DraftSaved {
            form,
            summary,
            result: result.map_err(|err| failure(&format!("Draft of form {form}"), err)),
        },
        EngineEvent::TeamConfirmCompleted {
            material_id,
            result,
        } => Msg::TeamUploadConfirmDone {
            material_id,
            result: result
                .map_err(|err| failure(&format!("Team confirmation of {material_id}"), err)),
        },
        EngineEvent::TransferCompleted {
            material_id,
            result,
        } => Msg::TransferDone {
            material_id,
            result: result.map_err(|err| failure(&format!("Transfer of {material_id}"), err)),
        },
    }
}

fn to_material(record: MaterialRecord) -> Material {
    let name = record
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| record.url.clone());
    Material {
        material_id: record.material_id,
        url: record.url,
        name,
        comment: record.comment.unwrap_or_default(),
        is_public: record.is_public,
        uploader_name: record.uploader_name,
        info_string: record.info_string,
        can_set_public: record.can_set_public,
    }
}

fn to_ownership(record: OwnershipRecord) -> Ownership {
    Ownership {
        is_owner: record.is_owner,
        owners: record.owners,
    }
}

fn failure(what: &str, err: EngineError) -> RequestFailure {
    uploader_warn!("{} failed: {}", what, err);
    RequestFailure::new(err.to_string())
}
