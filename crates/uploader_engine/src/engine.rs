use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use uploader_logging::{uploader_error, uploader_info, uploader_warn};

use crate::client::{ChannelProgressSink, ClientSettings, MaterialApi, ReqwestClient, Uploader};
use crate::{EngineError, EngineEvent, FailureKind, FormId, MaterialId, TaskId, UploadJob};

enum EngineCommand {
    Upload { task_id: TaskId, job: UploadJob },
    Delete {
        material_id: MaterialId,
        extra: Vec<(String, String)>,
    },
    SetPublic {
        material_id: MaterialId,
        is_public: bool,
    },
    SetOwnership { material_id: MaterialId, claim: bool },
    SaveDraft {
        form: FormId,
        summary: String,
        fields: Vec<(String, String)>,
    },
    ConfirmTeamUpload { material_id: MaterialId },
    Transfer {
        material_id: MaterialId,
        destination: Vec<(String, String)>,
    },
}

impl EngineCommand {
    /// Completion reported when the task running this command dies first.
    fn aborted(&self, err: EngineError) -> EngineEvent {
        match self {
            EngineCommand::Upload { task_id, .. } => EngineEvent::UploadCompleted {
                task_id: *task_id,
                result: Err(err),
            },
            EngineCommand::Delete { material_id, .. } => EngineEvent::DeleteCompleted {
                material_id: *material_id,
                result: Err(err),
            },
            EngineCommand::SetPublic {
                material_id,
                is_public,
            } => EngineEvent::PublicCompleted {
                material_id: *material_id,
                requested: *is_public,
                result: Err(err),
            },
            EngineCommand::SetOwnership { material_id, claim } => {
                EngineEvent::OwnershipCompleted {
                    material_id: *material_id,
                    requested: *claim,
                    result: Err(err),
                }
            }
            EngineCommand::SaveDraft { form, summary, .. } => EngineEvent::DraftSaved {
                form: *form,
                summary: summary.clone(),
                result: Err(err),
            },
            EngineCommand::ConfirmTeamUpload { material_id } => {
                EngineEvent::TeamConfirmCompleted {
                    material_id: *material_id,
                    result: Err(err),
                }
            }
            EngineCommand::Transfer { material_id, .. } => EngineEvent::TransferCompleted {
                material_id: *material_id,
                result: Err(err),
            },
        }
    }
}

/// Runs every request on a background tokio runtime and reports results
/// through a channel. Requests run concurrently; completion order is
/// whatever the server produces. Every command yields exactly one
/// completion event, even when its task panics.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let client = Arc::new(ReqwestClient::new(settings)?);
        Self::with_backend(client)
    }

    /// Run against any backend implementing both request seams.
    pub fn with_backend<B>(backend: Arc<B>) -> Result<Self, EngineError>
    where
        B: Uploader + MaterialApi + 'static,
    {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|err| EngineError::new(FailureKind::Io, err.to_string()))?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(supervise(backend, command, event_tx));
            }
            uploader_info!("Engine command channel closed");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload(&self, task_id: TaskId, job: UploadJob) {
        self.send(EngineCommand::Upload { task_id, job });
    }

    pub fn delete(&self, material_id: MaterialId, extra: Vec<(String, String)>) {
        self.send(EngineCommand::Delete { material_id, extra });
    }

    pub fn set_public(&self, material_id: MaterialId, is_public: bool) {
        self.send(EngineCommand::SetPublic {
            material_id,
            is_public,
        });
    }

    pub fn set_ownership(&self, material_id: MaterialId, claim: bool) {
        self.send(EngineCommand::SetOwnership { material_id, claim });
    }

    /// `fields` are the draft form fields; `summary` is echoed back in the
    /// completion event so the caller can tell which text was stored.
    pub fn save_draft(&self, form: FormId, summary: String, fields: Vec<(String, String)>) {
        self.send(EngineCommand::SaveDraft {
            form,
            summary,
            fields,
        });
    }

    pub fn confirm_team_upload(&self, material_id: MaterialId) {
        self.send(EngineCommand::ConfirmTeamUpload { material_id });
    }

    pub fn transfer(&self, material_id: MaterialId, destination: Vec<(String, String)>) {
        self.send(EngineCommand::Transfer {
            material_id,
            destination,
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            uploader_warn!("Engine worker is gone; command dropped");
        }
    }
}

/// Run one command on its own task; a panic is turned into a failed
/// completion so the caller is never left waiting.
async fn supervise<B>(
    backend: Arc<B>,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) where
    B: Uploader + MaterialApi + 'static,
{
    let fallback = command.aborted(EngineError::new(
        FailureKind::Aborted,
        "request task ended without a result",
    ));
    let worker_tx = event_tx.clone();
    let worker = tokio::spawn(async move {
        let event = handle_command(backend.as_ref(), command, &worker_tx).await;
        let _ = worker_tx.send(event);
    });
    if let Err(err) = worker.await {
        uploader_error!("Engine task failed: {}", err);
        let _ = event_tx.send(fallback);
    }
}

async fn handle_command<B>(
    backend: &B,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) -> EngineEvent
where
    B: Uploader + MaterialApi,
{
    match command {
        EngineCommand::Upload { task_id, job } => {
            let sink = Arc::new(ChannelProgressSink::new(event_tx.clone()));
            let result = backend.upload(task_id, &job, sink).await;
            EngineEvent::UploadCompleted { task_id, result }
        }
        EngineCommand::Delete { material_id, extra } => EngineEvent::DeleteCompleted {
            material_id,
            result: backend.delete(material_id, &extra).await,
        },
        EngineCommand::SetPublic {
            material_id,
            is_public,
        } => EngineEvent::PublicCompleted {
            material_id,
            requested: is_public,
            result: backend.set_public(material_id, is_public).await,
        },
        EngineCommand::SetOwnership { material_id, claim } => EngineEvent::OwnershipCompleted {
            material_id,
            requested: claim,
            result: backend.set_ownership(material_id, claim).await,
        },
        EngineCommand::SaveDraft {
            form,
            summary,
            fields,
        } => EngineEvent::DraftSaved {
            form,
            result: backend.save_draft(form, &fields).await,
            summary,
        },
        EngineCommand::ConfirmTeamUpload { material_id } => EngineEvent::TeamConfirmCompleted {
            material_id,
            result: backend.confirm_team_upload(material_id).await,
        },
        EngineCommand::Transfer {
            material_id,
            destination,
        } => EngineEvent::TransferCompleted {
            material_id,
            result: backend.transfer(material_id, &destination).await,
        },
    }
}
