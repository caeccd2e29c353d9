use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;
use uploader_engine::{
    ClientSettings, EngineError, EngineEvent, EngineHandle, FailureKind, FilePart, FormId,
    MaterialApi, MaterialId, MaterialRecord, OwnershipRecord, ProgressSink, TaskId, UploadJob,
    Uploader,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn next_event(engine: &EngineHandle) -> EngineEvent {
    for _ in 0..500 {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no engine event within 5s");
}

fn file_job(server: &MockServer, file: &NamedTempFile, name: &str) -> UploadJob {
    UploadJob {
        endpoint: format!("{}/upload", server.uri()),
        fields: Vec::new(),
        file: Some(FilePart {
            name: name.into(),
            path: file.path().to_path_buf(),
        }),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_uploads_complete_in_any_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"url": "/m/1", "material_id": 1}"#, "application/json"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"content").unwrap();

    let engine = EngineHandle::new(ClientSettings::default()).unwrap();
    engine.upload(1, file_job(&server, &file, "a.txt"));
    engine.upload(2, file_job(&server, &file, "b.txt"));

    let mut completed = BTreeSet::new();
    while completed.len() < 2 {
        match next_event(&engine).await {
            EngineEvent::UploadCompleted { task_id, result } => {
                assert!(result.is_ok(), "task {task_id} failed: {result:?}");
                completed.insert(task_id);
            }
            EngineEvent::Progress(progress) => {
                assert!(progress.task_id == 1 || progress.task_id == 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(completed, BTreeSet::from([1, 2]));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_delete_is_reported_with_material_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/delete"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = EngineHandle::new(ClientSettings {
        delete_url: format!("{}/delete", server.uri()),
        ..ClientSettings::default()
    })
    .unwrap();
    engine.delete(9, Vec::new());

    match next_event(&engine).await {
        EngineEvent::DeleteCompleted {
            material_id,
            result,
        } => {
            assert_eq!(material_id, 9);
            assert_eq!(result.unwrap_err().kind, FailureKind::HttpStatus(500));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn draft_event_echoes_saved_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/draft"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let engine = EngineHandle::new(ClientSettings {
        draft_url: format!("{}/draft", server.uri()),
        ..ClientSettings::default()
    })
    .unwrap();
    engine.save_draft(4, "<p>x</p>".into(), vec![("summary".into(), "<p>x</p>".into())]);

    assert_eq!(
        next_event(&engine).await,
        EngineEvent::DraftSaved {
            form: 4,
            summary: "<p>x</p>".into(),
            result: Ok(()),
        }
    );
}

/// Backend whose every request panics mid-flight.
struct PanickingBackend;

#[async_trait::async_trait]
impl Uploader for PanickingBackend {
    async fn upload(
        &self,
        _task_id: TaskId,
        _job: &UploadJob,
        _sink: Arc<dyn ProgressSink>,
    ) -> Result<MaterialRecord, EngineError> {
        panic!("upload backend crashed");
    }
}

#[async_trait::async_trait]
impl MaterialApi for PanickingBackend {
    async fn delete(
        &self,
        _material_id: MaterialId,
        _extra: &[(String, String)],
    ) -> Result<(), EngineError> {
        panic!("delete backend crashed");
    }

    async fn set_public(&self, _material_id: MaterialId, _is_public: bool) -> Result<(), EngineError> {
        panic!("state backend crashed");
    }

    async fn set_ownership(
        &self,
        _material_id: MaterialId,
        _claim: bool,
    ) -> Result<OwnershipRecord, EngineError> {
        panic!("ownership backend crashed");
    }

    async fn save_draft(
        &self,
        _form: FormId,
        _fields: &[(String, String)],
    ) -> Result<(), EngineError> {
        panic!("draft backend crashed");
    }

    async fn confirm_team_upload(&self, _material_id: MaterialId) -> Result<(), EngineError> {
        panic!("confirm backend crashed");
    }

    async fn transfer(
        &self,
        _material_id: MaterialId,
        _destination: &[(String, String)],
    ) -> Result<(), EngineError> {
        panic!("transfer backend crashed");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_request_still_reports_completion() {
    let engine = EngineHandle::with_backend(Arc::new(PanickingBackend)).unwrap();
    engine.upload(5, UploadJob::default());
    engine.transfer(8, Vec::new());

    let mut seen = Vec::new();
    while seen.len() < 2 {
        match next_event(&engine).await {
            EngineEvent::UploadCompleted { task_id, result } => {
                assert_eq!(task_id, 5);
                assert_eq!(result.unwrap_err().kind, FailureKind::Aborted);
                seen.push("upload");
            }
            EngineEvent::TransferCompleted {
                material_id,
                result,
            } => {
                assert_eq!(material_id, 8);
                assert_eq!(result.unwrap_err().kind, FailureKind::Aborted);
                seen.push("transfer");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    seen.sort_unstable();
    assert_eq!(seen, vec!["transfer", "upload"]);
}
