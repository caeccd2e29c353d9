use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use uploader_logging::uploader_debug;

use crate::{
    EngineError, EngineEvent, FailureKind, FormId, MaterialId, MaterialRecord, OwnershipRecord,
    TaskId, UploadJob, UploadProgress,
};

const CSRF_FIELD: &str = "csrfmiddlewaretoken";
const FILE_FIELD: &str = "file_field";
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upper bound for a single file part, checked before sending.
    pub max_bytes: u64,
    pub csrf_token: String,
    pub delete_url: String,
    pub change_state_url: String,
    /// Per-material URL; `{id}` is replaced by the material id.
    pub ownership_url: String,
    pub draft_url: String,
    pub confirm_team_url: String,
    pub transfer_url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            max_bytes: 200 * 1024 * 1024,
            csrf_token: String::new(),
            delete_url: String::new(),
            change_state_url: String::new(),
            ownership_url: String::new(),
            draft_url: String::new(),
            confirm_team_url: String::new(),
            transfer_url: String::new(),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        task_id: TaskId,
        job: &UploadJob,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<MaterialRecord, EngineError>;
}

/// The non-upload material endpoints.
#[async_trait::async_trait]
pub trait MaterialApi: Send + Sync {
    async fn delete(
        &self,
        material_id: MaterialId,
        extra: &[(String, String)],
    ) -> Result<(), EngineError>;

    async fn set_public(&self, material_id: MaterialId, is_public: bool) -> Result<(), EngineError>;

    async fn set_ownership(
        &self,
        material_id: MaterialId,
        claim: bool,
    ) -> Result<OwnershipRecord, EngineError>;

    async fn save_draft(&self, form: FormId, fields: &[(String, String)])
        -> Result<(), EngineError>;

    async fn confirm_team_upload(&self, material_id: MaterialId) -> Result<(), EngineError>;

    /// `destination` holds the `type`, `dest_id` and `from_user` fields.
    async fn transfer(
        &self,
        material_id: MaterialId,
        destination: &[(String, String)],
    ) -> Result<(), EngineError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| EngineError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    async fn post_form(
        &self,
        url: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<Bytes, EngineError> {
        let url = reqwest::Url::parse(url)
            .map_err(|err| EngineError::new(FailureKind::InvalidUrl, err.to_string()))?;
        params.insert(0, (CSRF_FIELD.to_string(), self.settings.csrf_token.clone()));
        let form = params
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_success_body(response).await
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestClient {
    async fn upload(
        &self,
        task_id: TaskId,
        job: &UploadJob,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<MaterialRecord, EngineError> {
        let endpoint = reqwest::Url::parse(&job.endpoint)
            .map_err(|err| EngineError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let mut form = Form::new().text(CSRF_FIELD, self.settings.csrf_token.clone());
        for (name, value) in &job.fields {
            form = form.text(name.clone(), value.clone());
        }

        if let Some(file) = &job.file {
            let content = tokio::fs::read(&file.path)
                .await
                .map_err(|err| EngineError::new(FailureKind::Io, err.to_string()))?;
            let total = content.len() as u64;
            if total > self.settings.max_bytes {
                return Err(EngineError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: total,
                    },
                    "file too large",
                ));
            }
            uploader_debug!(
                "Task {} sending {} ({} bytes) to {}",
                task_id,
                file.name,
                total,
                endpoint
            );
            let part = Part::stream_with_length(progress_body(task_id, content, sink), total)
                .file_name(file.name.clone());
            form = form.part(FILE_FIELD, part);
        }

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = read_success_body(response).await?;
        parse_json(&body)
    }
}

#[async_trait::async_trait]
impl MaterialApi for ReqwestClient {
    async fn delete(
        &self,
        material_id: MaterialId,
        extra: &[(String, String)],
    ) -> Result<(), EngineError> {
        let mut params = vec![("material_id".to_string(), material_id.to_string())];
        params.extend(extra.iter().cloned());
        self.post_form(&self.settings.delete_url, params).await?;
        Ok(())
    }

    async fn set_public(&self, material_id: MaterialId, is_public: bool) -> Result<(), EngineError> {
        let params = vec![
            ("trace_id".to_string(), material_id.to_string()),
            ("is_public".to_string(), is_public.to_string()),
        ];
        self.post_form(&self.settings.change_state_url, params).await?;
        Ok(())
    }

    async fn set_ownership(
        &self,
        material_id: MaterialId,
        claim: bool,
    ) -> Result<OwnershipRecord, EngineError> {
        let url = self
            .settings
            .ownership_url
            .replace("{id}", &material_id.to_string());
        let params = vec![("confirm".to_string(), claim.to_string())];
        let body = self.post_form(&url, params).await?;
        parse_json(&body)
    }

    async fn save_draft(
        &self,
        form: FormId,
        fields: &[(String, String)],
    ) -> Result<(), EngineError> {
        uploader_debug!("Saving summary draft of form {}", form);
        self.post_form(&self.settings.draft_url, fields.to_vec())
            .await?;
        Ok(())
    }

    async fn confirm_team_upload(&self, material_id: MaterialId) -> Result<(), EngineError> {
        let params = vec![("material_id".to_string(), material_id.to_string())];
        self.post_form(&self.settings.confirm_team_url, params).await?;
        Ok(())
    }

    async fn transfer(
        &self,
        material_id: MaterialId,
        destination: &[(String, String)],
    ) -> Result<(), EngineError> {
        let mut params = vec![("material_id".to_string(), material_id.to_string())];
        params.extend(destination.iter().cloned());
        self.post_form(&self.settings.transfer_url, params).await?;
        Ok(())
    }
}

/// Request body that reports every chunk handed to the transport.
fn progress_body(task_id: TaskId, content: Vec<u8>, sink: Arc<dyn ProgressSink>) -> reqwest::Body {
    let bytes_total = content.len() as u64;
    let content = Bytes::from(content);
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(CHUNK_SIZE)
        .map(|start| content.slice(start..(start + CHUNK_SIZE).min(content.len())))
        .collect();

    let mut bytes_sent = 0u64;
    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        bytes_sent += chunk.len() as u64;
        sink.emit(EngineEvent::Progress(UploadProgress {
            task_id,
            bytes_sent,
            bytes_total,
        }));
        Ok::<Bytes, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(stream)
}

async fn read_success_body(response: reqwest::Response) -> Result<Bytes, EngineError> {
    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    response.bytes().await.map_err(map_reqwest_error)
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, EngineError> {
    serde_json::from_slice(body)
        .map_err(|err| EngineError::new(FailureKind::InvalidResponse, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> EngineError {
    if err.is_timeout() {
        return EngineError::new(FailureKind::Timeout, err.to_string());
    }
    EngineError::new(FailureKind::Network, err.to_string())
}
