//! Page configuration: limits, CSRF token and endpoint URLs.
//!
//! Loaded from a RON file; every field has a default so a partial file works.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uploader_core::{
    EventBlockUploadContext, FileUploadContext, SummaryUploadContext, UploadContext, UploadLimits,
};
use uploader_engine::ClientSettings;

pub const DEFAULT_CONFIG_FILE: &str = "uploader.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    pub max_parallel_uploads: usize,
    pub max_file_size_mb: u64,
    pub csrf_token: String,
    pub endpoints: Endpoints,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub autosave_interval_secs: u64,
    /// Where unsent summary drafts are kept between runs.
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub materials: String,
    pub event_block: String,
    pub summary: String,
    pub delete: String,
    pub change_state: String,
    /// `{id}` is replaced by the material id.
    pub ownership: String,
    pub draft: String,
    pub confirm_team: String,
    pub transfer: String,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            max_parallel_uploads: 5,
            max_file_size_mb: 200,
            csrf_token: String::new(),
            endpoints: Endpoints::default(),
            connect_timeout_secs: 10,
            request_timeout_secs: 300,
            autosave_interval_secs: 30,
            state_dir: PathBuf::from(".uploader"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        let base = "http://127.0.0.1:8000";
        Self {
            materials: format!("{base}/materials/upload"),
            event_block: format!("{base}/materials/event-block"),
            summary: format!("{base}/materials/summary"),
            delete: format!("{base}/materials/delete"),
            change_state: format!("{base}/materials/change-state"),
            ownership: format!("{base}/materials/{{id}}/ownership"),
            draft: format!("{base}/materials/summary/draft"),
            confirm_team: format!("{base}/materials/confirm-team"),
            transfer: format!("{base}/materials/transfer"),
        }
    }
}

/// Kind of upload form to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FormKind {
    Materials,
    EventBlock,
    Summary,
}

impl UploaderConfig {
    /// Load `path`, or `uploader.ron` in the working directory when present,
    /// or fall back to defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = ron::from_str(text)?;
        anyhow::ensure!(
            config.max_parallel_uploads > 0,
            "max_parallel_uploads must be at least 1"
        );
        Ok(config)
    }

    pub fn limits(&self) -> UploadLimits {
        UploadLimits {
            max_parallel_uploads: self.max_parallel_uploads,
            max_file_size_mb: self.max_file_size_mb,
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_bytes: self.limits().max_file_size_bytes(),
            csrf_token: self.csrf_token.clone(),
            delete_url: self.endpoints.delete.clone(),
            change_state_url: self.endpoints.change_state.clone(),
            ownership_url: self.endpoints.ownership.clone(),
            draft_url: self.endpoints.draft.clone(),
            confirm_team_url: self.endpoints.confirm_team.clone(),
            transfer_url: self.endpoints.transfer.clone(),
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn context(&self, kind: FormKind) -> Arc<dyn UploadContext> {
        match kind {
            FormKind::Materials => Arc::new(FileUploadContext::new(&self.endpoints.materials)),
            FormKind::EventBlock => {
                Arc::new(EventBlockUploadContext::new(&self.endpoints.event_block))
            }
            FormKind::Summary => Arc::new(SummaryUploadContext::new(&self.endpoints.summary)),
        }
    }
}
