use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uploader_core::DraftSnapshot;
use uploader_engine::{remove_if_exists, write_atomic};
use uploader_logging::{uploader_error, uploader_info, uploader_warn};

const DRAFTS_FILENAME: &str = "drafts.ron";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedDraft {
    form_key: String,
    summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedDrafts {
    saved_utc: String,
    drafts: Vec<PersistedDraft>,
}

pub(crate) fn load_drafts(state_dir: &Path) -> Vec<DraftSnapshot> {
    let path = state_dir.join(DRAFTS_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            uploader_warn!("Failed to read drafts from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let persisted: PersistedDrafts = match ron::from_str(&content) {
        Ok(persisted) => persisted,
        Err(err) => {
            uploader_warn!("Failed to parse drafts from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    uploader_info!(
        "Loaded {} draft(s) saved at {} from {:?}",
        persisted.drafts.len(),
        persisted.saved_utc,
        path
    );
    persisted
        .drafts
        .into_iter()
        .map(|draft| DraftSnapshot {
            form_key: draft.form_key,
            summary: draft.summary,
        })
        .collect()
}

pub(crate) fn save_drafts(state_dir: &Path, drafts: &[DraftSnapshot]) {
    let persisted = PersistedDrafts {
        saved_utc: Utc::now().to_rfc3339(),
        drafts: drafts
            .iter()
            .map(|draft| PersistedDraft {
                form_key: draft.form_key.clone(),
                summary: draft.summary.clone(),
            })
            .collect(),
    };

    let content = match ron::ser::to_string_pretty(&persisted, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            uploader_error!("Failed to serialize drafts: {}", err);
            return;
        }
    };

    let path = state_dir.join(DRAFTS_FILENAME);
    if let Err(err) = write_atomic(&path, &content) {
        uploader_error!("Failed to write drafts to {:?}: {}", path, err);
    }
}

pub(crate) fn clear_drafts(state_dir: &Path) {
    let path = state_dir.join(DRAFTS_FILENAME);
    if let Err(err) = remove_if_exists(&path) {
        uploader_error!("Failed to remove drafts at {:?}: {}", path, err);
    }
}
