//! Upload contexts: one strategy per kind of upload form on a page.
use std::fmt;

use crate::render::{render_entry, EntryStyle};
use crate::{FormFields, InputMode, MaterialEntry};

/// Per-form behaviour: where requests go, what counts as a complete form and
/// how a returned material is listed.
pub trait UploadContext: fmt::Debug + Send + Sync {
    /// Short name used in logs and the terminal view.
    fn label(&self) -> &'static str;

    fn request_url(&self) -> &str;

    /// Whether the form has a rich-text summary tab.
    fn accepts_summary(&self) -> bool {
        false
    }

    /// Whether the destination selector must be filled.
    fn requires_category(&self) -> bool {
        false
    }

    fn is_valid(&self, fields: &FormFields) -> bool {
        let Some(mode) = fields.active_mode() else {
            return false;
        };
        if mode == InputMode::Summary && !self.accepts_summary() {
            return false;
        }
        !self.requires_category() || fields.has_category()
    }

    fn render_entry(&self, entry: &MaterialEntry) -> String;
}

/// True iff exactly one input mode is filled and the context's own
/// requirements hold.
pub fn validate(context: &dyn UploadContext, fields: &FormFields) -> bool {
    context.is_valid(fields)
}

/// Trace materials form: a file or a link.
#[derive(Debug, Clone)]
pub struct FileUploadContext {
    url: String,
}

impl FileUploadContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl UploadContext for FileUploadContext {
    fn label(&self) -> &'static str {
        "materials"
    }

    fn request_url(&self) -> &str {
        &self.url
    }

    fn render_entry(&self, entry: &MaterialEntry) -> String {
        render_entry(entry, EntryStyle::Trace)
    }
}

/// Assistant event-block form; the target block must be chosen.
#[derive(Debug, Clone)]
pub struct EventBlockUploadContext {
    url: String,
}

impl EventBlockUploadContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl UploadContext for EventBlockUploadContext {
    fn label(&self) -> &'static str {
        "event-block"
    }

    fn request_url(&self) -> &str {
        &self.url
    }

    fn requires_category(&self) -> bool {
        true
    }

    fn render_entry(&self, entry: &MaterialEntry) -> String {
        render_entry(entry, EntryStyle::EventBlock)
    }
}

/// Form with file, link and rich-text summary tabs.
#[derive(Debug, Clone)]
pub struct SummaryUploadContext {
    url: String,
}

impl SummaryUploadContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl UploadContext for SummaryUploadContext {
    fn label(&self) -> &'static str {
        "summary"
    }

    fn request_url(&self) -> &str {
        &self.url
    }

    fn accepts_summary(&self) -> bool {
        true
    }

    fn render_entry(&self, entry: &MaterialEntry) -> String {
        render_entry(entry, EntryStyle::Summary)
    }
}
