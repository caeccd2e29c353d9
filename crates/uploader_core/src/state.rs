use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::form::is_blank_rich_text;
use crate::{FormFields, Material, MaterialEntry, MaterialId, UploadContext};

pub type TaskId = u64;
pub type FormId = u64;

const RECENT_LIMIT: usize = 20;

/// Warning shown by the page-unload guard while uploads are in flight.
pub const UNLOAD_WARNING: &str = "not all uploads have finished";

/// Limits injected from the page configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_parallel_uploads: usize,
    pub max_file_size_mb: u64,
}

impl UploadLimits {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_parallel_uploads: 5,
            max_file_size_mb: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStage {
    Pending,
    InFlight,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub id: TaskId,
    pub display_name: String,
    pub form: FormId,
    pub stage: TaskStage,
    pub percent: Option<u8>,
    /// File uploads get a progress row; link and summary posts do not.
    pub has_progress_row: bool,
}

/// Summary text kept across runs, keyed by the form's stable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSnapshot {
    pub form_key: String,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct Form {
    pub(crate) id: FormId,
    pub(crate) key: String,
    pub(crate) context: Arc<dyn UploadContext>,
    pub(crate) fields: FormFields,
    pub(crate) entries: Vec<MaterialEntry>,
    /// Submit stays disabled until the page-wide queue drains.
    pub(crate) locked: bool,
    pub(crate) draft_dirty: bool,
    pub(crate) draft_saving: bool,
}

impl Form {
    pub fn id(&self) -> FormId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn context(&self) -> &dyn UploadContext {
        self.context.as_ref()
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn entries(&self) -> &[MaterialEntry] {
        &self.entries
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_valid(&self) -> bool {
        crate::validate(self.context.as_ref(), &self.fields)
    }

    pub fn submit_enabled(&self) -> bool {
        !self.locked && self.is_valid()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    limits: UploadLimits,
    forms: BTreeMap<FormId, Form>,
    next_form_id: FormId,
    tasks: BTreeMap<TaskId, UploadTask>,
    next_task_id: TaskId,
    queue: Vec<TaskId>,
    /// Entries with a delete or transfer request in flight.
    pending_removals: BTreeSet<MaterialId>,
    recent: Vec<UploadTask>,
    dirty: bool,
}

impl AppState {
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> UploadLimits {
        self.limits
    }

    /// Register an upload form found on the page.
    pub fn register_form(
        &mut self,
        key: impl Into<String>,
        context: Arc<dyn UploadContext>,
        extra: Vec<(String, String)>,
    ) -> FormId {
        self.next_form_id += 1;
        let id = self.next_form_id;
        self.forms.insert(
            id,
            Form {
                id,
                key: key.into(),
                context,
                fields: FormFields::with_extra(extra),
                entries: Vec::new(),
                locked: false,
                draft_dirty: false,
                draft_saving: false,
            },
        );
        self.dirty = true;
        id
    }

    pub fn form(&self, id: FormId) -> Option<&Form> {
        self.forms.get(&id)
    }

    pub fn forms(&self) -> impl Iterator<Item = &Form> {
        self.forms.values()
    }

    pub(crate) fn form_mut(&mut self, id: FormId) -> Option<&mut Form> {
        self.forms.get_mut(&id)
    }

    pub(crate) fn form_by_key_mut(&mut self, key: &str) -> Option<&mut Form> {
        self.forms.values_mut().find(|form| form.key == key)
    }

    pub(crate) fn forms_mut(&mut self) -> impl Iterator<Item = &mut Form> {
        self.forms.values_mut()
    }

    pub fn task(&self, id: TaskId) -> Option<&UploadTask> {
        self.tasks.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &UploadTask> {
        self.tasks.values()
    }

    pub fn queue(&self) -> &[TaskId] {
        &self.queue
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Most recent finished tasks, oldest first.
    pub fn recent(&self) -> &[UploadTask] {
        &self.recent
    }

    /// `Some` while leaving the page would drop in-flight uploads.
    pub fn unload_warning(&self) -> Option<&'static str> {
        (!self.queue.is_empty()).then_some(UNLOAD_WARNING)
    }

    /// Drafts worth persisting: non-blank summaries of summary forms.
    pub fn drafts(&self) -> Vec<DraftSnapshot> {
        self.forms
            .values()
            .filter(|form| form.context.accepts_summary())
            .filter(|form| !is_blank_rich_text(&form.fields.summary))
            .map(|form| DraftSnapshot {
                form_key: form.key.clone(),
                summary: form.fields.summary.clone(),
            })
            .collect()
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// New task in `Pending`, pushed onto the queue.
    pub(crate) fn create_task(
        &mut self,
        form: FormId,
        display_name: String,
        has_progress_row: bool,
    ) -> TaskId {
        self.next_task_id += 1;
        let id = self.next_task_id;
        self.tasks.insert(
            id,
            UploadTask {
                id,
                display_name,
                form,
                stage: TaskStage::Pending,
                percent: None,
                has_progress_row,
            },
        );
        self.queue.push(id);
        self.dirty = true;
        id
    }

    pub(crate) fn mark_in_flight(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.get_mut(&id) {
            if task.stage == TaskStage::Pending {
                task.stage = TaskStage::InFlight;
            }
        }
    }

    pub(crate) fn apply_progress(&mut self, id: TaskId, bytes_sent: u64, bytes_total: u64) {
        if bytes_total == 0 {
            return;
        }
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };
        let percent = (u128::from(bytes_sent.min(bytes_total)) * 100) / u128::from(bytes_total);
        let percent = u8::try_from(percent).unwrap_or(100);
        if task.percent != Some(percent) {
            task.percent = Some(percent);
            self.dirty = true;
        }
    }

    /// Move a task to its terminal stage, dropping its queue entry and
    /// progress row. Unknown ids yield `None`.
    pub(crate) fn finish_task(&mut self, id: TaskId, stage: TaskStage) -> Option<UploadTask> {
        let mut task = self.tasks.remove(&id)?;
        if let Some(index) = self.queue.iter().position(|queued| *queued == id) {
            self.queue.remove(index);
        }
        task.stage = stage;
        self.recent.push(task.clone());
        if self.recent.len() > RECENT_LIMIT {
            let overflow = self.recent.len() - RECENT_LIMIT;
            self.recent.drain(..overflow);
        }
        self.dirty = true;
        Some(task)
    }

    /// Unlock every locked form and clear what the user entered.
    pub(crate) fn release_forms(&mut self) {
        for form in self.forms.values_mut().filter(|form| form.locked) {
            form.locked = false;
            form.fields.clear_transient();
            form.draft_dirty = false;
        }
        self.dirty = true;
    }

    pub(crate) fn append_entry(&mut self, form: FormId, material: Material) {
        let Some(form) = self.forms.get_mut(&form) else {
            return;
        };
        let entry = MaterialEntry::new(material);
        match form.entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(existing) => *existing = entry,
            None => form.entries.push(entry),
        }
        self.dirty = true;
    }

    pub(crate) fn entry_mut(&mut self, material_id: MaterialId) -> Option<&mut MaterialEntry> {
        self.forms
            .values_mut()
            .flat_map(|form| form.entries.iter_mut())
            .find(|entry| entry.id() == material_id)
    }

    pub(crate) fn form_of_entry(&self, material_id: MaterialId) -> Option<&Form> {
        self.forms
            .values()
            .find(|form| form.entries.iter().any(|entry| entry.id() == material_id))
    }

    /// Remove exactly one entry by id; siblings are untouched.
    pub(crate) fn remove_entry(&mut self, material_id: MaterialId) -> bool {
        for form in self.forms.values_mut() {
            if let Some(index) = form.entries.iter().position(|e| e.id() == material_id) {
                form.entries.remove(index);
                self.dirty = true;
                return true;
            }
        }
        false
    }

    pub(crate) fn begin_removal(&mut self, material_id: MaterialId) -> bool {
        self.pending_removals.insert(material_id)
    }

    pub(crate) fn end_removal(&mut self, material_id: MaterialId) {
        self.pending_removals.remove(&material_id);
    }

    pub fn is_removal_pending(&self, material_id: MaterialId) -> bool {
        self.pending_removals.contains(&material_id)
    }
}
