use crate::render::render_progress_row;
use crate::{AppState, FormId, InputMode, MaterialId, TaskId, TaskStage};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub forms: Vec<FormView>,
    pub progress_rows: Vec<ProgressRowView>,
    pub queue_len: usize,
    pub max_parallel_uploads: usize,
    pub recent: Vec<FinishedTaskView>,
    pub unload_warning: Option<&'static str>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub form: FormId,
    pub key: String,
    pub context: &'static str,
    pub active_mode: Option<InputMode>,
    pub valid: bool,
    pub locked: bool,
    pub submit_enabled: bool,
    pub file_names: Vec<String>,
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub material_id: MaterialId,
    pub name: String,
    pub url: String,
    pub is_public: bool,
    pub is_owner: bool,
    pub owners: Option<String>,
    pub team_confirmed: bool,
    pub markup: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRowView {
    pub task_id: TaskId,
    pub form: FormId,
    pub display_name: String,
    pub percent: u8,
    pub markup: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedTaskView {
    pub task_id: TaskId,
    pub display_name: String,
    pub stage: TaskStage,
}

impl AppState {
    pub fn view(&self) -> AppViewModel {
        let forms = self
            .forms()
            .map(|form| FormView {
                form: form.id(),
                key: form.key().to_string(),
                context: form.context().label(),
                active_mode: form.fields().active_mode(),
                valid: form.is_valid(),
                locked: form.is_locked(),
                submit_enabled: form.submit_enabled(),
                file_names: form.fields().files.iter().map(|f| f.name.clone()).collect(),
                entries: form
                    .entries()
                    .iter()
                    .map(|entry| EntryView {
                        material_id: entry.id(),
                        name: entry.material.name.clone(),
                        url: entry.material.url.clone(),
                        is_public: entry.material.is_public,
                        is_owner: entry.is_owner,
                        owners: entry.owners.clone(),
                        team_confirmed: entry.team_confirmed,
                        markup: form.context().render_entry(entry),
                    })
                    .collect(),
            })
            .collect();

        let progress_rows = self
            .queue()
            .iter()
            .filter_map(|id| self.task(*id))
            .filter(|task| task.has_progress_row)
            .map(|task| {
                let percent = task.percent.unwrap_or(0);
                ProgressRowView {
                    task_id: task.id,
                    form: task.form,
                    display_name: task.display_name.clone(),
                    percent,
                    markup: render_progress_row(task.id, &task.display_name, percent),
                }
            })
            .collect();

        let recent = self
            .recent()
            .iter()
            .map(|task| FinishedTaskView {
                task_id: task.id,
                display_name: task.display_name.clone(),
                stage: task.stage,
            })
            .collect();

        AppViewModel {
            forms,
            progress_rows,
            queue_len: self.queue_len(),
            max_parallel_uploads: self.limits().max_parallel_uploads,
            recent,
            unload_warning: self.unload_warning(),
            dirty: self.is_dirty(),
        }
    }
}
