use crate::state::TaskStage;
use crate::{
    AppState, DraftSnapshot, Effect, FormFields, FormId, InputMode, Material, MaterialEntry,
    MaterialId, Msg, Ownership, RequestFailure, SelectedFile, TaskId, TransferDestination,
    UploadRequest,
};

/// Generic notice for any failed server call.
pub const REQUEST_FAILED_MESSAGE: &str = "Something went wrong, please try again";
const SUMMARY_DISPLAY_NAME: &str = "summary";

pub fn parallel_limit_message(max_parallel_uploads: usize) -> String {
    format!("The number of simultaneous uploads cannot exceed {max_parallel_uploads}")
}

pub fn file_too_large_message(max_file_size_mb: u64) -> String {
    format!("File size must not exceed {max_file_size_mb} MB")
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSelected { form, files } => select_files(&mut state, form, files),
        Msg::UrlEdited { form, text } => {
            edit_fields(&mut state, form, |fields| fields.url = text);
            Vec::new()
        }
        Msg::SummaryEdited { form, text } => {
            if let Some(target) = state.form_mut(form) {
                if target.fields.summary != text {
                    target.fields.summary = text;
                    target.draft_dirty = true;
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::CommentEdited { form, text } => {
            edit_fields(&mut state, form, |fields| fields.comment = text);
            Vec::new()
        }
        Msg::PublicChecked { form, checked } => {
            edit_fields(&mut state, form, |fields| fields.is_public = checked);
            Vec::new()
        }
        Msg::CategorySelected { form, category } => {
            edit_fields(&mut state, form, |fields| fields.category = category);
            Vec::new()
        }
        Msg::SubmitClicked { form } => submit(&mut state, form),
        Msg::UploadProgress {
            task_id,
            bytes_sent,
            bytes_total,
        } => {
            state.apply_progress(task_id, bytes_sent, bytes_total);
            Vec::new()
        }
        Msg::UploadDone { task_id, result } => complete_task(&mut state, task_id, result),
        Msg::RestoreEntries { form, materials } => {
            if let Some(target) = state.form_mut(form) {
                target.entries = materials.into_iter().map(MaterialEntry::new).collect();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::DeleteClicked { material_id } => {
            if is_removable(&state, material_id) {
                vec![Effect::ConfirmDelete { material_id }]
            } else {
                Vec::new()
            }
        }
        Msg::DeleteConfirmed {
            material_id,
            confirmed,
        } => confirm_delete(&mut state, material_id, confirmed),
        Msg::DeleteDone {
            material_id,
            result,
        } => removal_done(&mut state, material_id, result),
        Msg::TransferClicked {
            material_id,
            destination,
        } => {
            if is_removable(&state, material_id) {
                vec![Effect::ConfirmTransfer {
                    material_id,
                    destination,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::TransferConfirmed {
            material_id,
            destination,
            confirmed,
        } => confirm_transfer(&mut state, material_id, destination, confirmed),
        Msg::TransferDone {
            material_id,
            result,
        } => removal_done(&mut state, material_id, result),
        Msg::TeamUploadConfirmClicked { material_id } => match state.entry_mut(material_id) {
            Some(entry) if !entry.team_confirmed => {
                vec![Effect::AcceptTeamUpload { material_id }]
            }
            _ => Vec::new(),
        },
        Msg::TeamUploadConfirmDone {
            material_id,
            result,
        } => match result {
            Ok(()) => {
                if let Some(entry) = state.entry_mut(material_id) {
                    entry.team_confirmed = true;
                    state.mark_dirty();
                }
                Vec::new()
            }
            Err(_) => vec![failure_alert()],
        },
        Msg::PublicToggled {
            material_id,
            is_public,
        } => toggle_public(&mut state, material_id, is_public),
        Msg::PublicDone {
            material_id,
            requested,
            result,
        } => match result {
            Ok(()) => Vec::new(),
            Err(_) => {
                if let Some(entry) = state.entry_mut(material_id) {
                    if entry.material.is_public == requested {
                        entry.material.is_public = !requested;
                    }
                    state.mark_dirty();
                }
                vec![failure_alert()]
            }
        },
        Msg::OwnershipToggled { material_id } => toggle_ownership(&mut state, material_id),
        Msg::OwnershipDone {
            material_id,
            requested,
            result,
        } => ownership_done(&mut state, material_id, requested, result),
        Msg::AutosaveTick => autosave(&mut state),
        Msg::DraftSaved {
            form,
            summary,
            result,
        } => {
            if let Some(target) = state.form_mut(form) {
                target.draft_saving = false;
                if result.is_ok() && target.fields.summary == summary {
                    target.draft_dirty = false;
                }
            }
            Vec::new()
        }
        Msg::RestoreDrafts(drafts) => {
            restore_drafts(&mut state, drafts);
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn edit_fields(state: &mut AppState, form: FormId, edit: impl FnOnce(&mut FormFields)) {
    if let Some(target) = state.form_mut(form) {
        edit(&mut target.fields);
        state.mark_dirty();
    }
}

fn select_files(state: &mut AppState, form: FormId, files: Vec<SelectedFile>) -> Vec<Effect> {
    let limits = state.limits();
    let max_bytes = limits.max_file_size_bytes();
    let Some(target) = state.form_mut(form) else {
        return Vec::new();
    };
    let too_large = files.iter().any(|file| file.size_bytes > max_bytes);
    let effects = if too_large {
        target.fields.files.clear();
        vec![Effect::Alert {
            message: file_too_large_message(limits.max_file_size_mb),
        }]
    } else {
        target.fields.files = files;
        Vec::new()
    };
    state.mark_dirty();
    effects
}

fn submit(state: &mut AppState, form_id: FormId) -> Vec<Effect> {
    let max_parallel = state.limits().max_parallel_uploads;
    let queued = state.queue_len();
    let Some(form) = state.form(form_id) else {
        return Vec::new();
    };
    if !form.is_valid() {
        return Vec::new();
    }
    let Some(mode) = form.fields.active_mode() else {
        return Vec::new();
    };

    let fields = &form.fields;
    let request_count = match mode {
        InputMode::File => fields.files.len(),
        InputMode::Url | InputMode::Summary => 1,
    };
    if queued + request_count > max_parallel {
        return vec![Effect::Alert {
            message: parallel_limit_message(max_parallel),
        }];
    }
    if form.locked {
        return Vec::new();
    }

    let template = UploadRequest {
        endpoint: form.context.request_url().to_string(),
        file: None,
        link: non_blank(&fields.url),
        summary: (mode == InputMode::Summary).then(|| fields.summary.clone()),
        comment: fields.comment.clone(),
        is_public: fields.is_public,
        category: fields.category.clone(),
        extra: fields.extra.clone(),
    };
    let uploads: Vec<(String, UploadRequest, bool)> = match mode {
        InputMode::File => fields
            .files
            .iter()
            .map(|file| {
                let request = UploadRequest {
                    file: Some(file.clone()),
                    ..template.clone()
                };
                (file.name.clone(), request, true)
            })
            .collect(),
        InputMode::Url => vec![(link_display_name(&fields.url), template, false)],
        InputMode::Summary => vec![(SUMMARY_DISPLAY_NAME.to_string(), template, false)],
    };

    if let Some(target) = state.form_mut(form_id) {
        target.locked = true;
    }
    let mut effects = Vec::with_capacity(uploads.len());
    for (display_name, request, has_row) in uploads {
        let task_id = state.create_task(form_id, display_name, has_row);
        state.mark_in_flight(task_id);
        effects.push(Effect::Upload { task_id, request });
    }
    effects
}

fn complete_task(
    state: &mut AppState,
    task_id: TaskId,
    result: Result<Material, RequestFailure>,
) -> Vec<Effect> {
    let stage = if result.is_ok() {
        TaskStage::Completed
    } else {
        TaskStage::Failed
    };
    let Some(task) = state.finish_task(task_id, stage) else {
        return Vec::new();
    };

    let effects = match result {
        Ok(material) => {
            state.append_entry(task.form, material);
            Vec::new()
        }
        Err(_) => vec![failure_alert()],
    };
    if state.queue_len() == 0 {
        state.release_forms();
    }
    effects
}

fn confirm_delete(state: &mut AppState, material_id: MaterialId, confirmed: bool) -> Vec<Effect> {
    if !confirmed {
        return Vec::new();
    }
    let Some(form) = state.form_of_entry(material_id) else {
        return Vec::new();
    };
    let extra = form.fields.extra.clone();
    if !state.begin_removal(material_id) {
        return Vec::new();
    }
    state.mark_dirty();
    vec![Effect::DeleteMaterial { material_id, extra }]
}

fn confirm_transfer(
    state: &mut AppState,
    material_id: MaterialId,
    destination: TransferDestination,
    confirmed: bool,
) -> Vec<Effect> {
    if !confirmed || state.form_of_entry(material_id).is_none() {
        return Vec::new();
    }
    if !state.begin_removal(material_id) {
        return Vec::new();
    }
    state.mark_dirty();
    vec![Effect::TransferMaterial {
        material_id,
        destination,
    }]
}

fn is_removable(state: &AppState, material_id: MaterialId) -> bool {
    state.form_of_entry(material_id).is_some() && !state.is_removal_pending(material_id)
}

/// Shared completion of delete and transfer: the entry leaves the list only
/// on success.
fn removal_done(
    state: &mut AppState,
    material_id: MaterialId,
    result: Result<(), RequestFailure>,
) -> Vec<Effect> {
    state.end_removal(material_id);
    match result {
        Ok(()) => {
            state.remove_entry(material_id);
            Vec::new()
        }
        Err(_) => vec![failure_alert()],
    }
}

fn toggle_public(state: &mut AppState, material_id: MaterialId, is_public: bool) -> Vec<Effect> {
    let Some(entry) = state.entry_mut(material_id) else {
        return Vec::new();
    };
    if !entry.material.can_set_public || entry.material.is_public == is_public {
        return Vec::new();
    }
    entry.material.is_public = is_public;
    state.mark_dirty();
    vec![Effect::SetPublic {
        material_id,
        is_public,
    }]
}

fn toggle_ownership(state: &mut AppState, material_id: MaterialId) -> Vec<Effect> {
    let Some(entry) = state.entry_mut(material_id) else {
        return Vec::new();
    };
    let claim = !entry.is_owner;
    entry.is_owner = claim;
    state.mark_dirty();
    vec![Effect::SetOwnership { material_id, claim }]
}

fn ownership_done(
    state: &mut AppState,
    material_id: MaterialId,
    requested: bool,
    result: Result<Ownership, RequestFailure>,
) -> Vec<Effect> {
    let Some(entry) = state.entry_mut(material_id) else {
        return Vec::new();
    };
    let effects = match result {
        Ok(ownership) => {
            entry.is_owner = ownership.is_owner;
            entry.owners = ownership.owners.filter(|owners| !owners.is_empty());
            Vec::new()
        }
        Err(_) => {
            if entry.is_owner == requested {
                entry.is_owner = !requested;
            }
            vec![failure_alert()]
        }
    };
    state.mark_dirty();
    effects
}

fn autosave(state: &mut AppState) -> Vec<Effect> {
    state
        .forms_mut()
        .filter(|form| form.context.accepts_summary())
        .filter(|form| form.draft_dirty && !form.draft_saving && !form.locked)
        .map(|form| {
            form.draft_saving = true;
            Effect::SaveDraft {
                form: form.id,
                summary: form.fields.summary.clone(),
            }
        })
        .collect()
}

fn restore_drafts(state: &mut AppState, drafts: Vec<DraftSnapshot>) {
    for draft in drafts {
        let Some(form) = state.form_by_key_mut(&draft.form_key) else {
            continue;
        };
        // A draft never competes with a file or link already entered.
        if !form.context.accepts_summary() || !form.fields.filled_modes().is_empty() {
            continue;
        }
        form.fields.summary = draft.summary;
        form.draft_dirty = true;
    }
    state.mark_dirty();
}

fn failure_alert() -> Effect {
    Effect::Alert {
        message: REQUEST_FAILED_MESSAGE.to_string(),
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Host and path of a link, or the raw text when it does not parse.
fn link_display_name(raw: &str) -> String {
    let raw = raw.trim();
    match url::Url::parse(raw) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{host}{}", parsed.path().trim_end_matches('/')),
            None => raw.to_string(),
        },
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::link_display_name;

    #[test]
    fn link_display_name_prefers_host_and_path() {
        assert_eq!(
            link_display_name(" https://example.com/docs/ "),
            "example.com/docs"
        );
        assert_eq!(link_display_name("not a url"), "not a url");
    }
}
