use std::sync::{Arc, Once};

use pretty_assertions::assert_eq;
use uploader_core::{
    update, AppState, Effect, FileUploadContext, FormId, Material, Msg, RequestFailure,
    SelectedFile, TaskId, TaskStage, UploadLimits, REQUEST_FAILED_MESSAGE,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(uploader_logging::initialize_for_tests);
}

fn page() -> (AppState, FormId) {
    let mut state = AppState::new(UploadLimits {
        max_parallel_uploads: 5,
        max_file_size_mb: 10,
    });
    let form = state.register_form("intro", Arc::new(FileUploadContext::new("/upload")), Vec::new());
    (state, form)
}

fn submit_files(state: AppState, form: FormId, names: &[&str]) -> (AppState, Vec<TaskId>) {
    let files = names
        .iter()
        .map(|name| SelectedFile::new(*name, format!("/tmp/{name}"), 10))
        .collect();
    let (state, _) = update(state, Msg::FilesSelected { form, files });
    let (state, _) = update(
        state,
        Msg::CommentEdited {
            form,
            text: "draft".into(),
        },
    );
    let (state, effects) = update(state, Msg::SubmitClicked { form });
    let ids = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Upload { task_id, .. } => Some(*task_id),
            _ => None,
        })
        .collect();
    (state, ids)
}

fn material(material_id: u64) -> Material {
    Material {
        material_id,
        url: format!("/m/{material_id}"),
        name: format!("file-{material_id}.pdf"),
        ..Material::default()
    }
}

#[test]
fn single_file_success_appends_entry_and_reenables_submit() {
    init_logging();
    let (state, form) = page();
    let (state, ids) = submit_files(state, form, &["report.pdf"]);
    assert_eq!(ids.len(), 1);
    assert_eq!(state.queue_len(), 1);

    let (mut state, effects) = update(
        state,
        Msg::UploadDone {
            task_id: ids[0],
            result: Ok(material(42)),
        },
    );

    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let view = state.view();
    assert_eq!(view.queue_len, 0);
    assert!(view.progress_rows.is_empty());
    assert_eq!(view.unload_warning, None);

    let form_view = &view.forms[0];
    assert!(!form_view.locked);
    assert_eq!(form_view.entries.len(), 1);
    assert_eq!(form_view.entries[0].url, "/m/42");
    assert!(form_view.entries[0].markup.contains(r#"href="/m/42""#));
    // Transient fields were cleared, so there is nothing to submit yet.
    assert!(form_view.file_names.is_empty());
    assert_eq!(state.form(form).map(|f| f.fields().comment.as_str()), Some(""));

    let (state, _) = update(
        state,
        Msg::UrlEdited {
            form,
            text: "https://example.com".into(),
        },
    );
    assert!(state.view().forms[0].submit_enabled);
}

#[test]
fn failure_tears_down_task_and_alerts() {
    init_logging();
    let (state, form) = page();
    let (state, ids) = submit_files(state, form, &["a.pdf"]);

    let (state, effects) = update(
        state,
        Msg::UploadDone {
            task_id: ids[0],
            result: Err(RequestFailure::new("http status 500")),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: REQUEST_FAILED_MESSAGE.to_string()
        }]
    );
    let view = state.view();
    assert_eq!(view.queue_len, 0);
    assert!(view.forms[0].entries.is_empty());
    assert!(!view.forms[0].locked);
    assert_eq!(view.recent.last().map(|t| t.stage), Some(TaskStage::Failed));
}

#[test]
fn submit_stays_locked_until_last_task_regardless_of_order() {
    init_logging();
    let (state, form) = page();
    let (state, ids) = submit_files(state, form, &["one.pdf", "two.pdf"]);
    assert_eq!(ids.len(), 2);

    // Second request answers first.
    let (state, _) = update(
        state,
        Msg::UploadDone {
            task_id: ids[1],
            result: Ok(material(2)),
        },
    );
    let view = state.view();
    assert_eq!(view.queue_len, 1);
    assert!(view.forms[0].locked);
    assert_eq!(view.progress_rows.len(), 1);
    assert_eq!(view.progress_rows[0].task_id, ids[0]);

    let (state, _) = update(
        state,
        Msg::UploadDone {
            task_id: ids[0],
            result: Err(RequestFailure::new("network")),
        },
    );
    let view = state.view();
    assert_eq!(view.queue_len, 0);
    assert!(!view.forms[0].locked);
    assert!(view.forms[0].file_names.is_empty());
    let entry_ids: Vec<_> = view.forms[0].entries.iter().map(|e| e.material_id).collect();
    assert_eq!(entry_ids, vec![2]);
}

#[test]
fn completing_twice_is_noop() {
    init_logging();
    let (state, form) = page();
    let (state, ids) = submit_files(state, form, &["a.pdf", "b.pdf"]);

    let (state, _) = update(
        state,
        Msg::UploadDone {
            task_id: ids[0],
            result: Ok(material(1)),
        },
    );
    let before = state.view();
    let (state, effects) = update(
        state,
        Msg::UploadDone {
            task_id: ids[0],
            result: Err(RequestFailure::new("late duplicate")),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.queue_len(), 1);
    assert_eq!(state.view().forms, before.forms);
    assert_eq!(state.view().progress_rows, before.progress_rows);
}

#[test]
fn progress_for_finished_task_is_ignored() {
    init_logging();
    let (state, form) = page();
    let (state, ids) = submit_files(state, form, &["a.pdf"]);
    let (state, _) = update(
        state,
        Msg::UploadDone {
            task_id: ids[0],
            result: Ok(material(1)),
        },
    );
    let (state, _) = update(
        state,
        Msg::UploadProgress {
            task_id: ids[0],
            bytes_sent: 5,
            bytes_total: 10,
        },
    );
    assert!(state.view().progress_rows.is_empty());
    assert!(state.task(ids[0]).is_none());
}

#[test]
fn task_ids_are_monotonic_across_submissions() {
    init_logging();
    let (state, form) = page();
    let (state, first) = submit_files(state, form, &["a.pdf"]);
    let (state, _) = update(
        state,
        Msg::UploadDone {
            task_id: first[0],
            result: Ok(material(1)),
        },
    );
    let (_state, second) = submit_files(state, form, &["b.pdf"]);
    assert!(second[0] > first[0]);
}
