use std::sync::Arc;

use uploader_core::{
    update, AppState, DraftSnapshot, Effect, FileUploadContext, FormId, Material, Msg,
    RequestFailure, SelectedFile, SummaryUploadContext, UploadLimits,
};

fn init_logging() {
    uploader_logging::initialize_for_tests();
}

fn page() -> (AppState, FormId, FormId) {
    let mut state = AppState::new(UploadLimits::default());
    let notes = state.register_form(
        "notes",
        Arc::new(SummaryUploadContext::new("/summary")),
        Vec::new(),
    );
    let files = state.register_form("files", Arc::new(FileUploadContext::new("/upload")), Vec::new());
    (state, notes, files)
}

fn edit(state: AppState, form: FormId, text: &str) -> AppState {
    let (state, effects) = update(
        state,
        Msg::SummaryEdited {
            form,
            text: text.to_string(),
        },
    );
    assert!(effects.is_empty());
    state
}

#[test]
fn autosave_sends_dirty_summary_once() {
    init_logging();
    let (state, notes, _) = page();
    let state = edit(state, notes, "<p>first</p>");

    let (state, effects) = update(state, Msg::AutosaveTick);
    assert_eq!(
        effects,
        vec![Effect::SaveDraft {
            form: notes,
            summary: "<p>first</p>".to_string()
        }]
    );

    // Still saving: the next tick does not send a duplicate.
    let (state, effects) = update(state, Msg::AutosaveTick);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::DraftSaved {
            form: notes,
            summary: "<p>first</p>".to_string(),
            result: Ok(()),
        },
    );
    let (_state, effects) = update(state, Msg::AutosaveTick);
    assert!(effects.is_empty());
}

#[test]
fn edits_during_save_keep_draft_dirty() {
    init_logging();
    let (state, notes, _) = page();
    let state = edit(state, notes, "<p>first</p>");
    let (state, _) = update(state, Msg::AutosaveTick);
    let state = edit(state, notes, "<p>first and more</p>");
    let (state, _) = update(
        state,
        Msg::DraftSaved {
            form: notes,
            summary: "<p>first</p>".to_string(),
            result: Ok(()),
        },
    );

    let (_state, effects) = update(state, Msg::AutosaveTick);
    assert_eq!(
        effects,
        vec![Effect::SaveDraft {
            form: notes,
            summary: "<p>first and more</p>".to_string()
        }]
    );
}

#[test]
fn failed_save_is_retried_on_next_tick() {
    init_logging();
    let (state, notes, _) = page();
    let state = edit(state, notes, "<p>x</p>");
    let (state, _) = update(state, Msg::AutosaveTick);
    let (state, _) = update(
        state,
        Msg::DraftSaved {
            form: notes,
            summary: "<p>x</p>".to_string(),
            result: Err(RequestFailure::new("network")),
        },
    );
    let (_state, effects) = update(state, Msg::AutosaveTick);
    assert_eq!(effects.len(), 1);
}

#[test]
fn drafts_round_trip_by_form_key() {
    init_logging();
    let (state, notes, files) = page();
    let state = edit(state, notes, "<p>keep me</p>");
    let state = edit(state, files, "<p>ignored</p>");
    let drafts = state.drafts();
    assert_eq!(
        drafts,
        vec![DraftSnapshot {
            form_key: "notes".to_string(),
            summary: "<p>keep me</p>".to_string()
        }]
    );

    let (fresh, notes, _) = page();
    let (fresh, _) = update(fresh, Msg::RestoreDrafts(drafts));
    assert_eq!(
        fresh.form(notes).map(|f| f.fields().summary.as_str()),
        Some("<p>keep me</p>")
    );
    let (_fresh, effects) = update(fresh, Msg::AutosaveTick);
    assert_eq!(effects.len(), 1);
}

#[test]
fn submitted_summary_is_cleared_when_queue_drains() {
    init_logging();
    let (state, notes, _) = page();
    let state = edit(state, notes, "<p>final</p>");
    let (state, effects) = update(state, Msg::SubmitClicked { form: notes });
    let task_id = match effects.as_slice() {
        [Effect::Upload { task_id, .. }] => *task_id,
        other => panic!("unexpected effects {other:?}"),
    };

    // No autosave while the form is locked.
    let (state, effects) = update(state, Msg::AutosaveTick);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::UploadDone {
            task_id,
            result: Ok(Material {
                material_id: 5,
                name: "summary".into(),
                ..Material::default()
            }),
        },
    );
    assert!(state.drafts().is_empty());
    let (_state, effects) = update(state, Msg::AutosaveTick);
    assert!(effects.is_empty());
}

#[test]
fn stored_draft_does_not_displace_selected_file() {
    init_logging();
    let (state, notes, _) = page();
    let (state, _) = update(
        state,
        Msg::FilesSelected {
            form: notes,
            files: vec![SelectedFile::new("a.pdf", "/tmp/a.pdf", 10)],
        },
    );
    let (state, _) = update(
        state,
        Msg::RestoreDrafts(vec![DraftSnapshot {
            form_key: "notes".to_string(),
            summary: "<p>old notes</p>".to_string(),
        }]),
    );

    let form = state.form(notes).unwrap();
    assert_eq!(form.fields().summary, "");
    assert!(form.is_valid());

    let (_state, effects) = update(state, Msg::SubmitClicked { form: notes });
    match effects.as_slice() {
        [Effect::Upload { request, .. }] => {
            assert_eq!(request.file.as_ref().map(|f| f.name.as_str()), Some("a.pdf"));
            assert_eq!(request.summary, None);
        }
        other => panic!("unexpected effects {other:?}"),
    }
}
