use uploader_core::{AppViewModel, FormView, ProgressRowView, TaskStage};

const BAR_WIDTH: usize = 30;

/// Status lines for the current view: one per progress row, then the queue.
pub fn render_status(view: &AppViewModel) -> Vec<String> {
    let mut lines: Vec<String> = view.progress_rows.iter().map(progress_line).collect();
    lines.push(format!(
        "Uploads in progress: {} / {}",
        view.queue_len, view.max_parallel_uploads
    ));
    if let Some(warning) = view.unload_warning {
        lines.push(format!("Warning: {warning}"));
    }
    lines
}

/// Final report: finished tasks and the entries listed under every form.
pub fn render_summary(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    for task in &view.recent {
        let outcome = match task.stage {
            TaskStage::Completed => "done",
            TaskStage::Failed => "failed",
            TaskStage::Pending | TaskStage::InFlight => "unfinished",
        };
        lines.push(format!("[{outcome}] {}", task.display_name));
    }
    for form in &view.forms {
        lines.extend(form_lines(form));
    }
    lines
}

fn form_lines(form: &FormView) -> Vec<String> {
    if form.entries.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("{} ({}):", form.key, form.context)];
    for entry in &form.entries {
        let mut line = format!("  #{} {} <{}>", entry.material_id, entry.name, entry.url);
        if entry.is_public {
            line.push_str(" public");
        }
        if entry.is_owner {
            line.push_str(" owned");
        }
        if let Some(owners) = &entry.owners {
            line.push_str(&format!(" linked with {owners}"));
        }
        lines.push(line);
    }
    lines
}

fn progress_line(row: &ProgressRowView) -> String {
    format!(
        "{:>3}% {} {}",
        row.percent,
        progress_bar(row.percent),
        row.display_name
    )
}

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
