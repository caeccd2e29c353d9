use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use uploader_core::{update, AppState, DraftSnapshot, Effect, FormId, Msg, TaskStage};
use uploader_engine::EngineEvent;
use uploader_logging::{uploader_info, uploader_trace, uploader_warn};

use crate::config::{FormKind, UploaderConfig};
use crate::effects::{event_to_msg, EffectRunner};
use crate::persistence;
use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How delete and transfer confirmations are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Prompt,
    AssumeYes,
}

/// Drives the core state machine: messages in, effects out, engine events
/// pumped back in until every request has been answered.
pub struct App {
    state: AppState,
    runner: EffectRunner,
    confirm: Confirm,
    state_dir: PathBuf,
    autosave_interval: Duration,
    outstanding: usize,
    alerts: Vec<String>,
    last_status: Vec<String>,
}

impl App {
    pub fn new(config: &UploaderConfig, confirm: Confirm) -> anyhow::Result<Self> {
        let runner =
            EffectRunner::new(config.client_settings()).context("starting request engine")?;
        Ok(Self {
            state: AppState::new(config.limits()),
            runner,
            confirm,
            state_dir: config.state_dir.clone(),
            autosave_interval: config.autosave_interval(),
            outstanding: 0,
            alerts: Vec::new(),
            last_status: Vec::new(),
        })
    }

    pub fn register_form(
        &mut self,
        config: &UploaderConfig,
        kind: FormKind,
        key: &str,
        extra: Vec<(String, String)>,
    ) -> FormId {
        let form = self.state.register_form(key, config.context(kind), extra);
        self.state.consume_dirty();
        form
    }

    /// Put drafts saved by an earlier run back into their forms.
    pub fn restore_drafts(&mut self) {
        let drafts = persistence::load_drafts(&self.state_dir);
        if !drafts.is_empty() {
            self.dispatch(Msg::RestoreDrafts(drafts));
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn dispatch(&mut self, msg: Msg) {
        if !matches!(msg, Msg::Tick) {
            uploader_trace!("Dispatch {:?}", msg);
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        if was_dirty {
            self.print_status();
        }
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Alert { message } => {
                uploader_warn!("Alert: {}", message);
                eprintln!("{message}");
                self.alerts.push(message);
            }
            Effect::ConfirmDelete { material_id } => {
                let confirmed = match self.confirm {
                    Confirm::AssumeYes => true,
                    Confirm::Prompt => ask(&format!("Delete material {material_id}?")),
                };
                self.dispatch(Msg::DeleteConfirmed {
                    material_id,
                    confirmed,
                });
            }
            Effect::ConfirmTransfer {
                material_id,
                destination,
            } => {
                let confirmed = match self.confirm {
                    Confirm::AssumeYes => true,
                    Confirm::Prompt => ask(&format!(
                        "Transfer material {material_id} to {}?",
                        destination.kind
                    )),
                };
                self.dispatch(Msg::TransferConfirmed {
                    material_id,
                    destination,
                    confirmed,
                });
            }
            other => {
                let draft_fields = match &other {
                    Effect::SaveDraft { form, .. } => self
                        .state
                        .form(*form)
                        .map(|form| form.fields().extra.clone())
                        .unwrap_or_default(),
                    _ => Vec::new(),
                };
                if self.runner.execute(other, &draft_fields) {
                    self.outstanding += 1;
                }
            }
        }
    }

    /// Pump engine events until every request sent so far has completed.
    pub fn run_until_idle(&mut self) {
        let mut next_autosave = Instant::now() + self.autosave_interval;
        while self.outstanding > 0 {
            match self.runner.recv_timeout(POLL_INTERVAL) {
                Some(event) => {
                    if !matches!(event, EngineEvent::Progress(_)) {
                        self.outstanding -= 1;
                    }
                    self.dispatch(event_to_msg(event));
                }
                None => self.dispatch(Msg::Tick),
            }
            if Instant::now() >= next_autosave {
                self.dispatch(Msg::AutosaveTick);
                next_autosave = Instant::now() + self.autosave_interval;
            }
        }
        if let Some(warning) = self.state.unload_warning() {
            uploader_warn!("Shutting down with {} queued: {}", self.state.queue_len(), warning);
        }
    }

    /// Persist drafts, print the final report and tell whether everything
    /// went through without an alert.
    pub fn finish(self) -> bool {
        self.persist_drafts();
        for line in render::render_summary(&self.state.view()) {
            println!("{line}");
        }
        uploader_info!("Finished with {} alert(s)", self.alerts.len());
        self.alerts.is_empty()
    }

    /// Merge this run's drafts into the stored ones. A stored draft is
    /// dropped once its form has submitted successfully.
    fn persist_drafts(&self) {
        let current = self.state.drafts();
        let submitted: Vec<&str> = self
            .state
            .recent()
            .iter()
            .filter(|task| task.stage == TaskStage::Completed)
            .filter_map(|task| self.state.form(task.form))
            .map(|form| form.key())
            .collect();

        let mut merged: Vec<DraftSnapshot> = persistence::load_drafts(&self.state_dir)
            .into_iter()
            .filter(|stored| !current.iter().any(|d| d.form_key == stored.form_key))
            .filter(|stored| !submitted.contains(&stored.form_key.as_str()))
            .collect();
        merged.extend(current);

        if merged.is_empty() {
            persistence::clear_drafts(&self.state_dir);
        } else {
            persistence::save_drafts(&self.state_dir, &merged);
        }
    }

    fn print_status(&mut self) {
        let lines = render::render_status(&self.state.view());
        if lines != self.last_status {
            for line in &lines {
                println!("{line}");
            }
            self.last_status = lines;
        }
    }
}

fn ask(question: &str) -> bool {
    print!("{question} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
