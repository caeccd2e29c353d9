mod app;
mod config;
mod effects;
mod persistence;
mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use uploader_core::{FormId, Material, MaterialId, Msg, SelectedFile, TransferDestination};
use uploader_logging::{uploader_error, uploader_info, LogDestination};

use crate::app::{App, Confirm};
use crate::config::{FormKind, UploaderConfig};

const LOG_FILE: &str = "./uploader.log";

#[derive(Debug, Parser)]
#[command(name = "uploader", version, about = "Upload course materials to an ISLE site")]
struct Cli {
    /// RON configuration file (defaults to ./uploader.ron when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, env = "UPLOADER_CSRF_TOKEN", global = true, hide_env_values = true)]
    csrf_token: Option<String>,

    #[arg(long, global = true)]
    max_parallel: Option<usize>,

    /// Answer yes to confirmation prompts.
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Also log to the terminal; repeat for debug output.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log to the terminal only, leaving no log file behind.
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit files, a link or a summary through one upload form.
    Upload(UploadArgs),
    /// Save a summary draft without submitting it.
    Draft(DraftArgs),
    /// Delete a listed material.
    Delete {
        material_id: MaterialId,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Make a material public or private.
    SetPublic {
        material_id: MaterialId,
        #[arg(action = clap::ArgAction::Set)]
        public: bool,
    },
    /// Claim ownership of a material.
    Claim { material_id: MaterialId },
    /// Accept a material a team member uploaded to an event block.
    ConfirmTeam {
        material_id: MaterialId,
        /// Name of the team member who uploaded it.
        #[arg(long, default_value = "team member")]
        uploader: String,
    },
    /// Move a material to another page.
    Transfer {
        material_id: MaterialId,
        /// Destination type understood by the transfer view.
        #[arg(long = "type", default_value = "event")]
        kind: String,
        #[arg(long)]
        dest_id: Option<String>,
        /// Original uploader, when moving a team upload.
        #[arg(long)]
        from_user: Option<String>,
        #[command(flatten)]
        form: FormArgs,
    },
}

#[derive(Debug, Args)]
struct FormArgs {
    /// Extra hidden form field, as name=value.
    #[arg(long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

#[derive(Debug, Args)]
struct UploadArgs {
    #[arg(long, value_enum, default_value = "materials")]
    form: FormKind,

    /// Stable form key used for drafts (defaults to the form kind).
    #[arg(long)]
    key: Option<String>,

    files: Vec<PathBuf>,

    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    summary: Option<String>,

    #[arg(long, default_value = "")]
    comment: String,

    #[arg(long)]
    public: bool,

    /// Event block id, required by the event-block form.
    #[arg(long)]
    category: Option<String>,

    #[command(flatten)]
    extra: FormArgs,
}

impl UploadArgs {
    /// A stored draft only stands in when nothing else was given to submit.
    fn restores_draft(&self) -> bool {
        self.files.is_empty() && self.url.is_none() && self.summary.is_none()
    }
}

#[derive(Debug, Args)]
struct DraftArgs {
    #[arg(long)]
    key: Option<String>,

    summary: String,

    #[command(flatten)]
    extra: FormArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let (destination, level) = log_target(cli.verbose, cli.no_log_file);
    uploader_logging::initialize(destination, level, Path::new(LOG_FILE));

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            uploader_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn log_target(verbose: u8, no_log_file: bool) -> (LogDestination, LevelFilter) {
    let level = if verbose > 1 {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match (no_log_file, verbose) {
        (true, _) => LogDestination::Terminal,
        (false, 0) => LogDestination::File,
        (false, _) => LogDestination::Both,
    };
    (destination, level)
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = UploaderConfig::load(cli.config.as_deref())?;
    if let Some(token) = cli.csrf_token {
        config.csrf_token = token;
    }
    if let Some(max) = cli.max_parallel {
        anyhow::ensure!(max > 0, "--max-parallel must be at least 1");
        config.max_parallel_uploads = max;
    }
    uploader_info!(
        "Starting with max_parallel_uploads={} max_file_size_mb={}",
        config.max_parallel_uploads,
        config.max_file_size_mb
    );

    let confirm = if cli.yes {
        Confirm::AssumeYes
    } else {
        Confirm::Prompt
    };
    let mut app = App::new(&config, confirm)?;

    match cli.command {
        Command::Upload(args) => upload(&mut app, &config, args)?,
        Command::Draft(args) => draft(&mut app, &config, args),
        Command::Delete { material_id, form } => {
            let form = app.register_form(&config, FormKind::Materials, "materials", form.fields);
            app.dispatch(listed(form, material_id, false));
            app.dispatch(Msg::DeleteClicked { material_id });
        }
        Command::SetPublic {
            material_id,
            public,
        } => {
            let form = app.register_form(&config, FormKind::Materials, "materials", Vec::new());
            app.dispatch(listed(form, material_id, !public));
            app.dispatch(Msg::PublicToggled {
                material_id,
                is_public: public,
            });
        }
        Command::Claim { material_id } => {
            let form = app.register_form(&config, FormKind::Materials, "materials", Vec::new());
            app.dispatch(listed(form, material_id, false));
            app.dispatch(Msg::OwnershipToggled { material_id });
        }
        Command::ConfirmTeam {
            material_id,
            uploader,
        } => {
            let form =
                app.register_form(&config, FormKind::EventBlock, "event-block", Vec::new());
            app.dispatch(Msg::RestoreEntries {
                form,
                materials: vec![Material {
                    uploader_name: Some(uploader),
                    ..listed_material(material_id, false)
                }],
            });
            app.dispatch(Msg::TeamUploadConfirmClicked { material_id });
        }
        Command::Transfer {
            material_id,
            kind,
            dest_id,
            from_user,
            form,
        } => {
            let form = app.register_form(&config, FormKind::Materials, "materials", form.fields);
            app.dispatch(listed(form, material_id, false));
            app.dispatch(Msg::TransferClicked {
                material_id,
                destination: TransferDestination {
                    kind,
                    dest_id,
                    from_user,
                },
            });
        }
    }

    app.run_until_idle();
    Ok(app.finish())
}

fn upload(app: &mut App, config: &UploaderConfig, args: UploadArgs) -> anyhow::Result<()> {
    let restores_draft = args.restores_draft();
    let key = args.key.unwrap_or_else(|| default_key(args.form));
    let form = app.register_form(config, args.form, &key, args.extra.fields);
    if restores_draft {
        app.restore_drafts();
    }

    app.dispatch(Msg::CategorySelected {
        form,
        category: args.category,
    });
    app.dispatch(Msg::CommentEdited {
        form,
        text: args.comment,
    });
    app.dispatch(Msg::PublicChecked {
        form,
        checked: args.public,
    });
    if !args.files.is_empty() {
        let files = args
            .files
            .iter()
            .map(|path| selected_file(path))
            .collect::<anyhow::Result<Vec<_>>>()?;
        app.dispatch(Msg::FilesSelected { form, files });
    }
    if let Some(url) = args.url {
        app.dispatch(Msg::UrlEdited { form, text: url });
    }
    if let Some(summary) = args.summary {
        app.dispatch(Msg::SummaryEdited {
            form,
            text: summary,
        });
    }

    let valid = app.state().form(form).is_some_and(|form| form.is_valid());
    if !valid && app.alerts().is_empty() {
        anyhow::bail!(
            "nothing to submit: give exactly one of files, --url or --summary{}",
            if args.form == FormKind::EventBlock {
                ", plus --category"
            } else {
                ""
            }
        );
    }
    app.dispatch(Msg::SubmitClicked { form });
    Ok(())
}

fn draft(app: &mut App, config: &UploaderConfig, args: DraftArgs) {
    let key = args.key.unwrap_or_else(|| default_key(FormKind::Summary));
    let form = app.register_form(config, FormKind::Summary, &key, args.extra.fields);
    app.dispatch(Msg::SummaryEdited {
        form,
        text: args.summary,
    });
    app.dispatch(Msg::AutosaveTick);
}

fn default_key(kind: FormKind) -> String {
    match kind {
        FormKind::Materials => "materials",
        FormKind::EventBlock => "event-block",
        FormKind::Summary => "summary",
    }
    .to_string()
}

/// A material already listed under `form`, as the page would show it.
fn listed(form: FormId, material_id: MaterialId, is_public: bool) -> Msg {
    Msg::RestoreEntries {
        form,
        materials: vec![listed_material(material_id, is_public)],
    }
}

fn listed_material(material_id: MaterialId, is_public: bool) -> Material {
    Material {
        material_id,
        url: format!("#{material_id}"),
        name: format!("material {material_id}"),
        is_public,
        can_set_public: true,
        ..Material::default()
    }
}

fn selected_file(path: &Path) -> anyhow::Result<SelectedFile> {
    let metadata =
        fs::metadata(path).with_context(|| format!("reading {}", path.display()))?;
    anyhow::ensure!(metadata.is_file(), "{} is not a file", path.display());
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(name, path, metadata.len()))
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn upload_arguments_parse() {
        let cli = Cli::try_parse_from([
            "uploader",
            "upload",
            "--form",
            "event-block",
            "--category",
            "3",
            "--public",
            "--field",
            "trace=12",
            "a.pdf",
            "b.pdf",
        ])
        .unwrap();

        let Command::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.form, FormKind::EventBlock);
        assert_eq!(args.category.as_deref(), Some("3"));
        assert!(args.public);
        assert_eq!(args.files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
        assert_eq!(
            args.extra.fields,
            vec![("trace".to_string(), "12".to_string())]
        );
    }

    #[test]
    fn set_public_takes_explicit_bool() {
        let cli = Cli::try_parse_from(["uploader", "-y", "set-public", "7", "false"]).unwrap();
        assert!(cli.yes);
        assert!(matches!(
            cli.command,
            Command::SetPublic {
                material_id: 7,
                public: false
            }
        ));
    }

    #[test]
    fn transfer_arguments_parse() {
        let cli = Cli::try_parse_from([
            "uploader",
            "transfer",
            "9",
            "--type",
            "trace",
            "--dest-id",
            "4",
        ])
        .unwrap();

        let Command::Transfer {
            material_id,
            kind,
            dest_id,
            from_user,
            ..
        } = cli.command
        else {
            panic!("expected transfer");
        };
        assert_eq!(material_id, 9);
        assert_eq!(kind, "trace");
        assert_eq!(dest_id.as_deref(), Some("4"));
        assert_eq!(from_user, None);

        let cli = Cli::try_parse_from(["uploader", "confirm-team", "11"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::ConfirmTeam { material_id: 11, .. }
        ));
    }

    #[test]
    fn drafts_are_restored_only_without_other_input() {
        let parse = |args: &[&str]| {
            let cli = Cli::try_parse_from(args).unwrap();
            let Command::Upload(args) = cli.command else {
                panic!("expected upload");
            };
            args
        };

        assert!(parse(&["uploader", "upload", "--form", "summary"]).restores_draft());
        assert!(!parse(&["uploader", "upload", "--form", "summary", "a.pdf"]).restores_draft());
        assert!(!parse(&["uploader", "upload", "--url", "https://example.org"]).restores_draft());
        assert!(!parse(&["uploader", "upload", "--summary", "<p>x</p>"]).restores_draft());
    }

    #[test]
    fn log_destination_follows_flags() {
        assert_eq!(log_target(0, false), (LogDestination::File, LevelFilter::Info));
        assert_eq!(log_target(1, false), (LogDestination::Both, LevelFilter::Info));
        assert_eq!(log_target(2, false), (LogDestination::Both, LevelFilter::Debug));
        assert_eq!(log_target(0, true), (LogDestination::Terminal, LevelFilter::Info));

        let cli = Cli::try_parse_from(["uploader", "--no-log-file", "claim", "3"]).unwrap();
        assert!(cli.no_log_file);
    }

    #[test]
    fn fields_need_a_name() {
        assert_eq!(
            parse_field("a=b=c"),
            Ok(("a".to_string(), "b=c".to_string()))
        );
        assert!(parse_field("=x").is_err());
        assert!(parse_field("novalue").is_err());
    }

    #[test]
    fn selected_file_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"12345").unwrap();

        let file = selected_file(&path).unwrap();
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.size_bytes, 5);
        assert!(selected_file(dir.path()).is_err());
    }
}
