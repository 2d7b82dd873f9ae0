#![forbid(unsafe_code)]

mod cmd;
mod output;
mod tui;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::CmdContext;
use output::{CliError, OutputMode};
use snaplist_core::config;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "snaplist: browse and manage report and test-suite snapshots",
    long_about = None
)]
struct Cli {
    /// Emit JSON output (alias for --format json).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Directory holding `<project>/reports.json` and `<project>/test-suites.json`.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "List snapshots",
        long_about = "List a project's snapshots, filtered by tags and metadata and ordered by timestamp.",
        after_help = "EXAMPLES:\n    # Newest reports first\n    snaplist list p1\n\n    # Test suites tagged prod and gpu whose metadata mentions nightly\n    snaplist list p1 --kind test-suites -t prod -t gpu -s nightly\n\n    # Seed filters from a shared link\n    snaplist list p1 --query 'tags=prod%2Cgpu&metadata-query=nightly'\n\n    # Emit machine-readable output\n    snaplist list p1 --format json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Print the tag vocabulary",
        long_about = "Print every tag used in a collection, in first-seen order.",
        after_help = "EXAMPLES:\n    # Tags used by reports\n    snaplist tags p1\n\n    # Tags used by test suites\n    snaplist tags p1 --kind test-suites"
    )]
    Tags(cmd::tags::TagsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Open the interactive list",
        long_about = "Open a full-screen list with live filtering, sorting, refresh and delete. Prints the final location on exit.",
        after_help = "EXAMPLES:\n    # Browse reports\n    snaplist tui p1\n\n    # Start filtered to one tag\n    snaplist tui p1 -t prod"
    )]
    Tui(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Mutate",
        about = "Delete a snapshot",
        long_about = "Delete one snapshot after confirmation.",
        after_help = "EXAMPLES:\n    # Ask before deleting\n    snaplist delete p1 s1\n\n    # Skip the prompt\n    snaplist delete p1 s1 --yes"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Mutate",
        about = "Reload a collection",
        long_about = "Re-read a collection from disk through the submission path.",
        after_help = "EXAMPLES:\n    # Reload reports\n    snaplist reload p1"
    )]
    Reload(cmd::reload::ReloadArgs),

    #[command(
        next_help_heading = "Settings",
        about = "Show or set display preferences",
        after_help = "EXAMPLES:\n    # Show preferences\n    snaplist prefs\n\n    # Collapse metadata in list output\n    snaplist prefs --collapse-metadata true"
    )]
    Prefs(cmd::prefs::PrefsArgs),

    #[command(
        next_help_heading = "Settings",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    snaplist completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SNAPLIST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "snaplist=debug,info"
        } else {
            "snaplist=info,warn"
        })
    });

    let format = env::var("SNAPLIST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, ctx: &CmdContext) -> anyhow::Result<()> {
    match cli.command {
        Commands::List(ref args) => cmd::list::run_list(args, ctx),
        Commands::Tags(ref args) => cmd::tags::run_tags(args, ctx),
        Commands::Tui(ref args) => tui::list::run_list_tui(ctx, &args.target, &args.filters),
        Commands::Delete(ref args) => cmd::delete::run_delete(args, ctx),
        Commands::Reload(ref args) => cmd::reload::run_reload(args, ctx),
        Commands::Prefs(ref args) => cmd::prefs::run_prefs(args, ctx),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let early_output = output::resolve_output_mode(cli.format, cli.json, None);

    let effective = match config::resolve_config(cli.data_dir.clone()) {
        Ok(effective) => effective,
        Err(err) => {
            output::render_error(early_output, &CliError::from_anyhow(&err))?;
            std::process::exit(1);
        }
    };
    let ctx = CmdContext {
        data_dir: effective.data_dir,
        output: output::resolve_output_mode(
            cli.format,
            cli.json,
            effective.user.output.as_deref(),
        ),
        default_sort: effective.user.list.default_sort,
    };
    debug!(data_dir = %ctx.data_dir.display(), output = ?ctx.output, "starting");

    if let Err(err) = run(cli, &ctx) {
        output::render_error(ctx.output, &CliError::from_anyhow(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
