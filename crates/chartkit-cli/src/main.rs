//! chartkit CLI - render Helm charts and keep a chart repository consistent

use chartkit_helm::{ENV_HELM_BIN, ENV_SKIP_NETWORK};
use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;
mod git;

use commands::Context;
use error::Result;

#[derive(Parser)]
#[command(name = "chartkit")]
#[command(version)]
#[command(about = "Render Helm charts and run chart repository checks", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Repository root holding charts, fixtures and chartkit.yaml
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Helm binary to use instead of `helm` on PATH
    #[arg(long, global = true, env = ENV_HELM_BIN)]
    helm_bin: Option<PathBuf>,

    /// Skip repository registration and dependency builds
    #[arg(
        long,
        global = true,
        env = ENV_SKIP_NETWORK,
        value_parser = BoolishValueParser::new()
    )]
    skip_helm_network: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a chart with `helm template`
    Render {
        /// Release name
        release: String,

        /// Chart directory (relative to --root)
        chart: PathBuf,

        /// Values file(s), applied in order
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set values on command line (key=value), applied in order
        #[arg(long = "set")]
        set: Vec<String>,

        /// Target namespace
        #[arg(short, long)]
        namespace: Option<String>,

        /// Only render the given template(s)
        #[arg(short = 's', long)]
        show_only: Vec<String>,

        /// Extra arguments passed to `helm template` verbatim
        #[arg(last = true)]
        extra: Vec<String>,
    },

    /// Build every chart's dependencies once, before parallel test runs
    Prefetch,

    /// Repository consistency checks
    Check {
        #[command(subcommand)]
        check: CheckCommands,
    },

    /// Re-render every values fixture into its golden file
    RegenerateGoldens,
}

#[derive(Subcommand)]
enum CheckCommands {
    /// Charts changed since a git ref must have a higher version
    VersionBump {
        /// Git ref to diff against (default: baseRef from chartkit.yaml)
        base_ref: Option<String>,

        /// Chart root to scan; repeat for several (default: chartRoots)
        #[arg(long = "chart-root")]
        chart_roots: Vec<PathBuf>,
    },

    /// Every chart has fixtures and every values fixture has a golden file
    Fixtures,

    /// Every values fixture renders exactly to its golden file
    Goldens,

    /// Every chart's linter values file links to its minimal values fixture
    LinterSymlinks,

    /// The release workflow offers exactly the charts in the repository
    ReleaseWorkflow,
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let ctx = Context::open(&cli.root, cli.helm_bin, cli.skip_helm_network)?;

    match cli.command {
        Commands::Render {
            release,
            chart,
            values,
            set,
            namespace,
            show_only,
            extra,
        } => commands::render::run(
            &ctx,
            &release,
            &chart,
            &values,
            &set,
            namespace.as_deref(),
            &show_only,
            &extra,
        ),

        Commands::Prefetch => commands::prefetch::run(&ctx),

        Commands::Check { check } => match check {
            CheckCommands::VersionBump {
                base_ref,
                chart_roots,
            } => commands::version_bump::run(&ctx, base_ref.as_deref(), &chart_roots),
            CheckCommands::Fixtures => commands::fixtures::run(&ctx),
            CheckCommands::Goldens => commands::goldens::run_check(&ctx),
            CheckCommands::LinterSymlinks => commands::linter_symlinks::run(&ctx),
            CheckCommands::ReleaseWorkflow => commands::release_workflow::run(&ctx),
        },

        Commands::RegenerateGoldens => commands::goldens::run(&ctx),
    }
}

fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
