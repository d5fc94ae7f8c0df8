use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use verbena_runner::{ContainerBackend, ContainerRuntime, RunContext, RunOptions, WorkflowRunner};

mod discover;
mod options;

use options::RunRequest;

/// Verbena - a declarative CI-style workflow runner
#[derive(Parser)]
#[command(name = "verbena")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow or action
  Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
  /// A .workflow file or the name of an action to run
  target: Option<String>,

  /// The action to run if execution fails
  #[arg(long)]
  on_failure: Option<String>,

  /// Run the action with all its dependencies
  #[arg(long)]
  with_dependencies: bool,

  /// Skip the given actions or workflow files (repeatable)
  #[arg(long)]
  skip: Vec<String>,

  /// Run every .workflow file found recursively from the current path
  #[arg(long)]
  recursive: bool,

  /// Path to the workspace folder
  #[arg(long, default_value = ".")]
  workspace: PathBuf,

  /// Reuse containers between executions
  #[arg(long)]
  reuse: bool,

  /// Resolve and stage the workflow without executing anything
  #[arg(long)]
  dry_run: bool,

  /// Execute the actions in a stage in parallel
  #[arg(long)]
  parallel: bool,

  /// Do not print output generated by actions
  #[arg(long)]
  quiet: bool,

  /// Generate detailed messages of what verbena does (overrides --quiet)
  #[arg(long)]
  debug: bool,

  /// Skip pulling container images
  #[arg(long)]
  skip_pull: bool,

  /// Skip cloning remote action repositories
  #[arg(long)]
  skip_clone: bool,

  /// The container runtime to execute the workflow with
  #[arg(long, value_enum, default_value_t = Runtime::Docker)]
  runtime: Runtime,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Runtime {
  Docker,
  Singularity,
}

impl From<Runtime> for ContainerRuntime {
  fn from(runtime: Runtime) -> Self {
    match runtime {
      Runtime::Docker => ContainerRuntime::Docker,
      Runtime::Singularity => ContainerRuntime::Singularity,
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  match cli.command {
    Commands::Run(args) => run(args),
  }
}

fn run(args: RunArgs) -> Result<()> {
  init_tracing(&args);

  let base = std::env::current_dir().context("failed to determine the current directory")?;
  let plan = options::resolve(
    &RunRequest {
      target: args.target.as_deref(),
      skip: &args.skip,
      with_dependencies: args.with_dependencies,
      recursive: args.recursive,
    },
    &base,
  )?;

  if plan.files.is_empty() {
    bail!("no workflows to execute");
  }

  let ctx = RunContext {
    workspace: args.workspace,
    reuse: args.reuse,
    dry_run: args.dry_run,
    parallel: args.parallel,
    quiet: args.quiet,
    skip_pull: args.skip_pull,
    skip_clone: args.skip_clone,
    runtime: args.runtime.into(),
  };
  let opts = RunOptions {
    action: plan.action,
    skip: plan.skip_actions,
    with_dependencies: args.with_dependencies,
    on_failure: args.on_failure,
  };

  let runner = WorkflowRunner::new(ContainerBackend::new());
  for wfile in &plan.files {
    info!(file = %wfile.display(), "found and running workflow");
    runner
      .run_file(wfile, &opts, &ctx)
      .with_context(|| format!("workflow '{}' failed", wfile.display()))?;
  }
  Ok(())
}

fn init_tracing(args: &RunArgs) {
  let level = if args.debug {
    "debug"
  } else if args.quiet {
    "warn"
  } else {
    "info"
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
  tracing_subscriber::fmt().with_env_filter(filter).init();
}
