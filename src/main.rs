//! Flowlens CLI entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowlens_cli::config::{resolve_starting_url, AppsRegistry};
use flowlens_cli::demo::{demo_driver, demo_provider, demo_request};
use flowlens_cli::{
    BrowserDriver, FsDatasetRecorder, HttpVisionProvider, RemoteDriver, RemoteDriverConfig,
    VisionServiceConfig, WorkflowConfig, WorkflowOrchestrator, WorkflowRequest, WorkflowRun,
};
use workflow_core::DatasetSink;

#[derive(Parser)]
#[command(name = "flowlens", version, about = "Vision-driven browser workflow capture")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a workflow for a task against a live driver and decision service.
    Run(RunArgs),
    /// Run the built-in offline scenario against the stub driver.
    Demo(DemoArgs),
    /// List the apps known to the registry.
    Apps(AppsArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// Application name, resolved through the apps registry.
    #[arg(long)]
    app: String,

    /// Task description to accomplish.
    #[arg(long)]
    task: String,

    /// Starting URL; overrides the registry.
    #[arg(long)]
    url: Option<String>,

    /// Iteration budget for the run.
    #[arg(long, default_value_t = 50)]
    max_iterations: u32,

    /// Directory the dataset is written under.
    #[arg(long, default_value = "dataset")]
    dataset_root: PathBuf,

    /// Apps registry file.
    #[arg(long, default_value = "apps.yaml")]
    apps_config: PathBuf,

    /// Browser driver service URL.
    #[arg(long, env = "FLOWLENS_DRIVER_URL", default_value = "http://127.0.0.1:9515")]
    driver_url: String,

    /// Decision service endpoint.
    #[arg(long, env = "FLOWLENS_DECISION_ENDPOINT")]
    decision_endpoint: String,

    /// Decision service bearer token.
    #[arg(long, env = "FLOWLENS_API_KEY")]
    api_key: Option<String>,

    /// Model identifier forwarded to the decision service.
    #[arg(long, env = "FLOWLENS_MODEL")]
    model: Option<String>,
}

#[derive(Parser)]
struct DemoArgs {
    /// Directory the dataset is written under.
    #[arg(long, default_value = "dataset")]
    dataset_root: PathBuf,
}

#[derive(Parser)]
struct AppsArgs {
    /// Apps registry file.
    #[arg(long, default_value = "apps.yaml")]
    apps_config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Demo(args) => demo_command(args).await,
        Commands::Apps(args) => apps_command(args),
    }
}

async fn run_command(args: RunArgs) -> Result<()> {
    let registry = AppsRegistry::load(&args.apps_config)?;
    let starting_url = resolve_starting_url(args.url.as_deref(), &args.app, &registry)?;

    let driver = Arc::new(RemoteDriver::new(RemoteDriverConfig {
        base_url: args.driver_url.clone(),
        request_timeout: Duration::from_secs(30),
    })?);
    let provider = HttpVisionProvider::new(VisionServiceConfig {
        endpoint: args.decision_endpoint.clone(),
        api_key: args.api_key.clone(),
        model: args.model.clone(),
        request_timeout: Duration::from_secs(60),
    })?;
    let recorder = Arc::new(FsDatasetRecorder::new(
        &args.dataset_root,
        &args.app,
        &args.task,
    ));

    let cfg = WorkflowConfig::default().max_iterations(args.max_iterations);
    let orchestrator = WorkflowOrchestrator::new(
        driver as Arc<dyn BrowserDriver>,
        provider,
        recorder.clone() as Arc<dyn DatasetSink>,
        cfg,
    );

    // Ctrl-C cancels between iterations; captured states are preserved.
    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling after the current iteration");
            cancel.cancel();
        }
    });

    let request = WorkflowRequest {
        app: args.app,
        task: args.task,
        starting_url,
    };
    let run = orchestrator.run(request).await;
    print_summary(&run, Some(recorder.run_dir().display().to_string()));
    exit_for(&run)
}

async fn demo_command(args: DemoArgs) -> Result<()> {
    let request = demo_request();
    let recorder = Arc::new(FsDatasetRecorder::new(
        &args.dataset_root,
        &request.app,
        &request.task,
    ));
    let orchestrator = WorkflowOrchestrator::new(
        Arc::new(demo_driver()) as Arc<dyn BrowserDriver>,
        demo_provider(),
        recorder.clone() as Arc<dyn DatasetSink>,
        WorkflowConfig::default(),
    );

    let run = orchestrator.run(request).await;
    print_summary(&run, Some(recorder.run_dir().display().to_string()));
    exit_for(&run)
}

fn apps_command(args: AppsArgs) -> Result<()> {
    let registry = AppsRegistry::load(&args.apps_config)?;
    let names = registry.names();
    if names.is_empty() {
        println!("no apps configured in {}", args.apps_config.display());
        return Ok(());
    }
    for name in names {
        match registry.base_url(name) {
            Some(url) => println!("{name}\t{url}"),
            None => println!("{name}"),
        }
    }
    Ok(())
}

fn print_summary(run: &WorkflowRun, output_dir: Option<String>) {
    println!("status: {}", run.status.as_str());
    println!("goal achieved: {}", run.goal_achieved);
    println!("states captured: {}", run.state_count());
    println!("duration: {:.2}s", run.duration.as_secs_f64());
    if let Some(error) = &run.error {
        println!("error: {error}");
    }
    if let Some(dir) = output_dir {
        println!("output: {dir}");
    }
}

fn exit_for(run: &WorkflowRun) -> Result<()> {
    if run.status == flowlens_cli::TerminalStatus::Error {
        std::process::exit(1);
    }
    Ok(())
}
