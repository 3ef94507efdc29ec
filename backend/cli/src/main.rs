mod config;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use snaplens_capture::SyntheticCapturer;
use snaplens_core::{
    Component, ContextId, EntitlementChecker, InferenceProvider, OrchestratorMessage, Point,
    PromptVariant, SnapBus, SnapshotSource, SurfaceRegistry, TextExtractor,
};
use snaplens_extraction::{MockExtractor, VisionExtractor};
use snaplens_gate::{
    spawn_revalidation, AccessGate, GateComponent, HttpEntitlementChecker,
    StaticEntitlementChecker,
};
use snaplens_inference::providers::{MockProvider, OpenAiProvider};
use snaplens_inference::InferenceClient;
use snaplens_logging::init_logger;
use snaplens_orchestrator::HostOrchestrator;
use snaplens_selector::{LogOverlay, PointerButton, PointerEvent, SelectorHost};
use snaplens_store::StateStore;
use snaplens_surfaces::{PageSurface, PanelSurface};

use config::Config;

/// Synthetic page geometry used by the host's built-in capture source.
const PAGE_WIDTH: u32 = 1280;
const PAGE_HEIGHT: u32 = 800;
const DEVICE_PIXEL_RATIO: f64 = 2.0;

#[derive(Parser)]
#[command(name = "snaplens")]
#[command(about = "SnapLens: screen-region capture to answer pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the SnapLens host runtime
    Run,
    /// Drive one simulated selection through the pipeline and print the answer
    Demo,
    /// Show the persisted state
    Status,
    /// Link a subscription and verify it with the entitlement service
    Activate {
        /// Subscription identifier to link
        code: String,
    },
    /// Unlink the current subscription
    Deactivate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_logger(config.log_dir.as_deref(), &config.log_level);

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_host(config).await?,
        Commands::Demo => run_demo(config).await?,
        Commands::Status => {
            let store = StateStore::open(&config.state_dir).await?;
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        }
        Commands::Activate { code } => {
            let store = Arc::new(StateStore::open(&config.state_dir).await?);
            let gate = AccessGate::new(store, entitlement_checker(&config));
            match gate.activate_subscription(&code).await {
                Ok(()) => println!("Subscription {} activated", code),
                Err(e) => {
                    println!("Activation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Deactivate => {
            let store = Arc::new(StateStore::open(&config.state_dir).await?);
            let gate = AccessGate::new(store, entitlement_checker(&config));
            gate.deactivate_subscription().await?;
            println!("Subscription deactivated");
        }
    }

    Ok(())
}

fn entitlement_checker(config: &Config) -> Arc<dyn EntitlementChecker> {
    match &config.entitlement_url {
        Some(url) => {
            info!(url = %url, "Using remote entitlement service");
            Arc::new(HttpEntitlementChecker::new(url))
        }
        None => {
            warn!("No entitlement service configured; accepting activations locally");
            Arc::new(StaticEntitlementChecker::new(true))
        }
    }
}

/// Everything the commands need after the components are spawned.
struct Runtime {
    gate: Arc<AccessGate>,
    orchestrator_tx: mpsc::Sender<OrchestratorMessage>,
    page_ctx: ContextId,
    pointer_tx: mpsc::Sender<PointerEvent>,
    page_response: Arc<Mutex<Option<(String, PromptVariant)>>>,
}

/// Wire the bus, components, and one page context, then spawn their tasks.
async fn build_runtime(config: &Config, checker: Arc<dyn EntitlementChecker>) -> Result<Runtime> {
    let store = Arc::new(StateStore::open(&config.state_dir).await?);
    let gate = Arc::new(AccessGate::new(Arc::clone(&store), checker));

    let mut bus = SnapBus::new();
    let surfaces = Arc::new(SurfaceRegistry::new());

    let (provider, extractor): (Arc<dyn InferenceProvider>, Arc<dyn TextExtractor>) =
        match &config.openai_api_key {
            Some(key) => (
                Arc::new(OpenAiProvider::new(key)),
                Arc::new(VisionExtractor::new(key)),
            ),
            None => {
                warn!("OPENAI_API_KEY not set; using canned extraction and inference");
                (
                    Arc::new(MockProvider::new().with_response("x = 2, y = 0")),
                    Arc::new(MockExtractor::new("Solve for x and y: 7x - y = 14")),
                )
            }
        };

    let snapshots: Arc<dyn SnapshotSource> =
        Arc::new(SyntheticCapturer::new(PAGE_WIDTH, PAGE_HEIGHT, DEVICE_PIXEL_RATIO));

    let orchestrator = HostOrchestrator::new(
        Arc::clone(&gate),
        snapshots,
        extractor,
        InferenceClient::new(provider),
        Arc::clone(&store),
        Arc::clone(&surfaces),
        bus.panel_tx.clone(),
    );

    let panel = PanelSurface::new(Arc::clone(&store));

    // One synthetic page context; real embedders would register one per page.
    let page_ctx = ContextId::new();
    let (page_tx, page_rx) = mpsc::channel(64);
    let (pointer_tx, pointer_rx) = mpsc::channel(64);
    surfaces.register(page_ctx, page_tx);

    let host = SelectorHost::new(page_ctx, DEVICE_PIXEL_RATIO, bus.orchestrator_tx.clone(), || {
        Box::new(LogOverlay::new())
    });
    let page = PageSurface::new(page_ctx, host, pointer_rx);
    let page_response = page.last_response();

    let gate_component = GateComponent::new(Arc::clone(&gate));

    // Take receivers and spawn component tasks
    let orchestrator_rx = bus.take_orchestrator_rx().expect("orchestrator rx already taken");
    let panel_rx = bus.take_panel_rx().expect("panel rx already taken");
    let gate_rx = bus.take_gate_rx().expect("gate rx already taken");

    tokio::spawn(async move {
        if let Err(e) = orchestrator.start(orchestrator_rx).await {
            error!(error = %e, "Orchestrator task failed");
        }
    });
    tokio::spawn(async move {
        if let Err(e) = panel.start(panel_rx).await {
            error!(error = %e, "Panel task failed");
        }
    });
    tokio::spawn(async move {
        if let Err(e) = gate_component.start(gate_rx).await {
            error!(error = %e, "Gate task failed");
        }
    });
    tokio::spawn(async move {
        if let Err(e) = page.start(page_rx).await {
            error!(error = %e, "Page surface task failed");
        }
    });

    spawn_revalidation(
        Arc::clone(&gate),
        Duration::from_secs(config.revalidate_secs),
    );

    info!("All components started");

    Ok(Runtime {
        gate,
        orchestrator_tx: bus.orchestrator_tx.clone(),
        page_ctx,
        pointer_tx,
        page_response,
    })
}

async fn run_host(config: Config) -> Result<()> {
    info!(
        state_dir = %config.state_dir.display(),
        revalidate_secs = config.revalidate_secs,
        "Starting SnapLens host"
    );

    let checker = entitlement_checker(&config);
    let _runtime = build_runtime(&config, checker).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    Ok(())
}

/// One scripted drag: activate, select a region, wait for the broadcast.
async fn run_demo(config: Config) -> Result<()> {
    // The demo always runs: entitlement is accepted locally.
    let runtime = build_runtime(&config, Arc::new(StaticEntitlementChecker::new(true))).await?;
    runtime.gate.activate_subscription("demo-seat").await?;

    let (reply_tx, reply_rx) = oneshot::channel();
    runtime
        .orchestrator_tx
        .send(OrchestratorMessage::TriggerSelection {
            context_id: runtime.page_ctx,
            stealth_mode: false,
            reply: reply_tx,
        })
        .await?;
    if !reply_rx.await? {
        anyhow::bail!("selection trigger was not delivered to the page");
    }

    runtime
        .pointer_tx
        .send(PointerEvent::Down {
            button: PointerButton::Primary,
            at: Point::new(120.0, 180.0),
        })
        .await?;
    runtime
        .pointer_tx
        .send(PointerEvent::Move {
            at: Point::new(360.0, 250.0),
        })
        .await?;
    runtime
        .pointer_tx
        .send(PointerEvent::Up {
            at: Point::new(520.0, 330.0),
        })
        .await?;

    for _ in 0..200 {
        if let Some((response, variant)) = runtime.page_response.lock().unwrap().clone() {
            println!("[{}] {}", variant, response);
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    anyhow::bail!("no answer arrived within 10s")
}
