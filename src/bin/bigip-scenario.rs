// Copyright (c) 2025 - Cowboy AI, Inc.
//! BIG-IP Scenario Runner
//!
//! Runs one acceptance scenario from a fixture file: the scenario step, then
//! teardown, then a check that nothing survived. Prints the report as JSON
//! and exits non-zero with the failing assertion on error.
//!
//! Run with:
//!   cargo run --bin bigip-scenario -- create fixtures/selfip.json --simulate
//!   cargo run --bin bigip-scenario --features icontrol -- import fixtures/selfip.json
//!
//! Against a live device set BIGIP_HOST, BIGIP_USER and BIGIP_PASSWORD
//! (see `bigip_network::config`).

use anyhow::{Context, Result};
use bigip_network::{
    DeviceClient, DeviceSession, HarnessConfig, InMemoryDevice, RetryPolicy, ScenarioKind,
    ScenarioReport, TestHarness,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    Create,
    Import,
    Destroy,
}

impl From<Scenario> for ScenarioKind {
    fn from(scenario: Scenario) -> Self {
        match scenario {
            Scenario::Create => ScenarioKind::Create,
            Scenario::Import => ScenarioKind::Import,
            Scenario::Destroy => ScenarioKind::Destroy,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bigip-scenario", about = "Run a BIG-IP self IP / VLAN acceptance scenario")]
struct Cli {
    /// Scenario to run
    #[arg(value_enum)]
    scenario: Scenario,

    /// Fixture file declaring the resources
    fixture: PathBuf,

    /// Run against the in-process device simulator
    #[arg(long)]
    simulate: bool,

    /// Partition substituted for ${partition} in the fixture
    #[arg(long, env = "BIGIP_PARTITION", default_value = "Common")]
    partition: String,

    /// Retry transient device failures with exponential backoff
    #[arg(long)]
    retry: bool,

    /// Per-call timeout in seconds
    #[arg(long, env = "BIGIP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

async fn run_with<C: DeviceClient>(client: Arc<C>, cli: &Cli, template: &str) -> Result<ScenarioReport> {
    let mut config = HarnessConfig {
        partition: cli.partition.clone(),
        ..HarnessConfig::default()
    };
    if cli.retry {
        config = config.with_retry(RetryPolicy::default());
    }

    let session = DeviceSession::new(client).with_timeout(Duration::from_secs(cli.timeout_secs));
    info!("Session {} (timeout {}s)", session.id(), cli.timeout_secs);

    let harness = TestHarness::new(session, config);
    let fixture = harness
        .load_fixture(template)
        .with_context(|| format!("Failed to load fixture {}", cli.fixture.display()))?;

    let report = harness
        .run(cli.scenario.into(), &fixture)
        .await
        .with_context(|| format!("{} scenario failed", ScenarioKind::from(cli.scenario)))?;
    Ok(report)
}

#[cfg(feature = "icontrol")]
async fn run_live(cli: &Cli, template: &str) -> Result<ScenarioReport> {
    use bigip_network::{DeviceConfig, IControlClient};

    let mut device = DeviceConfig::from_env().context("Device configuration incomplete")?;
    device.timeout_secs = cli.timeout_secs;
    info!("Device: {} as {}", device.base_url(), device.username);

    let client = IControlClient::new(device).context("Failed to create iControl client")?;
    run_with(Arc::new(client), cli, template).await
}

#[cfg(not(feature = "icontrol"))]
async fn run_live(_cli: &Cli, _template: &str) -> Result<ScenarioReport> {
    anyhow::bail!("built without the icontrol feature; pass --simulate or rebuild with --features icontrol")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let template = std::fs::read_to_string(&cli.fixture)
        .with_context(|| format!("Failed to read {}", cli.fixture.display()))?;

    let report = if cli.simulate {
        info!("Running against the device simulator");
        run_with(Arc::new(InMemoryDevice::new()), &cli, &template).await?
    } else {
        run_live(&cli, &template).await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
