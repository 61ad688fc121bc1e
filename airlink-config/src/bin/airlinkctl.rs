use std::path::PathBuf;
use std::sync::Arc;

use airlink_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use airlink_core::driver::loopback::LoopbackDriver;
use airlink_core::{BridgeConfig, CallbackTable, EventHub, Outcome, WifiBridge};
use airlink_model::{ApScanInfo, AuthType, CryptoType, LinkStatus, MacAddress, WifiInfo};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "airlinkctl", about = "Inspect airlink configuration and exercise the bridge")]
struct Cli {
    /// Explicit config file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved configuration as TOML
    Config,
    /// Run a scan against the loopback driver and print the results
    Scan {
        /// Number of synthetic access points the loopback radio reports
        #[arg(long, default_value_t = 5)]
        aps: usize,
    },
    /// Print link information reported by the loopback driver
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let load = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config,
        env_file: cli.env_file,
    })
    .load()
    .context("failed to load configuration")?;
    report_warnings(&load);

    match cli.command {
        Command::Config => {
            let rendered = toml::to_string_pretty(&load.config)
                .context("failed to render configuration")?;
            println!("# source: {:?}", load.source);
            print!("{rendered}");
        }
        Command::Scan { aps } => run_scan(load.config, aps).await?,
        Command::Info => run_info(load.config).await?,
    }
    Ok(())
}

fn report_warnings(load: &ConfigLoad) {
    for warning in &load.warnings.items {
        match &warning.hint {
            Some(hint) => tracing::warn!(hint = %hint, "{}", warning.message),
            None => tracing::warn!("{}", warning.message),
        }
    }
}

fn loopback_bridge(config: BridgeConfig) -> (WifiBridge, LoopbackDriver) {
    let hub = EventHub::new();
    let driver = LoopbackDriver::new(hub.clone());
    let bridge = WifiBridge::new(Arc::new(driver.clone()), hub, config);
    (bridge, driver)
}

fn synthetic_access_points(count: usize) -> Vec<ApScanInfo> {
    (0..count)
        .map(|i| {
            let octet = (i % 256) as u8;
            ApScanInfo::new(
                format!("airlink-{i:02}"),
                MacAddress::new([0x02, 0, 0, 0, 0, octet]),
                (i % 13) as u8 + 1,
            )
            .with_rssi(-40 - (i as i16 % 50))
            .with_security(AuthType::Wpa2Psk, CryptoType::Aes)
        })
        .collect()
}

async fn run_scan(config: BridgeConfig, aps: usize) -> Result<()> {
    let wait = config.handshake_timeout();
    let (bridge, driver) = loopback_bridge(config);
    driver.script_scan(synthetic_access_points(aps));

    let (tx, mut rx) = mpsc::unbounded_channel();
    bridge.register_callbacks(CallbackTable::new().on_scan_done(move |outcome, results| {
        let entries = results.map(|list| (list.iter().cloned().collect::<Vec<_>>(), list.is_truncated()));
        let _ = tx.send((outcome, entries));
    }))?;

    bridge.init().await?;
    bridge.scan().await?;
    let delivered = tokio::time::timeout(wait, rx.recv()).await;
    bridge.deinit().await?;

    let (outcome, entries) = delivered
        .context("scan did not complete in time")?
        .ok_or_else(|| anyhow!("scan handler dropped"))?;
    match (outcome, entries) {
        (Outcome::Success, Some((entries, truncated))) => {
            for ap in &entries {
                println!("{ap}");
            }
            if truncated {
                println!("(truncated at {} entries)", entries.len());
            }
        }
        _ => println!("scan failed"),
    }
    Ok(())
}

async fn run_info(config: BridgeConfig) -> Result<()> {
    let (bridge, driver) = loopback_bridge(config);
    driver.set_info(WifiInfo {
        ip4_address: "192.168.4.1".parse()?,
        mac_address: "02:00:00:00:00:01".parse()?,
        rssi: -38,
        status: LinkStatus::SoftAp,
    });

    bridge.init().await?;
    let info = bridge.get_info().await;
    bridge.deinit().await?;
    let info = info?;

    println!("status: {}", info.status);
    println!("ip4:    {}", info.ip4_address);
    println!("mac:    {}", info.mac_address);
    println!("rssi:   {} dBm", info.rssi);
    Ok(())
}
