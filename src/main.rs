//! CLI Entry Point for rust-scope
//!
//! Drives the accessor layer against the simulated control core described in
//! the configuration file.
//!
//! # Usage
//!
//! ```bash
//! rust_scope devices
//! rust_scope resolve focus
//! rust_scope position move -- -2.5
//! rust_scope backlash set 2.25
//! rust_scope props Camera --json
//! rust_scope wait --timeout-ms 500
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_scope::config::{AppConfig, DEFAULT_CONFIG_PATH};
use rust_scope::{logging, Microscope};
use scope_core::{DeviceRole, XyPosition, ZStage};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rust_scope")]
#[command(about = "Fault-tolerant microscope device access", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List loaded devices and the roles they hold
    Devices,

    /// Resolve a role (focus, xy_stage, camera, ...) to a device name
    Resolve {
        /// Role to resolve
        role: DeviceRole,
    },

    /// Focus stage position
    Position {
        #[command(subcommand)]
        action: PositionAction,
    },

    /// XY stage position
    Xy {
        #[command(subcommand)]
        action: XyAction,
    },

    /// Focus stage backlash compensation
    Backlash {
        #[command(subcommand)]
        action: BacklashAction,
    },

    /// Describe every property of a device
    Props {
        /// Device label
        device: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Wait for the focus stage to become idle
    Wait {
        /// Upper bound in milliseconds (defaults to the configured wait timeout)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[derive(Subcommand)]
enum PositionAction {
    /// Print the current position (µm)
    Get,
    /// Move to an absolute position (µm) and wait
    Set {
        #[arg(allow_negative_numbers = true)]
        position: f64,
    },
    /// Move by a relative distance (µm) and wait
    Move {
        #[arg(allow_negative_numbers = true)]
        delta: f64,
    },
}

#[derive(Subcommand)]
enum XyAction {
    /// Print the current position (µm)
    Get,
    /// Move to an absolute position (µm) and wait
    Set {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
}

#[derive(Subcommand)]
enum BacklashAction {
    /// Print the backlash compensation (µm)
    Get,
    /// Set the backlash compensation (µm)
    Set { value: f32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    logging::init_from_config(&config).map_err(anyhow::Error::msg)?;

    let scope = Microscope::from_config(&config).map_err(anyhow::Error::msg)?;
    let wait = scope.accessor_config().wait_timeout();

    match cli.command {
        Commands::Devices => list_devices(&scope).await,
        Commands::Resolve { role } => {
            let name = scope.resolver().resolve(role).await?;
            println!("{}", name);
            Ok(())
        }
        Commands::Position { action } => position(&scope, action, wait).await,
        Commands::Xy { action } => xy(&scope, action, wait).await,
        Commands::Backlash { action } => backlash(&scope, action).await,
        Commands::Props { device, json } => props(&scope, &device, json).await,
        Commands::Wait { timeout_ms } => {
            let stage = focus(&scope).await?;
            let timeout = timeout_ms.map(Duration::from_millis).unwrap_or(wait);
            stage.wait_for_device(timeout).await?;
            println!("{} idle", stage.device_name()?);
            Ok(())
        }
    }
}

async fn focus(scope: &Microscope) -> Result<ZStage> {
    let stage = scope.focus();
    stage.find_device().await?;
    Ok(stage)
}

async fn list_devices(scope: &Microscope) -> Result<()> {
    for (label, roles) in scope.inventory().await? {
        let roles: Vec<&str> = roles.iter().map(DeviceRole::label).collect();
        if roles.is_empty() {
            println!("{}", label);
        } else {
            println!("{:<16} [{}]", label, roles.join(", "));
        }
    }
    Ok(())
}

async fn position(scope: &Microscope, action: PositionAction, wait: Duration) -> Result<()> {
    let stage = focus(scope).await?;
    match action {
        PositionAction::Get => {}
        PositionAction::Set { position } => {
            stage.set_position(position).await?;
            stage.wait_for_device(wait).await?;
        }
        PositionAction::Move { delta } => {
            stage.set_relative_position(delta).await?;
            stage.wait_for_device(wait).await?;
        }
    }
    println!("{:.3}", stage.get_position().await?);
    Ok(())
}

async fn xy(scope: &Microscope, action: XyAction, wait: Duration) -> Result<()> {
    let stage = scope.xy_stage();
    stage.find_device().await?;
    if let XyAction::Set { x, y } = action {
        stage.set_xy_position(XyPosition::new(x, y)).await?;
        stage.wait_for_device(wait).await?;
    }
    println!("{}", stage.get_xy_position().await?);
    Ok(())
}

async fn backlash(scope: &Microscope, action: BacklashAction) -> Result<()> {
    let stage = focus(scope).await?;
    if let BacklashAction::Set { value } = action {
        stage.set_backlash(value).await?;
    }
    println!("{}", stage.get_backlash().await?);
    Ok(())
}

async fn props(scope: &Microscope, device: &str, json: bool) -> Result<()> {
    let described = scope.describe_device(device).await?;
    if json {
        let rows: Vec<serde_json::Value> = described
            .iter()
            .map(|(info, value)| serde_json::json!({ "value": value, "info": info }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (info, value) in described {
        let mut notes = Vec::new();
        if info.read_only {
            notes.push("read-only".to_string());
        }
        if !info.allowed_values.is_empty() {
            notes.push(format!("one of {}", info.allowed_values.join("|")));
        }
        if let Some((low, high)) = info.limits {
            notes.push(format!("[{}, {}]", low, high));
        }
        println!(
            "{:<20} {:<12} {:?} {}",
            info.name,
            value,
            info.kind,
            notes.join(" ")
        );
    }
    Ok(())
}
