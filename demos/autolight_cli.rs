//! CLI application for driving a Hue bridge's automatic groups.
//!
//! Loads lights and groups, applies one change and waits until the bridge
//! acknowledged it.
//!
//! Run with: cargo run --example autolight_cli -- --help

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use hue_autolight::{Config, GroupKind, HttpBridge, ReconciliationEngine, Transition};

#[derive(Parser)]
#[command(name = "autolight-cli")]
#[command(about = "Manage a Hue bridge's automatic brightness and temperature groups", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bridge host, overrides the configuration file
    #[arg(long, global = true)]
    host: Option<String>,

    /// Bridge API key, overrides the configuration file
    #[arg(short, long, global = true)]
    username: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List lights and groups and show the automatic groups
    Status,

    /// Set the automatic brightness (3-254)
    Brightness {
        #[arg(value_parser = clap::value_parser!(u8).range(3..=254))]
        level: u8,
    },

    /// Set the automatic color temperature in mirek (153-454)
    Temperature {
        #[arg(value_parser = clap::value_parser!(u16).range(153..=454))]
        mirek: u16,
    },

    /// Make a light follow both automatic values
    Track {
        /// Bridge light number
        light: String,
    },

    /// Stop a light following the automatic values
    Untrack {
        /// Bridge light number
        light: String,
    },

    /// Turn every light off
    AllOff {
        /// Fade in seconds
        #[arg(short, long)]
        transition: Option<f64>,
    },

    /// Print engine diagnostics as JSON
    Diagnostics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_json(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    if let Some(host) = cli.host {
        config.bridge.host = host;
    }
    if let Some(username) = cli.username {
        config.bridge.username = username;
    }

    let bridge = HttpBridge::new(&config.bridge)?;
    println!("Connecting to {}...", bridge.base_uri());
    let engine = ReconciliationEngine::new(bridge, config.engine);

    engine.request_reload();
    engine.wait_idle().await;
    if !engine.is_ready() {
        eprintln!("Automatic groups not found on the bridge");
        return Ok(());
    }

    match cli.command {
        Commands::Status => {
            println!("\nLights:");
            for light in engine.lights() {
                println!("  {}", light);
            }
            println!("\nGroups:");
            for group in engine.groups() {
                println!("  {}", group);
            }
            for kind in [GroupKind::Brightness, GroupKind::Temperature] {
                if let Some(group) = engine.group(kind) {
                    println!("\nAutomatic {}: group {}", kind, group.number());
                }
            }
        }

        Commands::Brightness { level } => {
            println!("Setting automatic brightness to {}...", level);
            engine.set_automatic_brightness(level);
        }

        Commands::Temperature { mirek } => {
            println!("Setting automatic temperature to {} mirek...", mirek);
            engine.set_automatic_temperature(mirek);
        }

        Commands::Track { light } => {
            println!("Tracking light {}...", light);
            engine.add_automatic_brightness_light(&light);
            engine.add_automatic_temperature_light(&light);
        }

        Commands::Untrack { light } => {
            println!("Releasing light {}...", light);
            engine.remove_automatic_brightness_light(&light);
            engine.remove_automatic_temperature_light(&light);
        }

        Commands::AllOff { transition } => {
            println!("Turning all lights off...");
            engine.request_all_off(transition.map(Transition::seconds));
        }

        Commands::Diagnostics => {
            println!("{}", serde_json::to_string_pretty(&engine.diagnostics())?);
            return Ok(());
        }
    }

    let steps = engine.wait_idle().await;
    println!("Done after {} step(s)", steps);
    Ok(())
}
