//! Corsair Hydro H80i V2 Control CLI
//!
//! Command-line interface for monitoring and controlling Corsair Hydro coolers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use corsair_rust_devices::config::{CoolerSettings, get_config_path};
use corsair_rust_devices::device::HydroCooler;
use corsair_rust_devices::logging::setup_logging;
use corsair_rust_devices::protocol::LedCommand;
use corsair_rust_devices::utils::parsing::{parse_hex_color, parse_led_mode, parse_usb_id};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Corsair Hydro H80i V2 Control Tool
#[derive(Parser, Debug)]
#[command(name = "corsair-hydro-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (default: <config dir>/corsair-rust/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the USB vendor id (hex with 0x, or decimal)
    #[arg(long, global = true)]
    vid: Option<String>,

    /// Override the USB product id (hex with 0x, or decimal)
    #[arg(long, global = true)]
    pid: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show current device status
    Status,

    /// Continuously monitor device status
    Monitor {
        /// Update interval in seconds
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Set pump speed (values above 100 are capped)
    SetPump {
        /// Duty cycle percentage
        percent: u8,
    },

    /// Set one fan's speed (values above 100 are capped)
    SetFan {
        /// Fan index, starting at 0
        fan: u8,

        /// Duty cycle percentage
        percent: u8,
    },

    /// Set LED mode and colour
    SetLed {
        /// Mode: static, blink, pulse, rainbow
        mode: String,

        /// Colour as #RRGGBB
        #[arg(default_value = "#0000FF")]
        color: String,
    },

    /// Apply pump, fan and LED settings, showing status before and after
    Apply {
        /// Pump duty percentage
        #[arg(long, default_value = "70")]
        pump: u8,

        /// Duty percentage for every fan
        #[arg(long, default_value = "60")]
        fans: u8,

        /// LED mode: static, blink, pulse, rainbow
        #[arg(long, default_value = "pulse")]
        led_mode: String,

        /// LED colour as #RRGGBB
        #[arg(long, default_value = "#0000FF")]
        color: String,
    },

    /// Show the effective configuration
    Config,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(if args.verbose { "debug" } else { "info" })?;

    let settings = load_settings(&args)?;

    match args.command {
        Command::Status => cmd_status(&settings),
        Command::Monitor { interval } => cmd_monitor(&settings, interval),
        Command::SetPump { percent } => cmd_set_pump(&settings, percent),
        Command::SetFan { fan, percent } => cmd_set_fan(&settings, fan, percent),
        Command::SetLed { mode, color } => cmd_set_led(&settings, &mode, &color),
        Command::Apply {
            pump,
            fans,
            led_mode,
            color,
        } => cmd_apply(&settings, pump, fans, &led_mode, &color),
        Command::Config => cmd_config(args.config.as_deref(), &settings),
    }
}

fn load_settings(args: &Args) -> Result<CoolerSettings> {
    let mut settings = match &args.config {
        Some(path) => CoolerSettings::load_from(path),
        None => CoolerSettings::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(vid) = &args.vid {
        settings.vendor_id = parse_usb_id(vid)?;
    }
    if let Some(pid) = &args.pid {
        settings.product_id = parse_usb_id(pid)?;
    }

    Ok(settings)
}

fn open(settings: &CoolerSettings) -> Result<HydroCooler> {
    HydroCooler::open(settings).with_context(|| {
        format!(
            "Failed to open cooler {:04x}:{:04x}",
            settings.vendor_id, settings.product_id
        )
    })
}

fn parse_led(mode: &str, color: &str) -> Result<LedCommand> {
    let mode = parse_led_mode(mode)?;
    let (r, g, b) = parse_hex_color(color)?;
    Ok(LedCommand::new(mode, r, g, b))
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_status(settings: &CoolerSettings) -> Result<()> {
    let mut cooler = open(settings)?;
    let status = cooler.get_status().context("Failed to read status")?;
    print!("{}", status);
    Ok(())
}

fn cmd_monitor(settings: &CoolerSettings, interval_secs: u64) -> Result<()> {
    let mut cooler = open(settings)?;

    // Setup Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    println!("Monitoring H80i V2 (Ctrl+C to stop)...\n");

    while running.load(Ordering::SeqCst) {
        match cooler.get_status() {
            Ok(status) => {
                // Clear screen and move cursor to top
                print!("\x1B[2J\x1B[1;1H");
                print!("{}", status);
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
            }
        }

        std::thread::sleep(Duration::from_secs(interval_secs));
    }

    cooler.close();
    println!("\nMonitoring stopped.");
    Ok(())
}

fn cmd_set_pump(settings: &CoolerSettings, percent: u8) -> Result<()> {
    let mut cooler = open(settings)?;
    let duty = cooler
        .set_pump_speed(percent)
        .context("Failed to set pump speed")?;
    println!("Pump speed set to {}%", duty);
    Ok(())
}

fn cmd_set_fan(settings: &CoolerSettings, fan: u8, percent: u8) -> Result<()> {
    let mut cooler = open(settings)?;
    let duty = cooler
        .set_fan_speed(fan, percent)
        .context("Failed to set fan speed")?;
    println!("Fan {} speed set to {}%", fan, duty);
    Ok(())
}

fn cmd_set_led(settings: &CoolerSettings, mode: &str, color: &str) -> Result<()> {
    let led = parse_led(mode, color)?;
    let mut cooler = open(settings)?;
    cooler.set_led(led).context("Failed to set LED")?;
    println!("LED set to {}", led);
    Ok(())
}

fn cmd_apply(
    settings: &CoolerSettings,
    pump: u8,
    fans: u8,
    led_mode: &str,
    color: &str,
) -> Result<()> {
    let led = parse_led(led_mode, color)?;
    let mut cooler = open(settings)?;

    let status = cooler.get_status().context("Failed to read status")?;
    print!("{}", status);

    let duty = cooler
        .set_pump_speed(pump)
        .context("Failed to set pump speed")?;
    println!("\nSetting pump to {}%...", duty);

    for fan in 0..cooler.fan_count() {
        let fan = u8::try_from(fan).context("Fan index out of range")?;
        let duty = cooler
            .set_fan_speed(fan, fans)
            .context("Failed to set fan speed")?;
        println!("Setting fan {} to {}%...", fan, duty);
    }

    cooler.set_led(led).context("Failed to set LED")?;
    println!("Setting LED to {}...", led);

    // Wait for changes to take effect
    std::thread::sleep(Duration::from_secs(2));

    println!("\nUpdated status:");
    let status = cooler.get_status().context("Failed to read status")?;
    print!("{}", status);

    cooler.close();
    Ok(())
}

fn cmd_config(config: Option<&Path>, settings: &CoolerSettings) -> Result<()> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => get_config_path()?,
    };

    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("(not found, using defaults)");
    }
    println!(
        "{}",
        serde_json::to_string_pretty(settings).context("Failed to serialize settings")?
    );
    Ok(())
}
