//! LowpanSniff - 6LoWPAN sniffer viewer
//!
//! Command-line viewer for wireless sensor-network traffic captured by a
//! serial packet sniffer. Groups captured packets by sensor node and prints
//! the node table when the capture ends.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lowpansniff_core::{
    list_ports, CaptureEvent, CaptureSession, FileSource, NodeSummary, SerialPacketSource,
    SerialSourceConfig, SharedPacket, SnifferConfig,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// CLI output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable table
    Text,
    /// JSON for scripting
    Json,
}

/// LowpanSniff CLI
#[derive(Parser, Debug)]
#[command(
    name = "lowpansniff",
    version,
    about = "6LoWPAN sensor-network sniffer viewer",
    long_about = None
)]
struct Cli {
    /// Output format for the node table
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress the live feed)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List serial ports a sniffer bridge could be attached to
    ListPorts {
        /// Show detailed port info
        #[arg(short, long)]
        detailed: bool,
    },

    /// Capture live from a serial sniffer bridge
    Capture {
        /// Serial port name (e.g., COM3, /dev/ttyUSB0); defaults to the
        /// configured port
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Parity (none, odd, even)
        #[arg(long, default_value = "none")]
        parity: String,

        /// Stop capturing after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Record raw frames to a capture log for later replay
        #[arg(short, long)]
        record: Option<PathBuf>,
    },

    /// Replay a recorded capture log
    Replay {
        /// Capture log path
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    let quiet = cli.quiet;

    match cli.command {
        Commands::ListPorts { detailed } => cmd_list_ports(detailed),
        Commands::Capture {
            port,
            baud,
            parity,
            duration,
            record,
        } => cmd_capture(format, quiet, port, baud, &parity, duration, record).await,
        Commands::Replay { file } => cmd_replay(format, &file).await,
    }
}

fn cmd_list_ports(detailed: bool) -> anyhow::Result<()> {
    let ports = list_ports().context("failed to enumerate serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    for port in ports {
        if detailed {
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    println!(
                        "{}  USB {:04x}:{:04x}  {}",
                        port.port_name,
                        usb.vid,
                        usb.pid,
                        usb.product.as_deref().unwrap_or("-")
                    );
                }
                other => println!("{}  {:?}", port.port_name, other),
            }
        } else {
            println!("{}", port.port_name);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_capture(
    format: OutputFormat,
    quiet: bool,
    port: Option<String>,
    baud: Option<u32>,
    parity: &str,
    duration: Option<u64>,
    record: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = SnifferConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config, using defaults");
        SnifferConfig::default()
    });

    let port = port.unwrap_or_else(|| config.serial.port.clone());
    let baud = baud.unwrap_or(config.serial.baud_rate);
    let source_config = SerialSourceConfig::new(&port, baud)
        .parity(parity.parse().unwrap_or_default());

    let source =
        SerialPacketSource::open(source_config).with_context(|| format!("cannot open {port}"))?;
    let mut session = CaptureSession::start("live capture", Box::new(source));
    let mut events = session.subscribe();

    config.remember_port(&port);
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "could not save config");
    }

    let mut recorder = match record {
        Some(path) => Some(
            std::fs::File::create(&path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => None,
    };

    eprintln!("Capturing from {} (Ctrl-C to stop)", session.source_info());

    let deadline = duration.map(Duration::from_secs);
    let timeout = async {
        match deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(timeout);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut timeout => break,
            event = events.recv() => match event {
                Ok(CaptureEvent::PacketCaptured(packet)) => {
                    if let Some(ref mut file) = recorder {
                        record_packet(file, &packet)?;
                    }
                    if !quiet {
                        print_feed_line(&config, &packet);
                    }
                }
                Ok(CaptureEvent::NodeDiscovered { address }) => {
                    if !quiet {
                        eprintln!("node discovered: {address}");
                    }
                }
                Ok(CaptureEvent::Error(message)) => {
                    eprintln!("capture failed: {message}");
                    break;
                }
                Ok(CaptureEvent::StateChanged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "live feed lagging behind capture");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    session.stop().await;
    session.wait().await;

    print_nodes(&session.snapshot(), format)
}

async fn cmd_replay(format: OutputFormat, file: &PathBuf) -> anyhow::Result<()> {
    let source = FileSource::open(file)
        .await
        .with_context(|| format!("cannot open {}", file.display()))?;

    let mut session = CaptureSession::start("replay", Box::new(source));
    session.wait().await;

    print_nodes(&session.snapshot(), format)
}

fn record_packet(file: &mut std::fs::File, packet: &SharedPacket) -> anyhow::Result<()> {
    let mut line = packet.hex();
    if let Some(rssi) = packet.metadata.rssi {
        line.push_str(&format!(" {rssi}"));
        if let Some(lqi) = packet.metadata.lqi {
            line.push_str(&format!(" {lqi}"));
        }
    }
    writeln!(file, "{line}").context("failed to write capture log")
}

fn print_feed_line(config: &SnifferConfig, packet: &SharedPacket) {
    let mut line = String::new();
    if config.display.show_timestamps {
        line.push_str(&format!("[{}] ", packet.timestamp.format("%H:%M:%S%.3f")));
    }
    line.push_str(&packet.summary());
    if config.display.show_link_quality {
        if let Some(rssi) = packet.metadata.rssi {
            line.push_str(&format!("  rssi={rssi}"));
        }
        if let Some(lqi) = packet.metadata.lqi {
            line.push_str(&format!(" lqi={lqi}"));
        }
    }
    println!("{line}");
}

fn print_nodes(summaries: &[NodeSummary], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summaries)?);
        }
        OutputFormat::Text => {
            if summaries.is_empty() {
                println!("No nodes observed");
                return Ok(());
            }
            println!("{:<6} {:<40} {:>8}  LAST SEEN", "ID", "ADDRESS", "PACKETS");
            for summary in summaries {
                let last_seen = summary
                    .last_seen
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<6} {:<40} {:>8}  {}",
                    summary.identifier, summary.address, summary.packet_count, last_seen
                );
            }
        }
    }
    Ok(())
}
