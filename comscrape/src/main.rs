//! comscrape command line.
//!
//! Query a switch over its console port:
//! ```bash
//! comscrape query --device /dev/ttyUSB0
//! comscrape query --device /dev/ttyUSB0 --report mac-address --json
//! ```
//!
//! Query a console shared by a bridge on another host:
//! ```bash
//! comscrape bridge --device COM17 --listen 0.0.0.0:4000   # on the console host
//! comscrape query --tcp 192.168.0.27:4000                  # anywhere else
//! ```
//!
//! Set `RUST_LOG=debug` for drain and prompt-match details.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};

use comscrape::bridge::{self, BridgeConfig};
use comscrape::platform::vendors::h3c_comware;
use comscrape::transport::config::{DEFAULT_BAUD_RATE, DEFAULT_BRIDGE_PORT};
use comscrape::{DeviceReport, DriverBuilder, Report, SerialConfig, collect_report};

#[derive(Parser, Debug)]
#[command(name = "comscrape")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serial console scraper for H3C Comware switches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a report against a switch console
    Query(QueryArgs),

    /// Share a serial console with TCP clients
    Bridge(BridgeArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Serial device path
    #[arg(long, required_unless_present = "tcp", conflicts_with = "tcp")]
    device: Option<String>,

    /// Console bridge address
    #[arg(long, value_name = "HOST:PORT")]
    tcp: Option<String>,

    /// Serial line speed
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Report to collect
    #[arg(long, value_enum, default_value_t = ReportArg::Device)]
    report: ReportArg,

    /// Prompt the switch prints when idle
    #[arg(long, default_value = h3c_comware::DEFAULT_PROMPT)]
    prompt: String,

    /// Upper bound for a single read, in milliseconds
    #[arg(long, default_value_t = 1000)]
    read_timeout_ms: u64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct BridgeArgs {
    /// Serial device path
    #[arg(long)]
    device: String,

    /// Serial line speed
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Address to accept clients on
    #[arg(long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_BRIDGE_PORT)))]
    listen: SocketAddr,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportArg {
    /// display device
    Device,
    /// display mac-address
    MacAddress,
}

impl From<ReportArg> for Report {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Device => Report::Device,
            ReportArg::MacAddress => Report::MacAddress,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Query(args) => query(args).await,
        Command::Bridge(args) => {
            let mut serial = SerialConfig::new(args.device);
            serial.baud_rate = args.baud;
            let mut config = BridgeConfig::new(serial);
            config.listen = args.listen;
            bridge::run(config).await?;
            Ok(())
        }
    }
}

async fn query(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let builder = match (&args.device, &args.tcp) {
        (Some(device), _) => DriverBuilder::serial(device).baud_rate(args.baud),
        (None, Some(addr)) => {
            let (host, port) = parse_host_port(addr)?;
            DriverBuilder::tcp(host, port)
        }
        (None, None) => return Err("either --device or --tcp is required".into()),
    };
    let builder = builder
        .prompt(&args.prompt)
        .read_timeout(Duration::from_millis(args.read_timeout_ms));

    info!("Connecting to {}...", builder.transport_config());
    let driver = builder.connect().await?;

    let report = collect_report(driver, args.report.into()).await?;
    if !report.response.is_complete() {
        warn!("Prompt {:?} never appeared; output may be incomplete", args.prompt);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &DeviceReport) {
    println!("{}", report.response.result);

    if let Some(failure) = &report.response.failure_message {
        eprintln!("Command failed: {}", failure);
    }

    if let Some(table) = &report.mac_table {
        println!("{}", "-".repeat(50));
        println!("{} MAC address(es):", table.len());
        for (mac, interface) in table {
            println!("  {:<16} {}", mac, interface);
        }
    }
}

fn parse_host_port(addr: &str) -> Result<(String, u16), Box<dyn std::error::Error>> {
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            Ok((host.to_string(), port.parse()?))
        }
        _ => Ok((addr.to_string(), DEFAULT_BRIDGE_PORT)),
    }
}
