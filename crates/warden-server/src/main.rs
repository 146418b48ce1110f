//! Warden server binary.
//!
//! # Usage
//!
//! ```bash
//! # Strict deployment, all checks enforced
//! warden-server --bind 0.0.0.0:8080 --devices /etc/warden/devices.json
//!
//! # Legacy devices without a clock or counter storage
//! warden-server --devices devices.json --waive timestamp --waive counter
//! ```
//!
//! The binary applies site actions to in-memory configuration and cache
//! stores. Embed the library and call `Server::bind_with` to drive a real
//! site.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use warden_core::AuthPolicy;
use warden_proto::Checks;
use warden_server::{Server, ServerRuntimeConfig};

/// Optional check a deployment may switch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Waivable {
    Timestamp,
    Counter,
    Nonce,
}

impl From<Waivable> for Checks {
    fn from(check: Waivable) -> Self {
        match check {
            Waivable::Timestamp => Self::TIMESTAMP,
            Waivable::Counter => Self::COUNTER,
            Waivable::Nonce => Self::NONCE,
        }
    }
}

/// Warden remote command server
#[derive(Parser, Debug)]
#[command(name = "warden-server")]
#[command(about = "Authenticated remote admin command endpoint")]
#[command(
    long_about = "Authenticated remote admin command endpoint.\n\nSite actions (closeSite, \
                  debugOn, clearCache, ...) are applied to in-memory configuration and cache \
                  stores that do not outlive the process. Embed the warden-server library and \
                  call Server::bind_with to drive a real site."
)]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// JSON file of provisioned devices
    #[arg(short, long)]
    devices: PathBuf,

    /// Replay window in seconds (at most 86400)
    #[arg(long, default_value = "600")]
    tolerance_secs: u64,

    /// Skip an optional check (repeatable)
    #[arg(long, value_enum)]
    waive: Vec<Waivable>,

    /// Reply "request rejected" instead of naming the failed check
    #[arg(long)]
    generic_errors: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Warden server starting");
    tracing::info!("Binding to {}", args.bind);

    let waived = args.waive.iter().copied().map(Checks::from).fold(Checks::empty(), |a, b| a | b);
    let policy =
        AuthPolicy::with_tolerance(Duration::from_secs(args.tolerance_secs)).waive(waived);

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        devices_path: args.devices,
        policy,
        generic_errors: args.generic_errors,
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn help_states_site_actions_are_in_memory() {
        let long_about = Args::command().get_long_about().map(ToString::to_string);
        assert!(long_about.is_some_and(|text| text.contains("in-memory")));
    }

    #[test]
    fn waivers_accumulate() {
        let args =
            Args::try_parse_from(["warden-server", "-d", "x.json", "--waive", "timestamp", "--waive", "nonce"])
                .unwrap();
        assert_eq!(args.waive, vec![Waivable::Timestamp, Waivable::Nonce]);
    }
}
