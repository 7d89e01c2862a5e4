use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the delivery-watcher binary
/// Uses clap's derive macros for automatic CLI generation
#[derive(Parser)]
#[command(version)] // Automatically uses version from Cargo.toml
#[command(about = "Bandwidth monitoring and least-loaded host selection for media delivery nodes")]
#[command(long_about = "delivery-watcher measures this node's own network bandwidth with a \
background sampler and can pick the least-loaded host from a delivery fleet description. \
The sampler publishes tx/rx averages continuously and logs hourly/daily bandwidth summaries.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands for the delivery-watcher binary
#[derive(Subcommand)]
pub enum Commands {
    /// Continuous bandwidth sampling of the monitored interface
    #[command(about = "Run the background bandwidth sampler until interrupted")]
    #[command(long_about = "Starts the background sampling loop against the first public IPv4 \
interface and prints the published tx/rx averages after each window until Ctrl-C.\n\n\
Examples:\n  \
dw monitor                            # Default 2s interval, 5 samples per window\n  \
dw monitor --sample-interval 1        # Faster windows\n  \
dw monitor --min-samples 10           # Smoother averages")]
    Monitor {
        /// Seconds between consecutive counter snapshots
        #[arg(
            short = 'i',
            long,
            default_value = "2",
            help = "Seconds between counter snapshots"
        )]
        sample_interval: u64,

        /// Snapshot deltas averaged per sampling window
        #[arg(
            short = 'n',
            long,
            default_value = "5",
            help = "Snapshot deltas averaged per window"
        )]
        min_samples: u32,
    },

    /// One measurement window across all interfaces
    #[command(about = "Measure one window and print per-interface averages and peaks")]
    Status {
        /// Seconds between consecutive counter snapshots
        #[arg(
            short = 'i',
            long,
            default_value = "2",
            help = "Seconds between counter snapshots"
        )]
        sample_interval: u64,

        /// Snapshot deltas averaged for the measurement
        #[arg(
            short = 'n',
            long,
            default_value = "5",
            help = "Snapshot deltas averaged for the measurement"
        )]
        min_samples: u32,
    },

    /// Least-loaded host selection from a fleet description
    #[command(about = "Pick the least-loaded running host from a hosts file")]
    #[command(long_about = "Reads a JSON array of host records ({\"host\", \"running\", \
\"bandwidthCorrection\"?}), reconciles a registry from it, and prints the running host with \
the smallest effective bandwidth.\n\n\
Example:\n  \
dw pick-host --hosts-file fleet.json")]
    PickHost {
        /// Path to the JSON array of host-update records
        #[arg(short = 'f', long, help = "JSON file with the host-update records")]
        hosts_file: PathBuf,
    },
}
