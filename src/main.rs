mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use cli::{Cli, commands::Commands};
use delivery_watcher::formatting::to_mbps;
use delivery_watcher::registry::{HostBandwidthRegistry, HostUpdateRecord};
use delivery_watcher::sampler::{
    BandwidthReader, BandwidthSampler, ReaderConfig, SysinfoBandwidthReader,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            sample_interval,
            min_samples,
        } => {
            let config = ReaderConfig {
                sample_interval: Duration::from_secs(sample_interval),
                min_samples,
            };
            let window = Duration::from_secs(sample_interval * min_samples as u64);

            let mut sampler =
                BandwidthSampler::new(Box::new(SysinfoBandwidthReader::new()), config);
            sampler.start()?;
            println!("Sampling bandwidth, press Ctrl-C to stop");

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = tokio::time::sleep(window) => {
                        let (tx, rx) = sampler.avg_bandwidth_usage();
                        println!(
                            "tx: {} B/s ({} Mbps), rx: {} B/s ({} Mbps)",
                            tx, to_mbps(tx), rx, to_mbps(rx),
                        );
                    }
                }
            }
            sampler.stop();
        }
        Commands::Status {
            sample_interval,
            min_samples,
        } => {
            let config = ReaderConfig {
                sample_interval: Duration::from_secs(sample_interval),
                min_samples,
            };

            // the reader blocks for the whole window
            let reading = tokio::task::spawn_blocking(move || {
                let mut reader = SysinfoBandwidthReader::new();
                reader.read(&config)
            })
            .await
            .context("bandwidth measurement task failed")??;

            println!("Bandwidth Status");
            println!("================");
            let mut interfaces: Vec<_> = reading.avg.iter().collect();
            interfaces.sort_by(|a, b| a.0.cmp(b.0));
            for (name, avg) in interfaces {
                println!("\nInterface: {name}");
                println!("  Avg rx: {} B/s ({} Mbps)", avg.rx, to_mbps(avg.rx));
                println!("  Avg tx: {} B/s ({} Mbps)", avg.tx, to_mbps(avg.tx));
                if let Some(peak) = reading.peak.get(name) {
                    println!("  Peak rx: {} B/s ({} Mbps)", peak.rx, to_mbps(peak.rx));
                    println!("  Peak tx: {} B/s ({} Mbps)", peak.tx, to_mbps(peak.tx));
                }
            }
        }
        Commands::PickHost { hosts_file } => {
            let payload = std::fs::read_to_string(&hosts_file)
                .with_context(|| format!("failed to read {}", hosts_file.display()))?;
            let records: Vec<HostUpdateRecord> =
                serde_json::from_str(&payload).context("invalid host-update records")?;

            let registry = HostBandwidthRegistry::new();
            registry.update_hosts(&records);

            match registry.min_bandwidth_host() {
                Some(host) => println!("Least loaded host: {host}"),
                None => println!("No running host available"),
            }
        }
    }

    Ok(())
}
