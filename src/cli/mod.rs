pub mod commands;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ipsentry")]
#[command(author = "Ignoramuss")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Resolves the IP of the pod observed by the eBPF exporter and restarts when it changes",
    long_about = None
)]
pub struct Cli {
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long = "config.file", value_name = "PATH", help = "Config file path")]
    pub config_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Namespace of the pod under observation"
    )]
    pub namespace: String,

    #[arg(
        long,
        env = "NODE_NAME",
        help = "Node under observation; the observed pod must be scheduled on it"
    )]
    pub node: String,

    #[arg(
        long,
        value_name = "PATH",
        help = "Kubeconfig to use instead of the in-cluster service account"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        value_name = "SECONDS",
        value_parser = parse_seconds,
        help = "Give up if no pod IP is observed within this many seconds (default: wait forever)"
    )]
    pub resolve_timeout: Option<Duration>,
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: u64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds: {}", s))?;

    if secs == 0 {
        return Err("timeout must be at least one second".to_string());
    }

    Ok(Duration::from_secs(secs))
}
