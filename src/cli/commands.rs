use crate::cli::Cli;
use crate::config::Config;
use crate::k8s::{K8sClient, PodWatcher, WatchFilter};
use crate::metrics::{AddressBinder, Exporter, WatchMetrics};
use crate::resolver::AddressResolver;
use crate::{Error, Result};
use prometheus::Registry;
use std::future::pending;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Resolve the observed pod IP, bind the exporter to it and guard it until
/// shutdown.
///
/// Every error returned from here is fatal for the process.
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config_file {
        Some(path) => Config::from_file(path)?,
        None => {
            warn!("No config file given, starting without programs");
            Config::default()
        }
    };

    let client = match &cli.kubeconfig {
        Some(path) => K8sClient::from_kubeconfig(path).await?,
        None => K8sClient::in_cluster()?,
    };

    let registry = Registry::new();
    let metrics = WatchMetrics::register(&registry)?;

    info!("Waiting to retrieve observed IP address");

    let (mut resolver, handoff) = AddressResolver::new();
    let guard = PodWatcher::new(&client, WatchFilter::new(cli.namespace, cli.node))
        .start(move |event| {
            let outcome = resolver.handle(&event);
            metrics.observe(&outcome);
            outcome.map(|_| ())
        })
        .await?;

    let address = match handoff.wait(startup_deadline(cli.resolve_timeout)).await {
        Ok(address) => address,
        // The resolver went away with the watch; report why the watch stopped.
        Err(Error::HandoffClosed) => return Err(guard.wait().await),
        Err(e) => return Err(e),
    };
    info!("Retrieved observed IP address: {}", address);

    let mut exporter = Exporter::new(&config, registry)?;
    exporter.bind(address)?;

    info!(
        "Starting with {} programs found in the config",
        config.programs.len()
    );

    tokio::select! {
        fault = guard.wait() => Err(fault),
        received = shutdown_signal() => {
            info!("Shutdown signal received ({})", received);
            Ok(())
        }
    }
}

/// Completes when the startup wait for the pod IP should be abandoned.
async fn startup_deadline(timeout: Option<Duration>) -> String {
    let expired = async {
        match timeout {
            Some(timeout) => {
                tokio::time::sleep(timeout).await;
                format!("no pod IP observed within {}s", timeout.as_secs())
            }
            None => pending().await,
        }
    };

    tokio::select! {
        reason = expired => reason,
        received = shutdown_signal() => format!("received {}", received),
    }
}

/// Completes on SIGINT or SIGTERM and names the signal.
pub async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_startup_deadline_expires() {
        let reason = startup_deadline(Some(Duration::from_secs(30))).await;
        assert_eq!(reason, "no pod IP observed within 30s");
    }

    #[tokio::test(start_paused = true)]
    async fn test_handoff_gives_up_at_deadline() {
        let (_resolver, handoff) = AddressResolver::new();

        let result = handoff
            .wait(startup_deadline(Some(Duration::from_secs(5))))
            .await;

        assert!(matches!(result, Err(Error::Cancelled(_))));
    }
}
