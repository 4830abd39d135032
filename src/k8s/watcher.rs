use crate::k8s::{InstanceEvent, K8sClient, WatchFilter};
use crate::{Error, Result};
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::Event;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Api;
use std::fmt::Display;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Watches the pods selected by a [`WatchFilter`].
pub struct PodWatcher {
    api: Api<Pod>,
    filter: WatchFilter,
}

impl PodWatcher {
    pub fn new(client: &K8sClient, filter: WatchFilter) -> Self {
        Self {
            api: client.pods(&filter.namespace),
            filter,
        }
    }

    /// Open the watch and dispatch every added or updated pod to `handler`.
    ///
    /// Returns once the initial list of matching pods has been passed to the
    /// handler, so the first events reflect current cluster state. The watch
    /// keeps running in a background task afterwards.
    ///
    /// The handler is only ever called from that one task, in the order the
    /// API server emits events, and each call completes before the next event
    /// is read. Handler state therefore needs no synchronization as long as it
    /// is not shared with anything else.
    ///
    /// A handler error stops the watch. If that happens before the initial
    /// list is complete it is returned from here; afterwards it is reported by
    /// [`WatchGuard::wait`].
    pub async fn start<F>(self, handler: F) -> Result<WatchGuard>
    where
        F: FnMut(InstanceEvent) -> Result<()> + Send + 'static,
    {
        info!(
            "Starting informer for pods in namespace {:?} running on node {:?}",
            self.filter.namespace, self.filter.node_name
        );

        let config = watcher::Config::default().fields(&self.filter.field_selector());
        let stream = watcher(self.api, config).default_backoff();

        let guard = spawn_dispatch(stream, handler).await?;

        info!("Informer correctly started");
        Ok(guard)
    }
}

/// Handle on a running pod watch.
///
/// Dropping it leaves the watch running until the process exits.
pub struct WatchGuard {
    task: JoinHandle<Error>,
}

impl WatchGuard {
    /// Wait for the watch to stop and return the reason it stopped.
    pub async fn wait(self) -> Error {
        match self.task.await {
            Ok(reason) => reason,
            Err(e) => Error::Subscription(format!("pod watch task failed: {}", e)),
        }
    }
}

/// Spawn the dispatch loop over `stream` and wait for its initial sync.
pub(crate) async fn spawn_dispatch<S, E, F>(stream: S, handler: F) -> Result<WatchGuard>
where
    S: Stream<Item = std::result::Result<Event<Pod>, E>> + Send + 'static,
    E: Display + Send + 'static,
    F: FnMut(InstanceEvent) -> Result<()> + Send + 'static,
{
    let (synced_tx, synced_rx) = oneshot::channel();
    let task = tokio::spawn(dispatch(stream, handler, synced_tx));

    if synced_rx.await.is_ok() {
        return Ok(WatchGuard { task });
    }

    // The loop gave up before the initial list completed.
    Err(WatchGuard { task }.wait().await)
}

async fn dispatch<S, E, F>(stream: S, mut handler: F, synced: oneshot::Sender<()>) -> Error
where
    S: Stream<Item = std::result::Result<Event<Pod>, E>>,
    E: Display,
    F: FnMut(InstanceEvent) -> Result<()>,
{
    let mut stream = std::pin::pin!(stream);
    let mut synced = Some(synced);

    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Init) => {
                debug!("Listing pods");
            }
            Ok(Event::InitApply(pod)) | Ok(Event::Apply(pod)) => {
                if let Err(e) = handler(InstanceEvent::from_k8s_pod(&pod)) {
                    return match synced {
                        Some(_) => ambiguous_match(e),
                        None => e,
                    };
                }
            }
            Ok(Event::Delete(pod)) => {
                debug!(
                    "Pod {} deleted",
                    pod.metadata.name.as_deref().unwrap_or("unknown")
                );
            }
            Ok(Event::InitDone) => {
                if let Some(tx) = synced.take() {
                    let _ = tx.send(());
                } else {
                    debug!("Pod list resynced");
                }
            }
            Err(e) if synced.is_some() => {
                return Error::Subscription(format!("initial pod list failed: {}", e));
            }
            Err(e) => {
                warn!("Pod watch error: {}", e);
            }
        }
    }

    Error::Subscription("pod watch stream ended".to_string())
}

/// Two different pods with different addresses during the initial list means
/// the filter does not pin down a single pod.
fn ambiguous_match(e: Error) -> Error {
    match e {
        Error::AddressDrift {
            previous_instance,
            previous,
            instance,
            observed,
        } if previous_instance != instance => Error::AmbiguousMatch {
            first: previous_instance,
            first_address: previous,
            second: instance,
            second_address: observed,
        },
        other => other,
    }
}
