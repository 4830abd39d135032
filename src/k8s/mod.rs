pub mod client;
pub mod types;
pub mod watcher;

pub use client::K8sClient;
pub use types::{InstanceEvent, WatchFilter};
pub use watcher::{PodWatcher, WatchGuard};
