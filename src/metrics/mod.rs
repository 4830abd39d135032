pub mod collector;
pub mod exporter;

pub use collector::WatchMetrics;
pub use exporter::{AddressBinder, Exporter};
