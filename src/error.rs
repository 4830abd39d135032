use std::net::IpAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unable to retrieve client config: {0}")]
    Bootstrap(String),

    #[error("Failed to set up pod watch: {0}")]
    Subscription(String),

    #[error(
        "Pods {first} ({first_address}) and {second} ({second_address}) both match the watch filter"
    )]
    AmbiguousMatch {
        first: String,
        first_address: IpAddr,
        second: String,
        second_address: IpAddr,
    },

    #[error(
        "Detected observed IP change: pod {previous_instance} had {previous}, pod {instance} now has {observed}"
    )]
    AddressDrift {
        previous_instance: String,
        previous: IpAddr,
        instance: String,
        observed: IpAddr,
    },

    #[error("Cancelled while waiting for the observed IP: {0}")]
    Cancelled(String),

    #[error("Pod watch stopped before an IP address was observed")]
    HandoffClosed,

    #[error("Exporter already bound to {current}, refusing to rebind to {requested}")]
    AlreadyBound { current: IpAddr, requested: IpAddr },

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<prometheus::Error> for Error {
    fn from(e: prometheus::Error) -> Self {
        Error::Metrics(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
