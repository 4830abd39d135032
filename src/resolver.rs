//! Turns pod update events into a single, stable IP address.
//!
//! The first valid address seen for a non-terminating pod is handed to the
//! caller through an [`AddressHandoff`]. Later events are only checked against
//! it: repeats are ignored and a different address is reported as
//! [`Error::AddressDrift`], since whatever consumed the first address cannot be
//! rebound.

use crate::k8s::InstanceEvent;
use crate::{Error, Result};
use std::future::Future;
use std::net::IpAddr;
use tokio::sync::oneshot;
use tracing::debug;

/// Why an event was dropped without touching the resolver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Deleting,
    InvalidAddress,
}

/// Outcome of feeding one event to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// First valid address; it has been written to the handoff.
    Delivered(IpAddr),
    /// Same address as the one already delivered.
    Duplicate,
    Discarded(DiscardReason),
}

impl Resolution {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Resolution::Delivered(_) => "delivered",
            Resolution::Duplicate => "duplicate",
            Resolution::Discarded(DiscardReason::Deleting) => "deleting",
            Resolution::Discarded(DiscardReason::InvalidAddress) => "invalid_address",
        }
    }
}

/// The address handed out so far, and which pod it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedAddress {
    last_delivered: Option<(String, IpAddr)>,
}

impl ObservedAddress {
    pub fn delivered(&self) -> bool {
        self.last_delivered.is_some()
    }

    pub fn address(&self) -> Option<IpAddr> {
        self.last_delivered.as_ref().map(|(_, ip)| *ip)
    }
}

/// Event handler behind a pod watch.
///
/// Not synchronized: it must be driven by a single task, one event at a time.
pub struct AddressResolver {
    state: ObservedAddress,
    slot: Option<oneshot::Sender<IpAddr>>,
}

impl AddressResolver {
    /// Create a resolver together with the handoff its first address is sent to.
    pub fn new() -> (Self, AddressHandoff) {
        let (tx, rx) = oneshot::channel();
        let resolver = Self {
            state: ObservedAddress::default(),
            slot: Some(tx),
        };

        (resolver, AddressHandoff { rx })
    }

    pub fn state(&self) -> &ObservedAddress {
        &self.state
    }

    pub fn handle(&mut self, event: &InstanceEvent) -> Result<Resolution> {
        debug!(
            "Received update for pod {:?}, with IP {:?}",
            event.instance_name, event.address
        );

        if event.marked_for_deletion {
            return Ok(Resolution::Discarded(DiscardReason::Deleting));
        }

        let observed = match event.address.parse::<IpAddr>() {
            Ok(ip) => ip.to_canonical(),
            Err(_) => return Ok(Resolution::Discarded(DiscardReason::InvalidAddress)),
        };

        match &self.state.last_delivered {
            Some((_, previous)) if *previous == observed => Ok(Resolution::Duplicate),
            Some((previous_instance, previous)) => Err(Error::AddressDrift {
                previous_instance: previous_instance.clone(),
                previous: *previous,
                instance: event.instance_name.clone(),
                observed,
            }),
            None => {
                self.state.last_delivered = Some((event.instance_name.clone(), observed));
                self.deliver(observed);
                Ok(Resolution::Delivered(observed))
            }
        }
    }

    fn deliver(&mut self, address: IpAddr) {
        let Some(slot) = self.slot.take() else {
            return;
        };

        if slot.send(address).is_err() {
            debug!("Nobody is waiting for the observed IP anymore, dropping {}", address);
        }
    }
}

/// Receiving side of the resolver's single-slot channel.
#[derive(Debug)]
pub struct AddressHandoff {
    rx: oneshot::Receiver<IpAddr>,
}

impl AddressHandoff {
    /// Wait for the first resolved address, or until `cancel` completes.
    ///
    /// `cancel` yields a human readable reason, reported in
    /// [`Error::Cancelled`]. An address that is already available wins over a
    /// cancellation that is ready at the same time.
    pub async fn wait<C>(self, cancel: C) -> Result<IpAddr>
    where
        C: Future<Output = String>,
    {
        tokio::select! {
            biased;
            received = self.rx => received.map_err(|_| Error::HandoffClosed),
            reason = cancel => Err(Error::Cancelled(reason)),
        }
    }
}
