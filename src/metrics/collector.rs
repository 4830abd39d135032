use crate::resolver::Resolution;
use crate::Result;
use prometheus::{IntCounterVec, Opts, Registry};

/// Counts what the address resolver did with each pod event.
#[derive(Clone)]
pub struct WatchMetrics {
    events: IntCounterVec,
}

impl WatchMetrics {
    pub fn register(registry: &Registry) -> Result<Self> {
        let events = IntCounterVec::new(
            Opts::new(
                "ipsentry_instance_events_total",
                "Pod events seen by the address resolver, by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(events.clone()))?;

        Ok(Self { events })
    }

    pub fn observe(&self, outcome: &Result<Resolution>) {
        // The resolver only ever fails with an address drift.
        let label = match outcome {
            Ok(resolution) => resolution.as_str(),
            Err(_) => "drift",
        };
        self.events.with_label_values(&[label]).inc();
    }

    pub fn count(&self, outcome: &str) -> u64 {
        self.events.with_label_values(&[outcome]).get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DiscardReason;
    use crate::Error;
    use prometheus::{Encoder, TextEncoder};

    #[test]
    fn test_outcomes_are_counted_by_label() {
        let registry = Registry::new();
        let metrics = WatchMetrics::register(&registry).unwrap();

        metrics.observe(&Ok(Resolution::Delivered("10.0.0.5".parse().unwrap())));
        metrics.observe(&Ok(Resolution::Duplicate));
        metrics.observe(&Ok(Resolution::Duplicate));
        metrics.observe(&Ok(Resolution::Discarded(DiscardReason::InvalidAddress)));
        metrics.observe(&Err(Error::AddressDrift {
            previous_instance: "nginx".to_string(),
            previous: "10.0.0.5".parse().unwrap(),
            instance: "nginx".to_string(),
            observed: "10.0.0.9".parse().unwrap(),
        }));

        assert_eq!(metrics.count("delivered"), 1);
        assert_eq!(metrics.count("duplicate"), 2);
        assert_eq!(metrics.count("invalid_address"), 1);
        assert_eq!(metrics.count("deleting"), 0);
        assert_eq!(metrics.count("drift"), 1);

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("ipsentry_instance_events_total{outcome=\"drift\"} 1"));
        assert!(!text.contains("outcome=\"error\""));
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        WatchMetrics::register(&registry).unwrap();

        assert!(matches!(
            WatchMetrics::register(&registry),
            Err(Error::Metrics(_))
        ));
    }
}
