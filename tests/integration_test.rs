use ipsentry::error::Error;
use ipsentry::k8s::InstanceEvent;
use ipsentry::metrics::{AddressBinder, Exporter, WatchMetrics};
use ipsentry::resolver::{AddressResolver, Resolution};
use prometheus::Registry;
use std::future::pending;
use std::net::IpAddr;

#[test]
fn test_error_types() {
    let err = Error::AddressDrift {
        previous_instance: "nginx-a".to_string(),
        previous: "10.0.0.5".parse().unwrap(),
        instance: "nginx-b".to_string(),
        observed: "10.0.0.9".parse().unwrap(),
    };

    let message = err.to_string();
    assert!(message.contains("10.0.0.5"));
    assert!(message.contains("10.0.0.9"));
    assert!(message.contains("nginx-b"));
}

#[test]
fn test_version_const() {
    assert!(!ipsentry::VERSION.is_empty());
}

#[tokio::test]
async fn test_resolved_address_reaches_exporter_once() {
    let registry = Registry::new();
    let metrics = WatchMetrics::register(&registry).unwrap();
    let (mut resolver, handoff) = AddressResolver::new();

    let events = [
        InstanceEvent::new("nginx-7f9c", ""),
        InstanceEvent::new("nginx-7f9c", "10.0.0.5"),
        InstanceEvent::new("nginx-7f9c", "10.0.0.5"),
        InstanceEvent::new("nginx-7f9c", "10.0.0.9"),
    ];
    let mut delivered = 0;
    let mut fault = None;
    for event in &events {
        let outcome = resolver.handle(event);
        metrics.observe(&outcome);
        match outcome {
            Ok(Resolution::Delivered(_)) => delivered += 1,
            Ok(_) => {}
            Err(e) => {
                fault = Some(e);
                break;
            }
        }
    }

    assert_eq!(delivered, 1);
    assert!(matches!(fault, Some(Error::AddressDrift { .. })));

    let address = handoff.wait(pending::<String>()).await.unwrap();
    let mut exporter = Exporter::new(&Default::default(), registry).unwrap();
    exporter.bind(address).unwrap();

    assert_eq!(exporter.bound_address(), Some("10.0.0.5".parse::<IpAddr>().unwrap()));
    let text = exporter.encode_text().unwrap();
    assert!(text.contains("ipsentry_instance_events_total{outcome=\"drift\"} 1"));
    assert!(text.contains("ipsentry_target_info{address=\"10.0.0.5\"} 1"));
}

#[tokio::test]
async fn test_deleting_pod_never_resolves() {
    let (mut resolver, handoff) = AddressResolver::new();

    resolver
        .handle(&InstanceEvent::new("nginx-7f9c", "10.0.0.5").deleting())
        .unwrap();
    assert!(!resolver.state().delivered());

    let result = handoff
        .wait(async { "startup deadline".to_string() })
        .await;
    assert!(matches!(result, Err(Error::Cancelled(_))));
}
