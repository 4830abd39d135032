use k8s_openapi::api::core::v1::Pod;

/// Selects the pods to watch: everything in `namespace` scheduled on `node_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchFilter {
    pub namespace: String,
    pub node_name: String,
}

impl WatchFilter {
    pub fn new(namespace: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            node_name: node_name.into(),
        }
    }

    pub fn field_selector(&self) -> String {
        format!("spec.nodeName={}", self.node_name)
    }
}

/// The parts of a pod update the address resolver looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceEvent {
    pub instance_name: String,
    /// Raw `status.podIP`; empty until the pod has been assigned an address.
    pub address: String,
    pub marked_for_deletion: bool,
}

impl InstanceEvent {
    pub fn new(instance_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            address: address.into(),
            marked_for_deletion: false,
        }
    }

    pub fn deleting(mut self) -> Self {
        self.marked_for_deletion = true;
        self
    }

    pub fn from_k8s_pod(pod: &Pod) -> Self {
        let metadata = &pod.metadata;

        Self {
            instance_name: metadata.name.clone().unwrap_or_default(),
            address: pod
                .status
                .as_ref()
                .and_then(|s| s.pod_ip.clone())
                .unwrap_or_default(),
            marked_for_deletion: metadata.deletion_timestamp.is_some(),
        }
    }
}
