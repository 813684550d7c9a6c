//! Node models
//!
//! Wire shapes for the cluster API Node object, the create-node form spec and
//! the manifest built from it, and the summarized view of a node.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{parse_quantity, prettify_bytes};

/// Label marking a control-plane node
pub const ROLE_MASTER: &str = "node-role.kubernetes.io/master";
/// Label marking a workload-plane node
pub const ROLE_NODE: &str = "node-role.kubernetes.io/node";
/// Label marking the bootstrap node
pub const ROLE_BOOTSTRAP: &str = "node-role.kubernetes.io/bootstrap";
/// Label carrying the platform version a node runs
pub const VERSION_LABEL: &str = "quarry.io/version";

const SSH_USER_ANNOTATION: &str = "quarry.io/ssh-user";
const SSH_HOST_ANNOTATION: &str = "quarry.io/ssh-host";
const SSH_PORT_ANNOTATION: &str = "quarry.io/ssh-port";
const SSH_KEY_PATH_ANNOTATION: &str = "quarry.io/ssh-key-path";
const SSH_SUDO_ANNOTATION: &str = "quarry.io/ssh-sudo";

/// Node list response from the cluster API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<Node>,
}

/// A cluster API Node object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "apiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default, skip_serializing_if = "NodeSpecWire::is_empty")]
    pub spec: NodeSpecWire,

    #[serde(default, skip_serializing_if = "NodeStatus::is_empty")]
    pub status: NodeStatus,
}

/// Object metadata subset used by the console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(
        rename = "creationTimestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// Node spec subset (taints only)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSpecWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
}

impl NodeSpecWire {
    fn is_empty(&self) -> bool {
        self.taints.is_empty()
    }
}

/// A node taint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub effect: String,
}

/// Node status subset (capacity and conditions)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<NodeCapacity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<NodeCondition>,
}

impl NodeStatus {
    fn is_empty(&self) -> bool {
        self.capacity.is_none() && self.conditions.is_empty()
    }
}

/// Node capacity quantities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeCapacity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// A node status condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub kind: String,

    pub status: String,
}

impl Node {
    fn has_role(&self, role: &str) -> bool {
        self.metadata.labels.contains_key(role)
    }

    /// The Ready condition, if reported
    pub fn ready_condition(&self) -> Option<&NodeCondition> {
        self.status.conditions.iter().find(|c| c.kind == "Ready")
    }

    /// Derive the summarized view used for display
    pub fn summarize(&self) -> NodeSummary {
        NodeSummary {
            name: self.metadata.name.clone(),
            version: self.metadata.labels.get(VERSION_LABEL).cloned(),
            status: self.ready_condition().cloned(),
            cpu: self
                .status
                .capacity
                .as_ref()
                .and_then(|capacity| capacity.cpu.clone()),
            control_plane: self.has_role(ROLE_MASTER),
            workload_plane: self.has_role(ROLE_NODE),
            bootstrap: self.has_role(ROLE_BOOTSTRAP),
            memory: self
                .status
                .capacity
                .as_ref()
                .and_then(|capacity| capacity.memory.as_deref())
                .and_then(parse_quantity)
                .map(prettify_bytes),
            creation_date: self.metadata.creation_timestamp,
        }
    }
}

/// Summarized node view
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub version: Option<String>,
    pub status: Option<NodeCondition>,
    pub cpu: Option<String>,
    pub control_plane: bool,
    pub workload_plane: bool,
    pub bootstrap: bool,
    pub memory: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
}

impl NodeSummary {
    /// Whether the node reports Ready=True
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .map(|condition| condition.status == "True")
            .unwrap_or(false)
    }
}

/// Create-node form spec
#[derive(Debug, Clone, Default)]
pub struct CreateNodeSpec {
    pub name: String,
    pub version: String,
    pub ssh_user: String,
    pub hostname_ip: String,
    pub ssh_port: String,
    pub ssh_key_path: String,
    pub sudo_required: bool,
    pub control_plane: bool,
    pub workload_plane: bool,
}

impl CreateNodeSpec {
    /// Build the Node manifest to POST to the cluster API
    pub fn to_manifest(&self) -> Node {
        let mut labels = BTreeMap::new();
        let mut taints = Vec::new();

        labels.insert(VERSION_LABEL.to_string(), self.version.clone());
        if self.control_plane {
            labels.insert(ROLE_MASTER.to_string(), String::new());
            taints.push(Taint {
                key: ROLE_MASTER.to_string(),
                effect: "NoSchedule".to_string(),
            });
        }
        if self.workload_plane {
            labels.insert(ROLE_NODE.to_string(), String::new());
        }

        let mut annotations = BTreeMap::new();
        annotations.insert(SSH_USER_ANNOTATION.to_string(), self.ssh_user.clone());
        annotations.insert(SSH_HOST_ANNOTATION.to_string(), self.hostname_ip.clone());
        annotations.insert(SSH_PORT_ANNOTATION.to_string(), self.ssh_port.clone());
        annotations.insert(SSH_KEY_PATH_ANNOTATION.to_string(), self.ssh_key_path.clone());
        annotations.insert(SSH_SUDO_ANNOTATION.to_string(), self.sudo_required.to_string());

        Node {
            api_version: Some("v1".to_string()),
            kind: Some("Node".to_string()),
            metadata: ObjectMeta {
                name: self.name.clone(),
                labels,
                annotations,
                creation_timestamp: None,
            },
            spec: NodeSpecWire { taints },
            status: NodeStatus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_labels(labels: &[(&str, &str)]) -> Node {
        let mut node = Node::default();
        node.metadata.name = "node-1".to_string();
        for (key, value) in labels {
            node.metadata
                .labels
                .insert(key.to_string(), value.to_string());
        }
        node
    }

    #[test]
    fn test_roles_derived_from_label_presence() {
        let node = node_with_labels(&[(ROLE_MASTER, ""), (ROLE_BOOTSTRAP, "")]);
        let summary = node.summarize();
        assert!(summary.control_plane);
        assert!(summary.bootstrap);
        assert!(!summary.workload_plane);
    }

    #[test]
    fn test_summary_memory_and_readiness() {
        let mut node = node_with_labels(&[(VERSION_LABEL, "2.11.5")]);
        node.status.capacity = Some(NodeCapacity {
            cpu: Some("8".to_string()),
            memory: Some("1882012Ki".to_string()),
        });
        node.status.conditions = vec![
            NodeCondition {
                kind: "DiskPressure".to_string(),
                status: "False".to_string(),
            },
            NodeCondition {
                kind: "Ready".to_string(),
                status: "True".to_string(),
            },
        ];

        let summary = node.summarize();
        assert_eq!(summary.version.as_deref(), Some("2.11.5"));
        assert_eq!(summary.cpu.as_deref(), Some("8"));
        assert_eq!(summary.memory.as_deref(), Some("1.79 GiB"));
        assert!(summary.is_ready());
    }

    #[test]
    fn test_manifest_labels_annotations_and_taints() {
        let spec = CreateNodeSpec {
            name: "node-1".to_string(),
            version: "2.11.5".to_string(),
            ssh_user: "centos".to_string(),
            hostname_ip: "10.0.0.5".to_string(),
            ssh_port: "22".to_string(),
            ssh_key_path: "/etc/quarry/pki/salt-bootstrap".to_string(),
            sudo_required: true,
            control_plane: true,
            workload_plane: false,
        };

        let manifest = spec.to_manifest();
        assert_eq!(manifest.kind.as_deref(), Some("Node"));
        assert_eq!(
            manifest.metadata.labels.get(VERSION_LABEL).map(String::as_str),
            Some("2.11.5")
        );
        assert!(manifest.metadata.labels.contains_key(ROLE_MASTER));
        assert!(!manifest.metadata.labels.contains_key(ROLE_NODE));
        assert_eq!(manifest.spec.taints.len(), 1);
        assert_eq!(manifest.spec.taints[0].effect, "NoSchedule");
        assert_eq!(
            manifest.metadata.annotations.get("quarry.io/ssh-sudo").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn test_manifest_serializes_without_status() {
        let manifest = CreateNodeSpec {
            name: "node-1".to_string(),
            ..Default::default()
        }
        .to_manifest();
        let json = serde_json::to_value(&manifest).unwrap();
        assert!(json.get("status").is_none());
        assert_eq!(json["metadata"]["name"], "node-1");
    }
}
