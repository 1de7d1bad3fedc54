//! Watch stream wire types.
//!
//! The API server pushes one JSON object per line:
//! `{"type": "ADDED" | "MODIFIED" | "DELETED" | "ERROR", "object": {...}}`.
//! Only the fields the tracker needs are modelled; everything else in the
//! EndpointSlice is ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// The full endpoint membership of one EndpointSlice at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSnapshot {
    #[serde(default)]
    pub metadata: SnapshotMeta,

    #[serde(default)]
    pub address_type: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub endpoints: Vec<EndpointMember>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<EndpointPort>,
}

impl EndpointSnapshot {
    /// Port of the first declared port definition, if any.
    pub fn primary_port(&self) -> Option<u16> {
        self.ports.first().and_then(|p| p.port)
    }

    /// Slice name for log lines.
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SnapshotMeta {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default, rename = "resourceVersion")]
    pub resource_version: Option<String>,
}

/// One member of a slice: a backing process reachable on one or more addresses.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointMember {
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub conditions: Option<EndpointConditions>,

    #[serde(default)]
    pub target_ref: Option<TargetRef>,

    #[serde(default)]
    pub node_name: Option<String>,
}

impl EndpointMember {
    /// Readiness, defaulting to not ready when unreported.
    pub fn is_ready(&self) -> bool {
        self.conditions
            .as_ref()
            .and_then(|c| c.ready)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EndpointConditions {
    #[serde(default)]
    pub ready: Option<bool>,
}

/// Reference to the pod backing an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TargetRef {
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EndpointPort {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub protocol: Option<String>,
}

/// A single record from the watch stream.
///
/// Receipt order is authoritative; events are never reordered or merged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "object", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Added(EndpointSnapshot),
    Modified(EndpointSnapshot),
    Deleted(EndpointSnapshot),
    /// Server-side watch error. The payload is usually a `Status` object.
    Error(serde_json::Value),
}

impl ChangeEvent {
    /// Wire name of the event type.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Added(_) => "ADDED",
            ChangeEvent::Modified(_) => "MODIFIED",
            ChangeEvent::Deleted(_) => "DELETED",
            ChangeEvent::Error(_) => "ERROR",
        }
    }

    /// The snapshot carried by the event, `None` for errors.
    pub fn snapshot(&self) -> Option<&EndpointSnapshot> {
        match self {
            ChangeEvent::Added(s) | ChangeEvent::Modified(s) | ChangeEvent::Deleted(s) => Some(s),
            ChangeEvent::Error(_) => None,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
