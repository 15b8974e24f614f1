//! Shared types for the DataCube SDK.
//!
//! These are the records exchanged between the catalog, the resolver, the
//! call router and the transport. They carry no behavior beyond
//! (de)serialization and small constructors.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

/// A raw flow entry as delivered by a catalog source.
///
/// Field aliases accept the wire names used by the flow directory
/// (`name`, `provider_name`, `team_name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Stable backend identifier, unique within one catalog snapshot.
    pub id: String,
    /// Human-readable name. May contain accents, spaces and punctuation.
    #[serde(alias = "name", default)]
    pub display_name: String,
    /// Third-party provider owning the flow, if any.
    #[serde(alias = "provider_name", default)]
    pub provider_name: Option<String>,
    /// Team namespace owning the flow, if any.
    #[serde(alias = "team_name", default)]
    pub team_name: Option<String>,
}

impl FlowRecord {
    /// Builds a personal flow record with no provider or team.
    pub fn personal(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider_name: None,
            team_name: None,
        }
    }

    /// Builds a provider-owned flow record.
    pub fn provided(id: impl Into<String>, display_name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            provider_name: Some(provider.into()),
            ..Self::personal(id, display_name)
        }
    }

    /// Builds a team-owned flow record.
    pub fn team(id: impl Into<String>, display_name: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            team_name: Some(team.into()),
            ..Self::personal(id, display_name)
        }
    }
}

/// Context an identifier is looked up under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// No namespace: personal flows first, then any flow by id.
    #[default]
    Global,
    /// A provider namespace, named as the caller typed it.
    Provider(String),
    /// A team namespace, named as the caller typed it.
    Team(String),
}

impl Scope {
    /// The scope name as the caller supplied it, or `None` for the global scope.
    pub fn name(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Provider(name) | Scope::Team(name) => Some(name),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Provider(name) => write!(f, "provider '{}'", name),
            Scope::Team(name) => write!(f, "team '{}'", name),
        }
    }
}

/// Fully determined outbound invocation payload.
///
/// `version` is omitted from the serialized body when absent so the
/// backend falls back to the latest version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub flow_id: String,
    #[serde(default)]
    pub inputs: JsonMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl InvokeRequest {
    /// Composes a request, dropping blank version selectors.
    pub fn new(flow_id: impl Into<String>, inputs: JsonMap<String, Value>, version: Option<&str>) -> Self {
        let version = version.filter(|v| !v.trim().is_empty()).map(str::to_string);
        Self {
            flow_id: flow_id.into(),
            inputs,
            version,
        }
    }
}

/// Failures reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("request failed {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("network error: {message}")]
    Network { message: String },

    /// A success response could not be decoded as JSON.
    #[error("invalid response body: {message}")]
    Decode { message: String },
}

impl TransportError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into() }
    }
}
