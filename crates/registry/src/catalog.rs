use std::fmt;

use datacube_types::{FlowRecord, Scope};
use datacube_util::{labelize, optional_key};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::resolver::{Resolution, resolve};
use crate::source::{CatalogError, CatalogSource, StaticCatalogSource};

/// Provider keys owned by the platform itself. Flows under these keys are
/// listed as official rather than third-party.
pub const OFFICIAL_PROVIDER_KEYS: &[&str] = &["datacube"];

/// A catalog entry with its derived lookup keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    /// Stable backend identifier.
    pub id: String,
    /// Human-readable name as delivered by the source.
    pub display_name: String,
    pub provider_name: Option<String>,
    pub team_name: Option<String>,
    /// Normalized provider name; `None` when the flow has no provider.
    pub provider_key: Option<String>,
    /// Normalized team name; `None` when the flow has no team.
    pub team_key: Option<String>,
    /// Camel-case label derived from the display name. Empty when the
    /// display name has nothing usable, in which case the flow is only
    /// reachable by id.
    pub label: String,
}

/// Grouping a flow is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowGroup {
    Official,
    Provider,
    Team,
    Personal,
}

impl fmt::Display for FlowGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowGroup::Official => "official",
            FlowGroup::Provider => "provider",
            FlowGroup::Team => "team",
            FlowGroup::Personal => "personal",
        };
        f.write_str(name)
    }
}

impl Flow {
    /// Derives the lookup keys for a raw record.
    pub fn from_record(record: FlowRecord) -> Self {
        let provider_key = optional_key(record.provider_name.as_deref());
        let team_key = optional_key(record.team_name.as_deref());
        let label = labelize(&record.display_name);
        if label.is_empty() {
            warn!(flow_id = %record.id, "flow has no usable display name; reachable by id only");
        }
        Self {
            id: record.id,
            display_name: record.display_name,
            provider_name: record.provider_name,
            team_name: record.team_name,
            provider_key,
            team_key,
            label,
        }
    }

    /// Classifies the flow. Provider ownership wins over team ownership.
    pub fn group(&self) -> FlowGroup {
        match (&self.provider_key, &self.team_key) {
            (Some(key), _) if OFFICIAL_PROVIDER_KEYS.contains(&key.as_str()) => FlowGroup::Official,
            (Some(_), _) => FlowGroup::Provider,
            (None, Some(_)) => FlowGroup::Team,
            (None, None) => FlowGroup::Personal,
        }
    }

    /// True for flows owned by neither a provider nor a team.
    pub fn is_direct(&self) -> bool {
        self.provider_key.is_none() && self.team_key.is_none()
    }
}

/// Lazily loaded, memoized flow catalog.
///
/// The source is read at most once per catalog: the first successful load is
/// stored and every later call returns the same ordered slice. Concurrent
/// first access is serialized by the cell, and a failed load stores nothing,
/// so the catalog is never observed partially populated.
pub struct FlowCatalog {
    source: Box<dyn CatalogSource>,
    flows: OnceCell<Vec<Flow>>,
}

impl fmt::Debug for FlowCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowCatalog")
            .field("source", &self.source.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl FlowCatalog {
    /// Creates an unloaded catalog backed by `source`.
    pub fn new(source: impl CatalogSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            flows: OnceCell::new(),
        }
    }

    /// Creates a catalog over an in-memory list of records.
    pub fn from_records(records: Vec<FlowRecord>) -> Self {
        Self::new(StaticCatalogSource::new(records))
    }

    /// Creates a catalog over the SDK's built-in flow list.
    pub fn builtin() -> Self {
        Self::new(StaticCatalogSource::builtin())
    }

    /// Whether the source has been read yet.
    pub fn is_loaded(&self) -> bool {
        self.flows.get().is_some()
    }

    /// Returns every flow in source order, loading the source on first use.
    pub fn all_flows(&self) -> Result<&[Flow], CatalogError> {
        let flows = self.flows.get_or_try_init(|| {
            debug!(source = %self.source.describe(), "loading flow catalog");
            let records = self.source.load()?;
            let flows: Vec<Flow> = records.into_iter().map(Flow::from_record).collect();
            debug!(count = flows.len(), "flow catalog loaded");
            Ok::<_, CatalogError>(flows)
        })?;
        Ok(flows.as_slice())
    }

    /// Looks up `identifier` under `scope`. See [`resolve`] for the rules.
    pub fn resolve(&self, scope: &Scope, identifier: &str) -> Result<Resolution<'_>, CatalogError> {
        Ok(resolve(self.all_flows()?, scope, identifier))
    }
}
