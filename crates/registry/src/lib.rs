//! Flow catalog and name resolution for the DataCube SDK.
//!
//! This crate owns the in-memory catalog of remote flows, the rules that
//! classify them into official, provider, team and personal groups, and the
//! resolver that maps a caller-supplied identifier to exactly one flow.

pub mod catalog;
pub mod config;
pub mod listing;
pub mod resolver;
pub mod source;

pub use catalog::{Flow, FlowCatalog, FlowGroup, OFFICIAL_PROVIDER_KEYS};
pub use config::{ConfigError, SdkConfig};
pub use datacube_types::{FlowRecord, Scope};
pub use listing::{CatalogListing, ListingEntry};
pub use resolver::{Resolution, ResolveError, resolve};
pub use source::{CatalogError, CatalogSource, FileCatalogSource, StaticCatalogSource};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// The built-in catalog must load, keep unique ids, and give every flow a
    /// non-empty label so each one is reachable by name.
    #[test]
    fn builtin_catalog_non_empty_and_unique_ids() {
        let catalog = FlowCatalog::builtin();
        let flows = catalog.all_flows().expect("load builtin catalog");
        assert!(!flows.is_empty(), "builtin catalog should not be empty");

        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = flows
            .iter()
            .filter(|flow| !seen.insert(flow.id.as_str()))
            .map(|flow| flow.id.as_str())
            .collect();
        assert!(duplicates.is_empty(), "duplicate ids: {:?}", duplicates);
        assert!(flows.iter().all(|flow| !flow.label.is_empty()));
    }
}
