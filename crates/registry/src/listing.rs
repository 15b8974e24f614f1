//! Discoverability listing.
//!
//! Groups the catalog the way people browse it and renders the help text
//! printed by `datacube list`. Nothing here takes part in resolution.

use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::{Flow, FlowGroup};

/// Methods available on every client regardless of the catalog.
pub const NATIVE_METHODS: &[&str] = &["status()", "usage()", "me()", "execute(request)", "execution_status(id)", "help()"];

/// One flow as presented to a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub display_name: String,
    pub id: String,
    /// Lookup by raw id; the recommended way to call a flow.
    pub id_path: String,
    /// Lookup by generated label, absent for flows without a usable name.
    pub label_path: Option<String>,
}

/// Catalog grouped into official, provider, team and personal flows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogListing {
    pub official: Vec<ListingEntry>,
    /// Keyed by provider key, in first-seen order.
    pub providers: IndexMap<String, Vec<ListingEntry>>,
    /// Keyed by team key, in first-seen order.
    pub teams: IndexMap<String, Vec<ListingEntry>>,
    pub personal: Vec<ListingEntry>,
}

impl CatalogListing {
    pub fn from_flows(flows: &[Flow]) -> Self {
        let mut listing = CatalogListing::default();
        for flow in flows {
            match (flow.group(), flow.provider_key.as_deref(), flow.team_key.as_deref()) {
                (FlowGroup::Official, Some(provider), _) => listing.official.push(entry(flow, Some(provider))),
                (FlowGroup::Provider, Some(provider), _) => listing
                    .providers
                    .entry(provider.to_string())
                    .or_default()
                    .push(entry(flow, Some(provider))),
                (FlowGroup::Team, _, Some(team)) => {
                    let namespace = format!("teams.{}", team);
                    listing
                        .teams
                        .entry(team.to_string())
                        .or_default()
                        .push(entry(flow, Some(namespace.as_str())));
                }
                _ => listing.personal.push(entry(flow, None)),
            }
        }
        listing
    }

    /// Renders the help text shown to users.
    pub fn render_help(&self) -> String {
        let mut out = String::from("\nDataCube SDK Help\n");

        out.push_str("\n NATIVE METHODS:\n");
        for method in NATIVE_METHODS {
            let _ = writeln!(out, "   • {} → client.{}", method, method);
        }

        out.push_str("\n FLOWS:\n");
        render_entries(&mut out, &self.personal, "   ");

        out.push_str("\n DATACUBE FLOWS:\n");
        render_entries(&mut out, &self.official, "     ");

        out.push_str("\n PROVIDER FLOWS:\n");
        for (provider, entries) in &self.providers {
            let _ = writeln!(out, "\n   {}:", provider);
            render_entries(&mut out, entries, "     ");
        }

        out.push_str("\n TEAM FLOWS:\n");
        for (team, entries) in &self.teams {
            let _ = writeln!(out, "\n   {}:", team);
            render_entries(&mut out, entries, "     ");
        }

        out
    }
}

fn entry(flow: &Flow, namespace: Option<&str>) -> ListingEntry {
    let label_path = (!flow.label.is_empty()).then(|| match namespace {
        Some(namespace) => format!("client.{}.{}", namespace, flow.label),
        None => format!("client.{}", flow.label),
    });
    ListingEntry {
        display_name: flow.display_name.clone(),
        id: flow.id.clone(),
        id_path: format!("client[\"{}\"]", flow.id),
        label_path,
    }
}

fn render_entries(out: &mut String, entries: &[ListingEntry], indent: &str) {
    for entry in entries {
        let left = format!("{}• {} →", indent, entry.display_name);
        let _ = writeln!(out, "{} {}(inputs={{ ... }}, version=null) [recommended]", left, entry.id_path);
        if let Some(label_path) = &entry.label_path {
            let pad = " ".repeat(left.chars().count() + 1);
            let _ = writeln!(out, "{}{}(inputs={{ ... }}, version=null)", pad, label_path);
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use datacube_types::FlowRecord;

    use super::*;
    use crate::FlowCatalog;

    fn listing() -> CatalogListing {
        let catalog = FlowCatalog::builtin();
        CatalogListing::from_flows(catalog.all_flows().unwrap())
    }

    #[test]
    fn groups_builtin_flows() {
        let listing = listing();
        assert_eq!(listing.official.len(), 1);
        assert_eq!(listing.providers.get("consultasdeveiculos").map(Vec::len), Some(2));
        assert_eq!(listing.teams.get("teamfoiiii").map(Vec::len), Some(1));
        assert_eq!(listing.personal.len(), 2);
    }

    #[test]
    fn paths_follow_the_router_layout() {
        let listing = listing();
        assert_eq!(
            listing.official[0].label_path.as_deref(),
            Some("client.datacube.consultaCnhCompleta")
        );
        assert_eq!(
            listing.teams["teamfoiiii"][0].label_path.as_deref(),
            Some("client.teams.teamfoiiii.teste")
        );
        assert_eq!(listing.personal[0].id_path, "client[\"teste-meu-1765010906589-46sxz2\"]");
    }

    #[test]
    fn unnamed_flows_only_list_their_id() {
        let flows = vec![Flow::from_record(FlowRecord::personal("orphan-1", "???"))];
        let listing = CatalogListing::from_flows(&flows);
        assert_eq!(listing.personal[0].label_path, None);

        let help = listing.render_help();
        assert!(help.contains("client[\"orphan-1\"]"));
    }

    #[test]
    fn help_mentions_every_section() {
        let help = listing().render_help();
        for section in ["NATIVE METHODS", "DATACUBE FLOWS", "PROVIDER FLOWS", "TEAM FLOWS", "consultasdeveiculos:"] {
            assert!(help.contains(section), "missing {:?} in help", section);
        }
        assert!(help.contains("client.testeMeu(inputs={ ... }, version=null)"));
    }
}
