//! Identifier resolution.
//!
//! Maps a caller-supplied identifier, looked up under a [`Scope`], to exactly
//! one flow. Identifiers are compared with [`identifiers_match`] (case
//! insensitive, `_` equals `-`); namespace names are compared by their
//! [`normalize_key`] projection.
//!
//! Precedence:
//!
//! 1. `Scope::Team(t)`: flows whose team key equals `normalize_key(t)`,
//!    matched by label only.
//! 2. `Scope::Provider(p)`: flows whose provider key equals
//!    `normalize_key(p)`, matched by label or id.
//! 3. `Scope::Global`: direct flows (no provider, no team) by label or id;
//!    failing that, any flow in the catalog by id.
//!
//! A scoped lookup never falls back to another scope. When several flows
//! match, the one with the lexicographically greatest id wins; ids carry a
//! creation timestamp, so this picks the newest.

use datacube_types::Scope;
use datacube_util::{identifiers_match, normalize_key};
use thiserror::Error;
use tracing::debug;

use crate::catalog::Flow;

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a Flow),
    /// No flow anywhere matches the identifier.
    NotFound { identifier: String },
    /// The identifier was looked up inside an explicit provider or team
    /// namespace and nothing there matches.
    NotFoundUnderScope { scope: String, identifier: String },
}

/// Resolution failure, for callers that prefer `?` over matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Flow not found: name={identifier}")]
    NotFound { identifier: String },

    #[error("Flow '{identifier}' not found under '{scope}'")]
    NotFoundUnderScope { scope: String, identifier: String },
}

impl<'a> Resolution<'a> {
    pub fn found(&self) -> Option<&'a Flow> {
        match self {
            Resolution::Found(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<&'a Flow, ResolveError> {
        match self {
            Resolution::Found(flow) => Ok(flow),
            Resolution::NotFound { identifier } => Err(ResolveError::NotFound { identifier }),
            Resolution::NotFoundUnderScope { scope, identifier } => {
                Err(ResolveError::NotFoundUnderScope { scope, identifier })
            }
        }
    }
}

/// Resolves `identifier` under `scope` against `flows`.
pub fn resolve<'a>(flows: &'a [Flow], scope: &Scope, identifier: &str) -> Resolution<'a> {
    let resolution = match scope {
        Scope::Team(team) => {
            let team_key = normalize_key(team);
            let candidates = flows
                .iter()
                .filter(|flow| flow.team_key.as_deref() == Some(team_key.as_str()))
                .filter(|flow| matches_label(flow, identifier));
            newest(candidates).map(Resolution::Found).unwrap_or_else(|| not_found_under(team, identifier))
        }
        Scope::Provider(provider) => {
            let provider_key = normalize_key(provider);
            let candidates = flows
                .iter()
                .filter(|flow| flow.provider_key.as_deref() == Some(provider_key.as_str()))
                .filter(|flow| matches_label_or_id(flow, identifier));
            newest(candidates)
                .map(Resolution::Found)
                .unwrap_or_else(|| not_found_under(provider, identifier))
        }
        Scope::Global => {
            let direct = flows
                .iter()
                .filter(|flow| flow.is_direct())
                .filter(|flow| matches_label_or_id(flow, identifier));
            newest(direct)
                .or_else(|| flows.iter().find(|flow| identifiers_match(&flow.id, identifier)))
                .map(Resolution::Found)
                .unwrap_or_else(|| Resolution::NotFound {
                    identifier: identifier.to_string(),
                })
        }
    };

    match &resolution {
        Resolution::Found(flow) => debug!(%scope, identifier, flow_id = %flow.id, "resolved flow"),
        _ => debug!(%scope, identifier, "no flow matched"),
    }
    resolution
}

fn matches_label(flow: &Flow, identifier: &str) -> bool {
    !flow.label.is_empty() && identifiers_match(&flow.label, identifier)
}

fn matches_label_or_id(flow: &Flow, identifier: &str) -> bool {
    matches_label(flow, identifier) || identifiers_match(&flow.id, identifier)
}

/// Picks the candidate with the greatest id.
fn newest<'a>(candidates: impl Iterator<Item = &'a Flow>) -> Option<&'a Flow> {
    candidates.max_by(|left, right| left.id.cmp(&right.id))
}

fn not_found_under<'a>(scope_name: &str, identifier: &str) -> Resolution<'a> {
    Resolution::NotFoundUnderScope {
        scope: scope_name.to_string(),
        identifier: identifier.to_string(),
    }
}
