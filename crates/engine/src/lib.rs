//! # DataCube Engine
//!
//! Turns identifiers typed by a caller into flow invocations.
//!
//! - **`router`**: the navigable root → namespace → flow graph over the catalog
//! - **`invoke`**: composes a resolved flow with inputs and version into one
//!   outbound request
//! - **`executor`**: the transport seam ([`FlowExecutor`]) plus the HTTP and
//!   dry-run implementations
//! - **`client`**: [`DataCube`], the per-instance pairing of a catalog and an
//!   executor
//!
//! ## Usage
//!
//! ```rust
//! use datacube_engine::{DataCube, DryRunExecutor, Member};
//! use datacube_registry::FlowCatalog;
//! use serde_json::Map;
//!
//! let sdk = DataCube::new(DryRunExecutor, FlowCatalog::builtin());
//! let router = sdk.router();
//!
//! let handle = router.namespace("consultasdeveiculos").flow("consultaCnhParanaCompleta");
//! let request = handle.prepare(Map::new(), None).unwrap();
//! assert_eq!(request.flow_id, "consulta-cnh-paran-completa-1764938995458-45nr1u");
//!
//! assert!(matches!(router.member("testeMeu").unwrap(), Member::Flow(_)));
//! ```

pub mod client;
pub mod executor;
pub mod invoke;
pub mod router;

pub use client::DataCube;
pub use executor::{DryRunExecutor, FlowExecutor};
pub use invoke::{CallError, invoke};
pub use router::{FlowHandle, Member, ProviderNamespace, Router, TEAMS_MEMBER, TeamNamespace, TeamsNamespace};
