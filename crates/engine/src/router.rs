//! Call routing.
//!
//! A [`Router`] is the root of a navigable graph over the catalog:
//!
//! ```text
//! root ─┬─ <label or id>               → FlowHandle (global scope)
//!       ├─ <provider>                  → ProviderNamespace ── <name> → FlowHandle
//!       └─ teams ── <team>             → TeamNamespace     ── <name> → FlowHandle
//! ```
//!
//! Navigating never fails and never resolves anything; only a flow handle
//! resolves, when it is prepared or called.

use std::fmt;

use datacube_registry::{CatalogError, Flow, FlowCatalog};
use datacube_types::{InvokeRequest, Scope};
use serde_json::{Map as JsonMap, Value};
use tracing::debug;

use crate::executor::FlowExecutor;
use crate::invoke::{self, CallError};

/// Reserved root member exposing the team namespaces.
pub const TEAMS_MEMBER: &str = "teams";

/// Root of the call graph for one catalog and executor.
pub struct Router<'a, E: ?Sized> {
    catalog: &'a FlowCatalog,
    executor: &'a E,
}

impl<E: ?Sized> Clone for Router<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ?Sized> Copy for Router<'_, E> {}

impl<E: ?Sized> fmt::Debug for Router<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("catalog", self.catalog).finish_non_exhaustive()
    }
}

/// What a root member name refers to.
#[derive(Debug)]
pub enum Member<'a, E: ?Sized> {
    /// The name resolved to a flow in the global scope.
    Flow(FlowHandle<'a, E>),
    /// The name did not resolve, so it is treated as a provider namespace.
    Namespace(ProviderNamespace<'a, E>),
    Teams(TeamsNamespace<'a, E>),
}

impl<'a, E: FlowExecutor + ?Sized> Router<'a, E> {
    pub fn new(catalog: &'a FlowCatalog, executor: &'a E) -> Self {
        Self { catalog, executor }
    }

    pub fn catalog(&self) -> &'a FlowCatalog {
        self.catalog
    }

    /// Property-style access on the root.
    ///
    /// `teams` is reserved. Any other name is first resolved in the global
    /// scope; when nothing matches, the name becomes a provider namespace,
    /// whether or not that provider exists. Only reading the catalog can fail.
    pub fn member(&self, name: &str) -> Result<Member<'a, E>, CatalogError> {
        if name == TEAMS_MEMBER {
            return Ok(Member::Teams(self.teams()));
        }
        match self.catalog.resolve(&Scope::Global, name)?.found() {
            Some(flow) => Ok(Member::Flow(FlowHandle::bound(*self, flow))),
            None => {
                debug!(name, "root member is not a flow; using provider namespace");
                Ok(Member::Namespace(self.namespace(name)))
            }
        }
    }

    /// Key-style access by raw backend id (or any global-scope identifier).
    /// Resolution happens when the handle is used.
    pub fn by_id(&self, id: &str) -> FlowHandle<'a, E> {
        FlowHandle::lookup(*self, Scope::Global, id)
    }

    /// The namespace of provider `name`. Never fails.
    pub fn namespace(&self, name: &str) -> ProviderNamespace<'a, E> {
        ProviderNamespace {
            router: *self,
            name: name.to_string(),
        }
    }

    /// The `teams` namespace.
    pub fn teams(&self) -> TeamsNamespace<'a, E> {
        TeamsNamespace { router: *self }
    }

    /// Routes a dotted path such as `testeMeu`, `datacube.consultaCnhCompleta`
    /// or `teams.teamfoiiii.teste` to a flow handle.
    pub fn route(&self, path: &str) -> Result<FlowHandle<'a, E>, CallError> {
        let segments: Vec<&str> = path.split('.').map(str::trim).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(CallError::route(path, "empty path segment"));
        }

        match segments.as_slice() {
            [TEAMS_MEMBER, team, name] => Ok(self.teams().team(team).flow(name)),
            [TEAMS_MEMBER, ..] => Err(CallError::route(path, "expected teams.<team>.<flow>")),
            [name] => match self.member(name)? {
                Member::Flow(handle) => Ok(handle),
                Member::Namespace(namespace) => Ok(namespace.as_flow()),
                Member::Teams(_) => Err(CallError::route(path, "expected teams.<team>.<flow>")),
            },
            [provider, name] => Ok(self.namespace(provider).flow(name)),
            _ => Err(CallError::route(path, "too many segments")),
        }
    }
}

/// A provider namespace. Navigable, and callable as the provider's flow of
/// the same name.
#[derive(Debug)]
pub struct ProviderNamespace<'a, E: ?Sized> {
    router: Router<'a, E>,
    name: String,
}

impl<'a, E: FlowExecutor + ?Sized> ProviderNamespace<'a, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flow `name` under this provider.
    pub fn flow(&self, name: &str) -> FlowHandle<'a, E> {
        FlowHandle::lookup(self.router, Scope::Provider(self.name.clone()), name)
    }

    /// The handle used when the namespace itself is called.
    pub fn as_flow(&self) -> FlowHandle<'a, E> {
        self.flow(&self.name)
    }

    pub async fn call(&self, inputs: JsonMap<String, Value>, version: Option<&str>) -> Result<Value, CallError> {
        self.as_flow().call(inputs, version).await
    }
}

/// The `teams` namespace. Navigable only.
#[derive(Debug)]
pub struct TeamsNamespace<'a, E: ?Sized> {
    router: Router<'a, E>,
}

impl<'a, E: FlowExecutor + ?Sized> TeamsNamespace<'a, E> {
    pub fn team(&self, name: &str) -> TeamNamespace<'a, E> {
        TeamNamespace {
            router: self.router,
            name: name.to_string(),
        }
    }
}

/// One team's namespace. Navigable only.
#[derive(Debug)]
pub struct TeamNamespace<'a, E: ?Sized> {
    router: Router<'a, E>,
    name: String,
}

impl<'a, E: FlowExecutor + ?Sized> TeamNamespace<'a, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flow `name` in this team, matched by label.
    pub fn flow(&self, name: &str) -> FlowHandle<'a, E> {
        FlowHandle::lookup(self.router, Scope::Team(self.name.clone()), name)
    }
}

#[derive(Debug, Clone)]
enum Target<'a> {
    /// Already resolved while navigating the root.
    Bound(&'a Flow),
    Lookup { scope: Scope, identifier: String },
}

/// A callable flow reference.
#[derive(Debug)]
pub struct FlowHandle<'a, E: ?Sized> {
    router: Router<'a, E>,
    target: Target<'a>,
}

impl<'a, E: FlowExecutor + ?Sized> FlowHandle<'a, E> {
    fn bound(router: Router<'a, E>, flow: &'a Flow) -> Self {
        Self {
            router,
            target: Target::Bound(flow),
        }
    }

    fn lookup(router: Router<'a, E>, scope: Scope, identifier: &str) -> Self {
        Self {
            router,
            target: Target::Lookup {
                scope,
                identifier: identifier.to_string(),
            },
        }
    }

    /// Scope the handle resolves under.
    pub fn scope(&self) -> Scope {
        match &self.target {
            Target::Bound(_) => Scope::Global,
            Target::Lookup { scope, .. } => scope.clone(),
        }
    }

    /// Resolves the handle to a flow without calling it.
    pub fn resolve(&self) -> Result<&'a Flow, CallError> {
        match &self.target {
            Target::Bound(flow) => Ok(*flow),
            Target::Lookup { scope, identifier } => Ok(self.router.catalog.resolve(scope, identifier)?.into_result()?),
        }
    }

    /// Resolves the handle and builds the outbound request without sending it.
    pub fn prepare(&self, inputs: JsonMap<String, Value>, version: Option<&str>) -> Result<InvokeRequest, CallError> {
        Ok(invoke::prepare(self.resolve()?, inputs, version))
    }

    /// Resolves the handle and invokes the flow. Resolution errors are
    /// returned before the executor is touched.
    pub async fn call(&self, inputs: JsonMap<String, Value>, version: Option<&str>) -> Result<Value, CallError> {
        let flow = self.resolve()?;
        Ok(invoke::invoke(self.router.executor, flow, inputs, version).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use datacube_registry::{CatalogSource, FlowRecord, ResolveError};
    use datacube_types::TransportError;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<InvokeRequest>>);

    #[async_trait]
    impl FlowExecutor for Recorder {
        async fn execute(&self, request: InvokeRequest) -> Result<Value, TransportError> {
            let flow_id = request.flow_id.clone();
            self.0.lock().unwrap().push(request);
            Ok(json!({ "flow_id": flow_id }))
        }
    }

    impl Recorder {
        fn sent(&self) -> Vec<InvokeRequest> {
            self.0.lock().unwrap().clone()
        }
    }

    fn catalog() -> FlowCatalog {
        FlowCatalog::from_records(vec![
            FlowRecord::provided("consulta-cnh-completa-1764938995458-45nr1u", "Consulta Cnh Completa", "DataCube"),
            FlowRecord::provided(
                "consulta-cnh-paran-completa-1764938995458-45nr1u",
                "Consulta Cnh Paraná Completa",
                "Consultas de Veículos",
            ),
            FlowRecord::provided("acme-1764938995458", "Acme", "Acme"),
            FlowRecord::personal("teste-meu-1765010906589-46sxz2", "teste Meu"),
            FlowRecord::team("teste-1765010906589-46sxz2", "teste", "teamfoiiii"),
        ])
    }

    #[tokio::test]
    async fn root_label_binds_a_global_flow() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        let Member::Flow(handle) = router.member("testeMeu").unwrap() else {
            panic!("expected a flow");
        };
        handle.call(JsonMap::new(), None).await.unwrap();

        assert_eq!(recorder.sent()[0].flow_id, "teste-meu-1765010906589-46sxz2");
        assert_eq!(recorder.sent()[0].version, None);
    }

    #[tokio::test]
    async fn raw_ids_resolve_from_the_root() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        let result = router
            .by_id("consulta_cnh_completa_1764938995458_45nr1u")
            .call(JsonMap::new(), Some("3"))
            .await
            .unwrap();

        assert_eq!(result["flow_id"], "consulta-cnh-completa-1764938995458-45nr1u");
        assert_eq!(recorder.sent()[0].version.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn provider_paths_resolve_within_the_provider() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        let Member::Namespace(namespace) = router.member("consultasdeveiculos").unwrap() else {
            panic!("expected a namespace");
        };
        namespace.flow("consultaCnhParanaCompleta").call(JsonMap::new(), None).await.unwrap();

        assert_eq!(recorder.sent()[0].flow_id, "consulta-cnh-paran-completa-1764938995458-45nr1u");
    }

    #[tokio::test]
    async fn unknown_namespaces_only_fail_when_called() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        let handle = router.namespace("ghost").flow("testeMeu");
        let error = handle.call(JsonMap::new(), None).await.unwrap_err();

        assert!(matches!(
            error,
            CallError::Resolve(ResolveError::NotFoundUnderScope { ref scope, ref identifier })
                if scope == "ghost" && identifier == "testeMeu"
        ));
        assert!(recorder.sent().is_empty(), "resolution errors must not reach the executor");
    }

    #[tokio::test]
    async fn calling_a_namespace_calls_its_namesake_flow() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        router.namespace("acme").call(JsonMap::new(), None).await.unwrap();
        assert_eq!(recorder.sent()[0].flow_id, "acme-1764938995458");

        let error = router.namespace("datacube").call(JsonMap::new(), None).await.unwrap_err();
        assert!(matches!(error, CallError::Resolve(ResolveError::NotFoundUnderScope { .. })));
    }

    #[tokio::test]
    async fn team_paths_resolve_by_label() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        let Member::Teams(teams) = router.member(TEAMS_MEMBER).unwrap() else {
            panic!("expected teams");
        };
        teams.team("TeamFoiiii").flow("teste").call(JsonMap::new(), None).await.unwrap();
        assert_eq!(recorder.sent()[0].flow_id, "teste-1765010906589-46sxz2");

        let by_id = teams.team("teamfoiiii").flow("teste-1765010906589-46sxz2").resolve();
        assert!(matches!(by_id, Err(CallError::Resolve(ResolveError::NotFoundUnderScope { .. }))));
    }

    #[test]
    fn dotted_paths_route_to_scopes() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        assert_eq!(router.route("testeMeu").unwrap().scope(), Scope::Global);
        assert_eq!(
            router.route("datacube.consultaCnhCompleta").unwrap().scope(),
            Scope::Provider("datacube".into())
        );
        assert_eq!(
            router.route("teams.teamfoiiii.teste").unwrap().scope(),
            Scope::Team("teamfoiiii".into())
        );
        assert_eq!(router.route("acme").unwrap().scope(), Scope::Provider("acme".into()));

        for bad in ["teams", "teams.x", "a..b", "a.b.c"] {
            assert!(matches!(router.route(bad), Err(CallError::Route { .. })), "{} should not route", bad);
        }
    }

    #[test]
    fn prepare_builds_the_outbound_request() {
        let catalog = catalog();
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        let mut inputs = JsonMap::new();
        inputs.insert("cpf".into(), json!("123"));
        let request = router.route("datacube.consultaCnhCompleta").unwrap().prepare(inputs, Some("")).unwrap();

        assert_eq!(request.flow_id, "consulta-cnh-completa-1764938995458-45nr1u");
        assert_eq!(request.version, None);
        assert!(recorder.sent().is_empty());
    }

    struct CountingSource(AtomicUsize);

    impl CatalogSource for CountingSource {
        fn load(&self) -> Result<Vec<FlowRecord>, CatalogError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![FlowRecord::personal("teste-meu-1", "teste Meu")])
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    #[test]
    fn navigation_does_not_load_the_catalog() {
        let catalog = FlowCatalog::new(CountingSource(AtomicUsize::new(0)));
        let recorder = Recorder::default();
        let router = Router::new(&catalog, &recorder);

        let _ = router.namespace("ghost").flow("anything");
        let _ = router.teams().team("ops").flow("deploy");
        let _ = router.by_id("teste-meu-1");
        assert!(!catalog.is_loaded());

        router.by_id("teste-meu-1").resolve().unwrap();
        router.route("testeMeu").unwrap();
        assert!(catalog.is_loaded());
    }
}
