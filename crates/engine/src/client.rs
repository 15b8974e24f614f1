use std::env;

use anyhow::Result;
use datacube_api::{API_BASE_ENV, API_KEY_ENV, DataCubeClient};
use datacube_registry::{CatalogError, CatalogListing, FlowCatalog, SdkConfig};

use crate::executor::FlowExecutor;
use crate::router::Router;

/// One SDK instance: an executor plus the catalog snapshot it resolves
/// against. The catalog is loaded on first use and kept for the lifetime of
/// the instance; a new instance sees a fresh snapshot.
#[derive(Debug)]
pub struct DataCube<E = DataCubeClient> {
    executor: E,
    catalog: FlowCatalog,
}

impl DataCube<DataCubeClient> {
    /// Builds an HTTP-backed instance. Environment variables take precedence
    /// over values from the config file.
    pub fn from_config(config: &SdkConfig) -> Result<Self> {
        let api_key = env::var(API_KEY_ENV).ok().or_else(|| config.api_key.clone());
        let api_base = env::var(API_BASE_ENV).ok().or_else(|| config.api_base.clone());
        let client = DataCubeClient::new(api_key.as_deref(), api_base.as_deref())?;
        Ok(Self::new(client, config.catalog()))
    }
}

impl<E: FlowExecutor> DataCube<E> {
    pub fn new(executor: E, catalog: FlowCatalog) -> Self {
        Self { executor, catalog }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn catalog(&self) -> &FlowCatalog {
        &self.catalog
    }

    /// The root of the call graph.
    pub fn router(&self) -> Router<'_, E> {
        Router::new(&self.catalog, &self.executor)
    }

    /// Help text listing every reachable flow.
    pub fn help(&self) -> Result<String, CatalogError> {
        Ok(CatalogListing::from_flows(self.catalog.all_flows()?).render_help())
    }
}
