use datacube_registry::{CatalogError, Flow, ResolveError};
use datacube_types::{InvokeRequest, TransportError};
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;
use tracing::debug;

use crate::executor::FlowExecutor;

/// Failure of a flow call.
///
/// Resolution failures are raised before anything is sent; transport
/// failures carry the executor's error untouched.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid flow path '{path}': {reason}")]
    Route { path: String, reason: String },
}

impl CallError {
    pub fn route(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Route {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Builds the outbound request for `flow`.
///
/// A missing or blank `version` leaves the field out of the payload entirely.
pub fn prepare(flow: &Flow, inputs: JsonMap<String, Value>, version: Option<&str>) -> InvokeRequest {
    InvokeRequest::new(flow.id.clone(), inputs, version)
}

/// Invokes `flow` through `executor` and returns its result unchanged.
pub async fn invoke<E>(executor: &E, flow: &Flow, inputs: JsonMap<String, Value>, version: Option<&str>) -> Result<Value, TransportError>
where
    E: FlowExecutor + ?Sized,
{
    let request = prepare(flow, inputs, version);
    debug!(flow_id = %request.flow_id, label = %flow.label, "invoking flow");
    executor.execute(request).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use datacube_types::FlowRecord;
    use serde_json::json;

    use super::*;

    struct FailingExecutor;

    #[async_trait]
    impl FlowExecutor for FailingExecutor {
        async fn execute(&self, _request: InvokeRequest) -> Result<Value, TransportError> {
            Err(TransportError::Status {
                status: 402,
                body: "{\"error\":\"insufficient credits\"}".into(),
            })
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<InvokeRequest>>);

    #[async_trait]
    impl FlowExecutor for Recorder {
        async fn execute(&self, request: InvokeRequest) -> Result<Value, TransportError> {
            self.0.lock().unwrap().push(request);
            Ok(json!({ "status": "ok" }))
        }
    }

    fn flow() -> Flow {
        Flow::from_record(FlowRecord::personal("teste-meu-1765010906589-46sxz2", "teste Meu"))
    }

    #[tokio::test]
    async fn sends_flow_id_inputs_and_version() {
        let recorder = Recorder::default();
        let mut inputs = JsonMap::new();
        inputs.insert("cpf".into(), json!("123"));

        let result = invoke(&recorder, &flow(), inputs.clone(), Some("v2")).await.unwrap();

        assert_eq!(result, json!({ "status": "ok" }));
        let sent = recorder.0.lock().unwrap();
        assert_eq!(sent[0].flow_id, "teste-meu-1765010906589-46sxz2");
        assert_eq!(sent[0].inputs, inputs);
        assert_eq!(sent[0].version.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn no_version_means_no_version_key() {
        let recorder = Recorder::default();
        invoke(&recorder, &flow(), JsonMap::new(), None).await.unwrap();

        let sent = recorder.0.lock().unwrap();
        let payload = serde_json::to_value(&sent[0]).unwrap();
        assert!(!payload.as_object().unwrap().contains_key("version"));
    }

    #[tokio::test]
    async fn transport_errors_pass_through_unchanged() {
        let error = invoke(&FailingExecutor, &flow(), JsonMap::new(), None).await.unwrap_err();
        assert_eq!(
            error,
            TransportError::Status {
                status: 402,
                body: "{\"error\":\"insufficient credits\"}".into()
            }
        );
    }
}
