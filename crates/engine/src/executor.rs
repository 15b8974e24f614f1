use async_trait::async_trait;
use datacube_api::DataCubeClient;
use datacube_types::{InvokeRequest, TransportError};
use serde_json::Value;
use tracing::debug;

/// Sends a fully resolved invocation to the backend.
///
/// Implementations must not alter the request and must report failures as
/// they happened; the engine hands results back to the caller unchanged.
#[async_trait]
pub trait FlowExecutor: Send + Sync {
    async fn execute(&self, request: InvokeRequest) -> Result<Value, TransportError>;
}

#[async_trait]
impl FlowExecutor for DataCubeClient {
    async fn execute(&self, request: InvokeRequest) -> Result<Value, TransportError> {
        DataCubeClient::execute(self, &request).await
    }
}

/// Executor that echoes the outbound payload instead of sending it. Used for
/// `--dry-run` previews and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl FlowExecutor for DryRunExecutor {
    async fn execute(&self, request: InvokeRequest) -> Result<Value, TransportError> {
        debug!(flow_id = %request.flow_id, "dry run; request not sent");
        serde_json::to_value(&request).map_err(|error| TransportError::decode(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map as JsonMap, json};

    use super::*;

    #[tokio::test]
    async fn dry_run_echoes_the_wire_payload() {
        let request = InvokeRequest::new("flow-1", JsonMap::new(), Some("2"));
        let echoed = DryRunExecutor.execute(request).await.unwrap();
        assert_eq!(echoed, json!({ "flow_id": "flow-1", "inputs": {}, "version": "2" }));
    }
}
