//! Courier HTTP Client
//!
//! A typed HTTP client for the Courier orchestrator API, shared by the agent
//! and the operator CLI.
//!
//! # Example
//!
//! ```no_run
//! use courier_client::OrchestratorClient;
//! use courier_core::domain::instance::Instance;
//! use courier_core::dto::execution::CreateExecution;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OrchestratorClient::new("http://localhost:8080");
//!
//!     let id = client.create_execution(&CreateExecution {
//!         template_id: 1,
//!         variable_set_id: None,
//!         instance: Instance::new("Some", "Prod"),
//!         variable_overrides: Default::default(),
//!     }).await?;
//!
//!     println!("Created execution: {}", id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod executions;
mod packages;
mod templates;
mod variables;

pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Courier orchestrator API
///
/// Every route lives under `/api/v1`:
/// - `/executions`: create with supersede, long-poll `check` per instance,
///   step reports (`PUT /executions/{id}?result=`), get and list
/// - `/templates`: step list CRUD
/// - `/variables`: variable sets, also looked up by `{tenant}/{environment}`
/// - `/packages`: multipart upload, latest-version lookup, metadata list
///
/// A long-poll `check` outlives a default request timeout, so a custom
/// `reqwest::Client` should only bound connecting (see [`Self::with_client`]).
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    ///
    /// # Example
    /// ```
    /// use courier_client::OrchestratorClient;
    ///
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client around a preconfigured `reqwest::Client`
    ///
    /// The agent passes one with a connect timeout only; `check` sets its own
    /// per-request timeout from the requested long-poll window.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Versioned API URL for `path` (e.g. `/executions/7`)
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Deserialize a successful JSON body, or map the status to `ApiError`
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// For routes answering without a body (step reports, deletes)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    /// Orchestrator errors carry `{"error": message}`; the raw body is kept as the message
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}
