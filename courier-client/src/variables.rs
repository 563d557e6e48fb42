//! Variable set API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use courier_core::domain::instance::Instance;
use courier_core::domain::variables::VariableSet;
use courier_core::dto::variables::CreateVariableSet;

impl OrchestratorClient {
    /// Create a new variable set
    pub async fn create_variable_set(&self, req: &CreateVariableSet) -> Result<VariableSet> {
        let response = self
            .client
            .post(self.url("/variables"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Replace a variable set
    pub async fn update_variable_set(&self, id: i64, req: &CreateVariableSet) -> Result<VariableSet> {
        let url = self.url(&format!("/variables/{}", id));
        let response = self.client.put(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get a variable set by id
    pub async fn get_variable_set(&self, id: i64) -> Result<VariableSet> {
        let url = self.url(&format!("/variables/{}", id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List the variable sets defined for an instance
    pub async fn find_variable_sets(&self, instance: &Instance) -> Result<Vec<VariableSet>> {
        let url = self.url(&format!(
            "/variables/{}/{}",
            instance.tenant(),
            instance.environment()
        ));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Delete a variable set by id
    pub async fn delete_variable_set(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/variables/{}", id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
