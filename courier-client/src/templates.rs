//! Template-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use courier_core::domain::template::Template;
use courier_core::dto::template::CreateTemplate;

impl OrchestratorClient {
    // =============================================================================
    // Template Management
    // =============================================================================

    /// Create a new template
    pub async fn create_template(&self, req: &CreateTemplate) -> Result<Template> {
        let response = self
            .client
            .post(self.url("/templates"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Replace a template's name and steps
    pub async fn update_template(&self, id: i64, req: &CreateTemplate) -> Result<Template> {
        let url = self.url(&format!("/templates/{}", id));
        let response = self.client.put(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get a template by id
    pub async fn get_template(&self, id: i64) -> Result<Template> {
        let url = self.url(&format!("/templates/{}", id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List all templates
    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        let response = self.client.get(self.url("/templates")).send().await?;

        self.handle_response(response).await
    }

    /// Delete a template by id
    pub async fn delete_template(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/templates/{}", id));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
