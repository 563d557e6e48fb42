//! Package API endpoints

use crate::OrchestratorClient;
use crate::error::{ClientError, Result};
use courier_core::domain::package::Package;
use courier_core::dto::package::PackageQuery;
use reqwest::multipart::{Form, Part};

impl OrchestratorClient {
    /// Upload a package version, replacing any earlier upload of it
    ///
    /// # Returns
    /// The package id (`<file_name>:<version>`)
    pub async fn upload_package(
        &self,
        file_name: &str,
        version: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String> {
        let part = Part::bytes(body)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| ClientError::InvalidRequest(format!("Bad content type: {}", e)))?;
        let form = Form::new()
            .text("version", version.to_string())
            .part("body", part);

        let response = self
            .client
            .post(self.url("/packages"))
            .multipart(form)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch a package with its body
    ///
    /// The latest version is returned when `version` is `None`.
    pub async fn get_package(&self, file_name: &str, version: Option<&str>) -> Result<Package> {
        let url = self.url(&format!("/packages/{}", file_name));
        let response = self
            .client
            .get(&url)
            .query(&PackageQuery {
                version: version.map(str::to_string),
            })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// List package metadata
    pub async fn list_packages(&self) -> Result<Vec<Package>> {
        let response = self.client.get(self.url("/packages")).send().await?;

        self.handle_response(response).await
    }
}
