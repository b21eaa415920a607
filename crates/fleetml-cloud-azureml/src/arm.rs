//! Azure Resource Manager control plane
//!
//! Read-only REST client for the `Microsoft.MachineLearningServices`
//! resource provider. Uses Bearer token authentication.

use crate::credential::{AzureCliCredential, StaticTokenCredential, TokenCredential};
use async_trait::async_trait;
use fleetml_cloud::{
    ControlPlane, ControlPlaneError, ControlPlaneFactory, EnvironmentVersion, ModelVersion,
    OnlineDeployment, OnlineEndpoint, Scope, VersionContainer, VersionFamily, Workspace,
};
use serde::Deserialize;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const ARM_ENDPOINT: &str = "https://management.azure.com";
pub const API_VERSION: &str = "2024-04-01";

const PROVIDER: &str = "Microsoft.MachineLearningServices";

/// ARM control plane client
pub struct ArmControlPlane {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
}

impl ArmControlPlane {
    pub fn new(credential: Arc<dyn TokenCredential>) -> Self {
        Self::with_base_url(ARM_ENDPOINT, credential)
    }

    /// Point the client at another ARM endpoint (sovereign clouds, tests)
    pub fn with_base_url(base_url: impl Into<String>, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: API_VERSION.to_string(),
            credential,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `…/workspaces/{ws}/<segments>` for `scope`, each segment percent-encoded
    pub fn resource_url(&self, scope: &Scope, segments: &[&str]) -> Result<Url, ControlPlaneError> {
        let invalid = || ControlPlaneError::Transport(format!("invalid ARM endpoint '{}'", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;

        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend([
                "subscriptions",
                scope.subscription_id(),
                "resourceGroups",
                scope.resource_group(),
                "providers",
                PROVIDER,
                "workspaces",
                scope.workspace(),
            ])
            .extend(segments);

        Ok(url)
    }

    fn family_segment(family: VersionFamily) -> &'static str {
        match family {
            VersionFamily::Environment => "environments",
            VersionFamily::Model => "models",
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        scope: &Scope,
        segments: &[&str],
        what: &str,
    ) -> Result<T, ControlPlaneError> {
        let url = self.resource_url(scope, segments)?;
        let token = self
            .credential
            .token()
            .await
            .map_err(|e| ControlPlaneError::Authentication(e.to_string()))?;

        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .query(&[("api-version", self.api_version.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ControlPlaneError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ControlPlaneError::NotFound(what.to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ControlPlaneError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&body);
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    ControlPlaneError::Authentication(message)
                }
                _ => ControlPlaneError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| ControlPlaneError::Decode(format!("{}: {}", what, e)))
    }
}

/// Message of an ARM error body, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl ControlPlane for ArmControlPlane {
    async fn get_workspace(&self, scope: &Scope) -> Result<Workspace, ControlPlaneError> {
        self.get(scope, &[], &format!("workspace {}", scope.workspace()))
            .await
    }

    async fn get_container(
        &self,
        scope: &Scope,
        family: VersionFamily,
        name: &str,
    ) -> Result<VersionContainer, ControlPlaneError> {
        let segments = [Self::family_segment(family), name];
        self.get(scope, &segments, &format!("{} {}", family, name))
            .await
    }

    async fn get_environment_version(
        &self,
        scope: &Scope,
        name: &str,
        version: &str,
    ) -> Result<EnvironmentVersion, ControlPlaneError> {
        let segments = ["environments", name, "versions", version];
        self.get(scope, &segments, &format!("environment {}:{}", name, version))
            .await
    }

    async fn get_model_version(
        &self,
        scope: &Scope,
        name: &str,
        version: &str,
    ) -> Result<ModelVersion, ControlPlaneError> {
        let segments = ["models", name, "versions", version];
        self.get(scope, &segments, &format!("model {}:{}", name, version))
            .await
    }

    async fn get_online_endpoint(
        &self,
        scope: &Scope,
        name: &str,
    ) -> Result<OnlineEndpoint, ControlPlaneError> {
        let segments = ["onlineEndpoints", name];
        self.get(scope, &segments, &format!("online endpoint {}", name))
            .await
    }

    async fn get_online_deployment(
        &self,
        scope: &Scope,
        endpoint: &str,
        deployment: &str,
    ) -> Result<OnlineDeployment, ControlPlaneError> {
        let segments = ["onlineEndpoints", endpoint, "deployments", deployment];
        self.get(
            scope,
            &segments,
            &format!("online deployment {}/{}", endpoint, deployment),
        )
        .await
    }
}

/// Where ARM tokens come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    AzureCli,
    Static(StaticTokenCredential),
}

impl CredentialSource {
    /// `AZURE_ACCESS_TOKEN` when set, otherwise the Azure CLI
    pub fn from_env() -> Self {
        match StaticTokenCredential::from_env() {
            Ok(credential) => CredentialSource::Static(credential),
            Err(_) => CredentialSource::AzureCli,
        }
    }

    fn credential(&self, subscription_id: &str) -> Arc<dyn TokenCredential> {
        match self {
            CredentialSource::AzureCli => Arc::new(AzureCliCredential::new(subscription_id)),
            CredentialSource::Static(credential) => Arc::new(credential.clone()),
        }
    }
}

/// Builds [`ArmControlPlane`] clients for a subscription
pub struct ArmControlPlaneFactory {
    base_url: String,
    source: CredentialSource,
}

impl ArmControlPlaneFactory {
    pub fn new(source: CredentialSource) -> Self {
        Self {
            base_url: ARM_ENDPOINT.to_string(),
            source,
        }
    }

    pub fn from_env() -> Self {
        Self::new(CredentialSource::from_env())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ControlPlaneFactory for ArmControlPlaneFactory {
    async fn connect(
        &self,
        subscription_id: &str,
    ) -> Result<Arc<dyn ControlPlane>, ControlPlaneError> {
        let credential = self.source.credential(subscription_id);

        // Fail here rather than on the first read
        credential.token().await?;
        tracing::debug!("Acquired ARM token for subscription {}", subscription_id);

        Ok(Arc::new(ArmControlPlane::with_base_url(
            self.base_url.clone(),
            credential,
        )))
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[allow(dead_code)]
    #[serde(default)]
    code: String,
    message: String,
}
