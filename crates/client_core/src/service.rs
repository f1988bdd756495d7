//! Client side of the remote session service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{RespondentProfile, SessionId},
    error::{ErrorBody, ServiceError, ServiceOperation},
    protocol::{
        HealthResponse, LoadProgressResponse, QuestionnaireResponse, RegisterResponse,
        ResultPayload, SaveProgressRequest, SubmitRequest,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::config::{parse_base_url, ClientSettings};

#[async_trait]
pub trait RemoteSessionService: Send + Sync {
    async fn register(
        &self,
        profile: &RespondentProfile,
    ) -> Result<RegisterResponse, ServiceError>;
    async fn fetch_questionnaire(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<QuestionnaireResponse, ServiceError>;
    async fn save_progress(&self, request: &SaveProgressRequest) -> Result<(), ServiceError>;
    async fn load_progress(
        &self,
        session_id: &SessionId,
    ) -> Result<LoadProgressResponse, ServiceError>;
    async fn submit(&self, request: &SubmitRequest) -> Result<ResultPayload, ServiceError>;
    async fn health_check(&self) -> Result<HealthResponse, ServiceError>;
}

pub struct HttpSessionService {
    http: Client,
    base_url: Url,
}

impl HttpSessionService {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_settings(settings: &ClientSettings) -> anyhow::Result<Self> {
        Self::new(&settings.api_base_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base url is always an http(s) base.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        operation: ServiceOperation,
        request: RequestBuilder,
    ) -> Result<Response, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|err| ServiceError::Transport {
                operation,
                detail: err.to_string(),
            })?;

        let status = response.status();
        debug!(?operation, status = status.as_u16(), "session service responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = if operation.reads_error_body() {
            response.json::<ErrorBody>().await.unwrap_or_default()
        } else {
            ErrorBody::default()
        };
        let err = ServiceError::rejected(operation, status.as_u16(), body);
        warn!(?operation, status = status.as_u16(), "session service rejected request: {err}");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: ServiceOperation,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = self.send(operation, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ServiceError::Transport {
                operation,
                detail: err.to_string(),
            })?;
        serde_json::from_slice(&bytes).map_err(|err| ServiceError::Decode {
            operation,
            detail: err.to_string(),
        })
    }
}

#[async_trait]
impl RemoteSessionService for HttpSessionService {
    async fn register(
        &self,
        profile: &RespondentProfile,
    ) -> Result<RegisterResponse, ServiceError> {
        let request = self
            .http
            .post(self.endpoint(&["api", "register"]))
            .json(profile);
        self.send_json(ServiceOperation::Register, request).await
    }

    async fn fetch_questionnaire(
        &self,
        session_id: Option<&SessionId>,
    ) -> Result<QuestionnaireResponse, ServiceError> {
        let mut request = self.http.get(self.endpoint(&["api", "questionnaire"]));
        if let Some(session_id) = session_id {
            request = request.query(&[("session_id", session_id.as_str())]);
        }
        self.send_json(ServiceOperation::FetchQuestionnaire, request)
            .await
    }

    async fn save_progress(&self, request: &SaveProgressRequest) -> Result<(), ServiceError> {
        let request = self
            .http
            .post(self.endpoint(&["api", "save-progress"]))
            .json(request);
        self.send(ServiceOperation::SaveProgress, request).await?;
        Ok(())
    }

    async fn load_progress(
        &self,
        session_id: &SessionId,
    ) -> Result<LoadProgressResponse, ServiceError> {
        let request = self
            .http
            .get(self.endpoint(&["api", "load-progress", session_id.as_str()]));
        self.send_json(ServiceOperation::LoadProgress, request).await
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<ResultPayload, ServiceError> {
        let request = self
            .http
            .post(self.endpoint(&["api", "submit"]))
            .json(request);
        self.send_json(ServiceOperation::Submit, request).await
    }

    async fn health_check(&self) -> Result<HealthResponse, ServiceError> {
        let request = self.http.get(self.endpoint(&["api", "health"]));
        self.send_json(ServiceOperation::HealthCheck, request).await
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
