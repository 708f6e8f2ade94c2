//! HTTP client for the upstream absence API.
//!
//! Every call carries the caller's bearer token and a fresh `X-Request-Id`.
//! Success bodies are unwrapped from the `{ "data": ... }` envelope; error
//! bodies are mapped onto [`StoreError`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::lifecycle::store::{AbsenceStore, LeaveBalanceStore, StoreError};
use crate::model::absence::{
    AbsenceDraft, AbsenceFilters, AbsencePage, AbsenceRequest, ProcessAction,
};
use crate::model::id::Id;
use crate::model::leave_balance::{BalanceUpdate, LeaveBalance};
use crate::models::{Envelope, ErrorBody};

/// Upstream client bound to one session token.
#[derive(Clone)]
pub struct AbsenceApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl AbsenceApi {
    /// Reuses a shared [`reqwest::Client`] so sessions share one connection pool.
    pub fn with_client(client: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, path, %request_id, "Upstream call");
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.token)
            .header("X-Request-Id", request_id)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, StoreError> {
        let response = self
            .request(reqwest::Method::GET, path)
            .query(query)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self.request(method, path).json(body).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(StoreError::Unauthorized),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound),
            _ => {
                let body = response.text().await.unwrap_or_default();
                let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
                Err(StoreError::Rejected {
                    status: status.as_u16(),
                    message: parsed.message.or(parsed.error).unwrap_or_default(),
                })
            }
        }
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), StoreError> {
        Self::ensure_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl AbsenceStore for AbsenceApi {
    #[instrument(skip(self))]
    async fn list(&self, filters: &AbsenceFilters) -> Result<AbsencePage, StoreError> {
        self.fetch("/absences", &filters.to_query()).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &Id) -> Result<AbsenceRequest, StoreError> {
        self.fetch(&format!("/absences/{id}"), &[]).await
    }

    #[instrument(skip(self))]
    async fn create(&self, draft: &AbsenceDraft) -> Result<AbsenceRequest, StoreError> {
        self.send_json(reqwest::Method::POST, "/absences", draft)
            .await
    }

    #[instrument(skip(self))]
    async fn update(&self, id: &Id, draft: &AbsenceDraft) -> Result<AbsenceRequest, StoreError> {
        self.send_json(reqwest::Method::PUT, &format!("/absences/{id}"), draft)
            .await
    }

    #[instrument(skip(self, comments))]
    async fn process(
        &self,
        id: &Id,
        action: ProcessAction,
        comments: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/absences/{id}/process"))
            .json(&json!({ "action": action, "comments": comments }))
            .send()
            .await?;
        Self::check_status(response).await
    }

    #[instrument(skip(self))]
    async fn cancel(&self, id: &Id) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/absences/{id}"))
            .send()
            .await?;
        Self::check_status(response).await
    }
}

#[async_trait]
impl LeaveBalanceStore for AbsenceApi {
    #[instrument(skip(self))]
    async fn current_balance(&self, year: i32) -> Result<LeaveBalance, StoreError> {
        self.fetch("/leave-balances/me", &[("year", year.to_string())])
            .await
    }

    #[instrument(skip(self))]
    async fn employee_balance(
        &self,
        employee_id: &Id,
        year: i32,
    ) -> Result<LeaveBalance, StoreError> {
        self.fetch(
            &format!("/leave-balances/{employee_id}"),
            &[("year", year.to_string())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn team_balances(
        &self,
        department_id: Option<&str>,
        year: i32,
    ) -> Result<Vec<LeaveBalance>, StoreError> {
        let mut query = vec![("year", year.to_string())];
        if let Some(department_id) = department_id.map(str::trim).filter(|d| !d.is_empty()) {
            query.push(("departmentId", department_id.to_string()));
        }
        self.fetch("/leave-balances/team", &query).await
    }

    #[instrument(skip(self))]
    async fn update_balance(
        &self,
        employee_id: &Id,
        update: &BalanceUpdate,
    ) -> Result<LeaveBalance, StoreError> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/leave-balances/{employee_id}"),
            update,
        )
        .await
    }
}
