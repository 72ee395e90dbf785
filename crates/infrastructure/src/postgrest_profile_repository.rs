//! Profile records served by a PostgREST endpoint (Supabase `rest/v1`).

use async_trait::async_trait;
use quotagate_application::{ProfileRepository, ProfileUpdate};
use quotagate_core::{AppError, AppResult};
use quotagate_domain::{ProfileEntitlement, UserId};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

const PROFILES_PATH: &str = "rest/v1/profiles";

#[derive(Debug, Deserialize)]
struct ProfileEntitlementRow {
    is_pro: Option<bool>,
    pro_expires_at: Option<String>,
}

impl From<ProfileEntitlementRow> for ProfileEntitlement {
    fn from(row: ProfileEntitlementRow) -> Self {
        Self {
            is_pro: row.is_pro.unwrap_or(false),
            pro_expires_at: row.pro_expires_at,
        }
    }
}

/// PostgREST implementation of the profile repository port.
///
/// Request timeouts come from the supplied `reqwest::Client`.
#[derive(Clone)]
pub struct PostgrestProfileRepository {
    http_client: reqwest::Client,
    profiles_url: Url,
    service_key: String,
}

impl PostgrestProfileRepository {
    /// Creates a repository for the project at `base_url` using a service role key.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        service_key: impl Into<String>,
    ) -> AppResult<Self> {
        let mut base = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid profile store url '{base_url}': {error}"))
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let profiles_url = base.join(PROFILES_PATH).map_err(|error| {
            AppError::Validation(format!("invalid profile store url '{base_url}': {error}"))
        })?;

        Ok(Self {
            http_client,
            profiles_url,
            service_key: service_key.into(),
        })
    }

    fn profile_url(&self, user_id: UserId, select: Option<&str>) -> Url {
        let mut url = self.profiles_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("id", &format!("eq.{user_id}"));
            if let Some(select) = select {
                query.append_pair("select", select);
            }
        }
        url
    }

    fn health_url(&self) -> Url {
        let mut url = self.profiles_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("limit", "1");
        url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", self.service_key.as_str())
            .bearer_auth(self.service_key.as_str())
    }
}

#[async_trait]
impl ProfileRepository for PostgrestProfileRepository {
    async fn find_entitlement(&self, user_id: UserId) -> AppResult<Option<ProfileEntitlement>> {
        let url = self.profile_url(user_id, Some("is_pro,pro_expires_at"));
        let response = self
            .authorized(self.http_client.get(url))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| transport_error("fetch profile", &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("fetch profile", status));
        }

        let rows: Vec<ProfileEntitlementRow> = response.json().await.map_err(|error| {
            AppError::Internal(format!("failed to decode profile record: {error}"))
        })?;

        Ok(rows.into_iter().next().map(ProfileEntitlement::from))
    }

    async fn update_profile(&self, user_id: UserId, update: ProfileUpdate) -> AppResult<()> {
        let response = self
            .authorized(self.http_client.patch(self.profile_url(user_id, None)))
            .header("Prefer", "return=minimal")
            .json(&update_body(&update))
            .send()
            .await
            .map_err(|error| transport_error("update profile", &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("update profile", status));
        }

        Ok(())
    }

    async fn check_health(&self) -> AppResult<()> {
        let response = self
            .authorized(self.http_client.get(self.health_url()))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| transport_error("health check", &error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("health check", status));
        }

        Ok(())
    }
}

fn update_body(update: &ProfileUpdate) -> Value {
    let mut body = Map::new();
    body.insert("is_pro".to_owned(), Value::Bool(update.is_pro));
    if let Some(subscription_id) = &update.subscription_id {
        body.insert(
            "subscription_id".to_owned(),
            Value::String(subscription_id.clone()),
        );
    }
    if let Some(customer_id) = &update.customer_id {
        body.insert("customer_id".to_owned(), Value::String(customer_id.clone()));
    }
    body.insert(
        "updated_at".to_owned(),
        Value::String(update.updated_at.to_rfc3339()),
    );
    Value::Object(body)
}

fn transport_error(operation: &str, error: &reqwest::Error) -> AppError {
    AppError::Unavailable(format!("profile store {operation} failed: {error}"))
}

fn status_error(operation: &str, status: reqwest::StatusCode) -> AppError {
    if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        AppError::Unavailable(format!("profile store {operation} returned {status}"))
    } else {
        AppError::Internal(format!("profile store {operation} returned {status}"))
    }
}
