//! Minimal PostgREST client: reads, inserts, deletes and RPC calls.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::SupabaseConfig;
use crate::domain::auth::Session;

/// Media type that makes PostgREST answer with one object instead of an
/// array, and fail with `PGRST116` when zero (or several) rows match.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Errors from a PostgREST call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PostgrestError {
    /// PostgREST (or Postgres behind it) answered with an error body.
    #[error("PostgREST error {code} (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The request never got an answer, or the answer was unreadable.
    #[error("PostgREST transport error: {0}")]
    Transport(String),
}

impl PostgrestError {
    /// No row matched a single-object request.
    pub const NO_ROWS: &'static str = "PGRST116";
    /// Postgres `unique_violation`.
    pub const UNIQUE_VIOLATION: &'static str = "23505";

    pub fn code(&self) -> Option<&str> {
        match self {
            PostgrestError::Api { code, .. } => Some(code),
            PostgrestError::Transport(_) => None,
        }
    }

    pub fn is_no_rows(&self) -> bool {
        self.code() == Some(Self::NO_ROWS)
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code() == Some(Self::UNIQUE_VIOLATION)
    }
}

impl From<reqwest::Error> for PostgrestError {
    fn from(err: reqwest::Error) -> Self {
        PostgrestError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Credential sent in the `Authorization` header.
#[derive(Debug, Clone)]
enum Caller {
    /// Nobody signed in; the anon key doubles as the bearer.
    Anon,
    /// A signed-in user's access token.
    User(SecretString),
    /// The service-role key. Bypasses row-level security.
    ServiceRole(SecretString),
}

/// Table access over the PostgREST HTTP API.
///
/// A client is bound to one caller. [`PostgrestClient::for_caller`] derives
/// a client for a request's session; the HTTP connection pool is shared
/// between all of them.
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    config: SupabaseConfig,
    http: reqwest::Client,
    caller: Caller,
}

impl PostgrestClient {
    /// A client calling as the anonymous role.
    pub fn new(config: SupabaseConfig) -> reqwest::Result<Self> {
        let http = config.http_client()?;
        Ok(Self {
            config,
            http,
            caller: Caller::Anon,
        })
    }

    /// The same client calling with a user's access token.
    pub fn as_user(&self, access_token: &str) -> Self {
        Self {
            caller: Caller::User(SecretString::new(access_token.to_string())),
            ..self.clone()
        }
    }

    /// The same client calling with the service-role key, if one is
    /// configured. Callers derived from it keep the service role.
    pub fn as_service_role(&self) -> Option<Self> {
        let key = self.config.service_role_key.clone()?;
        Some(Self {
            caller: Caller::ServiceRole(key),
            ..self.clone()
        })
    }

    /// Client for a request: the session's token when signed in, the anon
    /// role otherwise. A service-role client is returned unchanged.
    pub fn for_caller(&self, session: Option<&Session>) -> Self {
        match (&self.caller, session) {
            (Caller::ServiceRole(_), _) => self.clone(),
            (_, Some(session)) => self.as_user(&session.access_token),
            (_, None) => Self {
                caller: Caller::Anon,
                ..self.clone()
            },
        }
    }

    pub fn is_service_role(&self) -> bool {
        matches!(self.caller, Caller::ServiceRole(_))
    }

    /// `GET /rest/v1/{table}?select=...&{column}=eq.{value}...` expecting one row.
    pub async fn select_single<T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        filters: &[(&str, &str)],
    ) -> Result<T, PostgrestError> {
        let response = self
            .authorised(self.http.get(self.config.rest_url(table)))
            .header(ACCEPT, SINGLE_OBJECT)
            .query(&select_query(columns, filters))
            .send()
            .await?;

        let response = check(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// True when at least one row matches every filter.
    pub async fn exists(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<bool, PostgrestError> {
        let mut query = select_query("*", filters);
        query.push(("limit".to_string(), "1".to_string()));

        let response = self
            .authorised(self.http.get(self.config.rest_url(table)))
            .query(&query)
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = check(response).await?.json().await?;
        Ok(!rows.is_empty())
    }

    /// `POST /rest/v1/{table}` without reading the row back.
    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), PostgrestError> {
        let response = self
            .authorised(self.http.post(self.config.rest_url(table)))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// `DELETE /rest/v1/{table}?{column}=eq.{value}...`
    ///
    /// Deleting nothing is not an error.
    pub async fn delete(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<(), PostgrestError> {
        let response = self
            .authorised(self.http.delete(self.config.rest_url(table)))
            .query(&eq_filters(filters))
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// `POST /rest/v1/rpc/{function}` with named arguments, ignoring the result.
    pub async fn rpc<A: Serialize + ?Sized>(
        &self,
        function: &str,
        args: &A,
    ) -> Result<(), PostgrestError> {
        let response = self
            .authorised(self.http.post(self.config.rpc_url(function)))
            .json(args)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    fn authorised(&self, request: RequestBuilder) -> RequestBuilder {
        let anon = self.config.anon_key();
        let (apikey, bearer) = match &self.caller {
            Caller::Anon => (anon, anon),
            Caller::User(token) => (anon, token.expose_secret().as_str()),
            Caller::ServiceRole(key) => {
                let key = key.expose_secret().as_str();
                (key, key)
            }
        };
        request
            .header("apikey", apikey)
            .header(AUTHORIZATION, format!("Bearer {}", bearer))
    }
}

fn eq_filters(filters: &[(&str, &str)]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|(column, value)| (column.to_string(), format!("eq.{}", value)))
        .collect()
}

fn select_query(columns: &str, filters: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut query = vec![("select".to_string(), columns.to_string())];
    query.extend(eq_filters(filters));
    query
}

async fn check(response: Response) -> Result<Response, PostgrestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(parse_error(status.as_u16(), &text))
}

fn parse_error(status: u16, body: &str) -> PostgrestError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|b| b.code.clone())
        .unwrap_or_else(|| format!("HTTP_{}", status));
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.to_string());
    PostgrestError::Api {
        status,
        code,
        message,
    }
}
