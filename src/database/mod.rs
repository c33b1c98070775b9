//! Firebase Realtime Database module.
//!
//! This module talks to the Realtime Database REST API, where every node of the
//! JSON tree is addressable as `https://<database>/<path>.json`.
//!
//! It mirrors the shape of the client SDKs: `FirebaseDatabase::root()` and
//! `FirebaseDatabase::reference()` hand out `DatabaseReference`s, `child()` walks
//! deeper, and reads come back as `DataSnapshot`s.
//!
//! # Authentication
//!
//! Three modes are supported:
//!
//! * `FirebaseDatabase::new` uses a service account and sends an OAuth2 bearer token.
//! * `FirebaseDatabase::with_secret` sends a database secret or ID token as the `auth`
//!   query parameter.
//! * `FirebaseDatabase::unauthenticated` sends nothing, for the emulator or public rules.
//!
//! Every request is sent exactly once. Callers that want transient-failure
//! retries build their own client with `build_client` and `new_with_client`.

pub mod memory;
pub mod reference;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod tests;

use self::reference::{split_path, validate_key, DatabaseReference};
use crate::core::middleware::AuthMiddleware;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;
use url::Url;

/// Errors that can occur during Realtime Database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// Errors returned by the Realtime Database API.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// A path segment is not a legal database key.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    /// The database URL could not be parsed.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Client for interacting with a Firebase Realtime Database instance.
pub struct FirebaseDatabase {
    client: ClientWithMiddleware,
    base_url: Url,
    auth: Option<String>,
    namespace: Option<String>,
}

/// Builds the HTTP client used by the constructors.
///
/// Requests are sent once unless `max_retries` is non-zero, in which case
/// transient failures (5xx, 408, 429, connection errors) are retried with
/// exponential backoff. Pass the result to `FirebaseDatabase::new_with_client`.
pub fn build_client(
    middleware: Option<AuthMiddleware>,
    max_retries: u32,
) -> ClientWithMiddleware {
    let mut builder = ClientBuilder::new(Client::new());

    if max_retries > 0 {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        builder = builder.with(RetryTransientMiddleware::new_with_policy(retry_policy));
    }

    match middleware {
        Some(middleware) => builder.with(middleware).build(),
        None => builder.build(),
    }
}

impl FirebaseDatabase {
    /// Creates a new `FirebaseDatabase` authenticated with a service account.
    ///
    /// This is typically called via `FirebaseApp::database()`.
    ///
    /// # Arguments
    ///
    /// * `middleware` - The service-account auth middleware.
    /// * `database_url` - The database URL, e.g. `https://my-db.firebaseio.com`.
    pub fn new(middleware: AuthMiddleware, database_url: &str) -> Result<Self, DatabaseError> {
        Self::new_with_client(build_client(Some(middleware), 0), database_url)
    }

    /// Creates a new `FirebaseDatabase` that authenticates with a database secret or ID token.
    pub fn with_secret(database_url: &str, secret: &str) -> Result<Self, DatabaseError> {
        let mut db = Self::new_with_client(build_client(None, 0), database_url)?;
        db.auth = Some(secret.to_string());
        Ok(db)
    }

    /// Creates a new `FirebaseDatabase` that sends no credentials.
    pub fn unauthenticated(database_url: &str) -> Result<Self, DatabaseError> {
        Self::new_with_client(build_client(None, 0), database_url)
    }

    /// Creates a new `FirebaseDatabase` with a custom client (useful for testing).
    pub fn new_with_client(
        client: ClientWithMiddleware,
        database_url: &str,
    ) -> Result<Self, DatabaseError> {
        let base_url = Url::parse(database_url)?;
        if base_url.cannot_be_a_base() {
            return Err(DatabaseError::InvalidPath(format!(
                "{} cannot be used as a database URL",
                database_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            auth: None,
            namespace: None,
        })
    }

    /// Routes requests to the given namespace via the `ns` query parameter.
    ///
    /// The emulator uses this to pick the database when it is served from `localhost`.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// The database URL requests are sent to.
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    /// Gets a `DatabaseReference` to the root of the database.
    pub fn root(&self) -> DatabaseReference<'_> {
        DatabaseReference {
            database: self,
            path: Vec::new(),
        }
    }

    /// Gets a `DatabaseReference` for the location at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The slash-separated path (e.g., "users/alice").
    pub fn reference(&self, path: &str) -> DatabaseReference<'_> {
        DatabaseReference {
            database: self,
            path: split_path(path),
        }
    }

    pub(crate) fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }

    /// Builds the REST URL for a node: `<base>/<k1>/.../<kn>.json?auth=..&ns=..`.
    pub(crate) fn node_url(&self, path: &[String]) -> Result<Url, DatabaseError> {
        for key in path {
            validate_key(key)?;
        }

        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                DatabaseError::InvalidPath(format!("{} cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty();
            match path.split_last() {
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{}.json", last));
                }
                None => {
                    segments.push(".json");
                }
            }
        }

        if self.auth.is_some() || self.namespace.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(auth) = &self.auth {
                query.append_pair("auth", auth);
            }
            if let Some(ns) = &self.namespace {
                query.append_pair("ns", ns);
            }
        }

        Ok(url)
    }
}
