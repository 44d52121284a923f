//! Exposes a `Client` struct to interact with the API.

use std::time::{Duration, Instant};

use anyhow::Context;
use parking_lot::Mutex;
use reqwest::header::CONTENT_TYPE;
use reqwest::tls::Version;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, Error, Result};
use super::model::{
    self, Challenge, Login, Message, NewMessage, NewPassport, Passport, Register, Trust,
    Verification,
};

/// Production API.
pub const DEFAULT_BASE_URL: &str = "https://api.agentpass.space";

/// Applies to every request, connecting included.
pub const TIMEOUT: Duration = Duration::from_secs(30);

fn elapsed_ms(start: &Instant) -> u128 {
    start.elapsed().as_millis()
}

/// Whether a request carries the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Send `Authorization: Bearer <token>` if a token is set
    Bearer,
    /// Never send `Authorization`
    Anonymous,
}

pub struct Client {
    /// Use to make REST requests
    client: reqwest::Client,
    /// Example: `https://api.agentpass.space`, never ends with `/`
    base_url: String,
    /// Set by `register` and `login`
    token: Mutex<Option<String>>,
}

impl Client {
    /// Create a new client to interact with the AgentPass API.
    ///
    /// `base_url` defaults to [`DEFAULT_BASE_URL`], trailing slashes are removed.
    pub fn new(base_url: Option<&str>, token: Option<&str>) -> Result<Client> {
        let client = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .min_tls_version(Version::TLS_1_2)
            .build()?;

        Ok(Client {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            token: Mutex::new(token.map(str::to_string)),
        })
    }

    /// Create a client from `AGENTPASS_BASE_URL` and `AGENTPASS_TOKEN`.
    ///
    /// Variables are looked up in the environment and the `.env` file,
    /// missing ones fall back to the defaults of [`Client::new`].
    pub fn from_env() -> anyhow::Result<Client> {
        fn resolve_var(key: &str) -> Option<String> {
            dotenv::var(key).ok().filter(|s| !s.is_empty())
        }

        let base_url = resolve_var("AGENTPASS_BASE_URL");
        let token = resolve_var("AGENTPASS_TOKEN");
        if token.is_none() {
            log::debug!("AGENTPASS_TOKEN not set, starting without a token");
        }

        Client::new(base_url.as_deref(), token.as_deref())
            .context("invalid http client configuration")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.lock() = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.lock() = None;
    }

    /// Example: `client.make_url("/passports")` will produce
    /// `https://api.agentpass.space/passports`
    pub fn make_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request_with<T, F>(
        &self,
        url: &str,
        method: Method,
        auth: Auth,
        func: F,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let now = Instant::now();
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json");

        if auth == Auth::Bearer {
            if let Some(token) = self.token.lock().as_deref().filter(|t| !t.is_empty()) {
                builder = builder.bearer_auth(token);
            }
        }
        builder = func(builder);

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        log::info!(
            "{} request to {} ({}) took {}ms",
            method,
            url,
            status.as_u16(),
            elapsed_ms(&now),
        );

        if !status.is_success() {
            let err = ApiError::from_response(status, &text);
            log::warn!("{} {} failed with status {}", method, url, status.as_u16());
            return Err(err.into());
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Send one request to `path` and parse the JSON response.
    ///
    /// Returns `None` if the server answered `204 No Content`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: Option<&B>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.make_url(path);
        self.request_with(&url, method, auth, |req| match body {
            Some(body) => req.json(body),
            None => req,
        })
        .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, auth: Auth) -> Result<Option<T>> {
        self.request::<T, ()>(Method::GET, path, auth, None).await
    }

    async fn post<T, B>(&self, path: &str, auth: Auth, body: &B) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.request(Method::POST, path, auth, Some(body)).await
    }

    /// Store the token of an auth response and hand it back.
    fn accept_token(&self, name: &'static str, resp: Option<Value>) -> Result<String> {
        let token = resp
            .as_ref()
            .and_then(model::token_of)
            .ok_or(Error::MissingToken(name))?
            .to_string();
        *self.token.lock() = Some(token.clone());
        Ok(token)
    }

    /// Register a new account. Sets and returns the auth token.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<String> {
        let body = Register {
            email,
            password,
            name,
        };
        let resp = self.post("/auth/register", Auth::Anonymous, &body).await?;
        let token = self.accept_token("register", resp)?;
        log::debug!("registered {}", email);
        Ok(token)
    }

    /// Log in. Sets and returns the auth token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let body = Login { email, password };
        let resp = self.post("/auth/login", Auth::Anonymous, &body).await?;
        let token = self.accept_token("login", resp)?;
        log::debug!("logged in as {}", email);
        Ok(token)
    }

    /// Create a new passport.
    pub async fn create_passport(&self, name: &str, public_key: &str) -> Result<Option<Passport>> {
        let body = NewPassport { name, public_key };
        self.post("/passports", Auth::Bearer, &body).await
    }

    /// Get passport details.
    pub async fn get_passport(&self, passport_id: &str) -> Result<Option<Passport>> {
        self.get(&format!("/passports/{}", passport_id), Auth::Bearer)
            .await
    }

    /// Get the public part of a passport, never authenticated.
    pub async fn get_public_passport(&self, passport_id: &str) -> Result<Option<Passport>> {
        self.get(&format!("/passports/{}/public", passport_id), Auth::Anonymous)
            .await
    }

    /// Verify a signature of `challenge` against the passport's public key.
    pub async fn verify(
        &self,
        passport_id: &str,
        challenge: &str,
        signature: &str,
    ) -> Result<Option<Verification>> {
        let body = Challenge {
            challenge,
            signature,
        };
        self.post(
            &format!("/passports/{}/verify", passport_id),
            Auth::Anonymous,
            &body,
        )
        .await
    }

    /// Get the trust score of a passport.
    pub async fn get_trust(&self, passport_id: &str) -> Result<Option<Trust>> {
        self.get(&format!("/passports/{}/trust", passport_id), Auth::Bearer)
            .await
    }

    /// Send a message from one passport to another.
    pub async fn send_message(
        &self,
        from_id: &str,
        to_id: &str,
        subject: &str,
        body: &str,
    ) -> Result<Option<Message>> {
        let body = NewMessage {
            from: from_id,
            to: to_id,
            subject,
            body,
        };
        self.post("/messages", Auth::Bearer, &body).await
    }

    /// Get the inbox of a passport.
    pub async fn get_messages(&self, passport_id: &str) -> Result<Option<Vec<Message>>> {
        self.get(&format!("/passports/{}/messages", passport_id), Auth::Bearer)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{Client, DEFAULT_BASE_URL};

    #[test]
    fn default_base_url() {
        let client = Client::new(None, None).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.token(), None);
    }

    #[test]
    fn strips_trailing_slashes() {
        let client = Client::new(Some("http://localhost:8080//"), None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.make_url("/auth/login"),
            "http://localhost:8080/auth/login"
        );
    }

    #[test]
    fn token_accessors() {
        let client = Client::new(None, Some("t")).unwrap();
        assert_eq!(client.token().as_deref(), Some("t"));

        client.set_token("u");
        assert_eq!(client.token().as_deref(), Some("u"));

        client.clear_token();
        assert_eq!(client.token(), None);
    }
}
