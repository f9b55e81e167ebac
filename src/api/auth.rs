//! OAuth-authenticated API client.
//!
//! Requests carry the cached bearer token. A `401` triggers one token
//! refresh followed by exactly one retry of the original request:
//!
//! ```text
//! attempt -> 401 -> refresh (refresh_token grant, else client_credentials) -> retry once
//! ```
//!
//! The token exchange itself goes straight to the transport, so it can never
//! re-enter the refresh path.

use super::token::{OauthToken, TokenStore};
use super::transport::{HttpRequest, HttpResponse, RequestBody, Transport};
use crate::error::{LabelError, LabelResult};
use serde_json::Value;

/// Path of the token endpoint relative to the API base URL.
pub const TOKEN_PATH: &str = "oauth_token";

const UNAUTHORIZED: u16 = 401;

/// OAuth client credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// Grant used for a token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    RefreshToken(String),
    ClientCredentials,
}

impl Grant {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::RefreshToken(_) => "refresh_token",
            Self::ClientCredentials => "client_credentials",
        }
    }
}

/// API client that attaches and refreshes OAuth tokens.
pub struct AuthenticatedClient<T, S> {
    base_url: String,
    credentials: ClientCredentials,
    transport: T,
    tokens: S,
}

impl<T: Transport, S: TokenStore> AuthenticatedClient<T, S> {
    pub fn new(
        base_url: impl Into<String>,
        credentials: ClientCredentials,
        transport: T,
        tokens: S,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            transport,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a path against the base URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// POSTs a JSON body and decodes the JSON response.
    pub fn post_json(&self, path: &str, body: Value) -> LabelResult<Value> {
        let request = HttpRequest::post(self.url(path), RequestBody::Json(body));
        let response = self.send(&request)?;
        serde_json::from_str(&response.body)
            .map_err(|e| LabelError::json(format!("decoding response of {}", request.url), e))
    }

    /// Sends a request with the cached token, refreshing and retrying once on 401.
    pub fn send(&self, request: &HttpRequest) -> LabelResult<HttpResponse> {
        let cached = self.tokens.read()?;
        let response = self.transport.send(&with_bearer(request, cached.as_ref()))?;
        if response.status != UNAUTHORIZED {
            return check_status(&request.url, response);
        }

        log::info!("{} returned 401, refreshing token", request.url);
        let token = self.refresh()?;
        let retried = self.transport.send(&with_bearer(request, Some(&token)))?;
        if retried.status == UNAUTHORIZED {
            return Err(LabelError::Unauthorized {
                url: request.url.clone(),
            });
        }
        check_status(&request.url, retried)
    }

    /// Obtains and stores a new token.
    ///
    /// Uses the cached refresh token when there is one and falls back to
    /// the client credentials grant if that exchange fails.
    pub fn refresh(&self) -> LabelResult<OauthToken> {
        let refresh_token = self.tokens.read()?.and_then(|t| t.refresh_token);

        let token = match refresh_token {
            Some(refresh_token) => match self.exchange(&Grant::RefreshToken(refresh_token)) {
                Ok(token) => token,
                Err(e) => {
                    log::warn!("refresh token exchange failed ({}), using client credentials", e);
                    self.exchange(&Grant::ClientCredentials)?
                }
            },
            None => self.exchange(&Grant::ClientCredentials)?,
        };

        self.tokens.store(&token)?;
        log::info!("stored new {} token", token.token_type);
        Ok(token)
    }

    /// Performs one token exchange without touching the store.
    pub fn exchange(&self, grant: &Grant) -> LabelResult<OauthToken> {
        let mut form = Vec::new();
        if let Grant::RefreshToken(refresh_token) = grant {
            form.push(("refresh_token".to_string(), refresh_token.clone()));
        }
        form.push(("grant_type".to_string(), grant.grant_type().to_string()));
        form.push(("client_id".to_string(), self.credentials.client_id.clone()));
        form.push((
            "client_secret".to_string(),
            self.credentials.client_secret.clone(),
        ));

        let url = self.url(TOKEN_PATH);
        let request = HttpRequest::post(url.clone(), RequestBody::Form(form));
        let response = self.transport.send(&request)?;
        if !response.is_success() {
            return Err(LabelError::Auth {
                reason: format!(
                    "{} grant rejected with HTTP {}",
                    grant.grant_type(),
                    response.status
                ),
            });
        }

        let token: OauthToken = serde_json::from_str(&response.body)
            .map_err(|e| LabelError::json(format!("decoding token from {}", url), e))?;
        if !token.ok || token.access_token.is_empty() {
            return Err(LabelError::Auth {
                reason: format!("{} grant returned no token", grant.grant_type()),
            });
        }
        Ok(token)
    }
}

fn with_bearer(request: &HttpRequest, token: Option<&OauthToken>) -> HttpRequest {
    let mut request = request.clone();
    request
        .headers
        .retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
    if let Some(token) = token {
        request
            .headers
            .push(("Authorization".to_string(), format!("Bearer {}", token.access_token)));
    }
    request
}

fn check_status(url: &str, response: HttpResponse) -> LabelResult<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(LabelError::Http {
            url: url.to_string(),
            status: response.status,
            body: response.body,
        })
    }
}
