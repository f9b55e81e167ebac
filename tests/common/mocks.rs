//! Scripted HTTP transport for API tests.

use bandlabels::api::{HttpRequest, HttpResponse, OauthToken, Transport};
use bandlabels::{LabelError, LabelResult};
use serde_json::json;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Transport answering requests from a queue and recording what was sent.
#[derive(Default)]
pub struct MockTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next response.
    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .borrow_mut()
            .push_back(HttpResponse::new(status, body));
        self
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    /// URLs of the requests sent so far.
    pub fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.url.clone()).collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> LabelResult<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| LabelError::Network {
                url: request.url.clone(),
                reason: "no scripted response left".to_string(),
            })
    }
}

/// Token endpoint response body.
pub fn token_body(access_token: &str, refresh_token: Option<&str>) -> String {
    json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "ok": true,
    })
    .to_string()
}

/// A cached token.
pub fn token(access_token: &str, refresh_token: Option<&str>) -> OauthToken {
    OauthToken {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        ok: true,
    }
}
