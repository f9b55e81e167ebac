//! HTTP transport seam.
//!
//! The API client only speaks [`HttpRequest`]/[`HttpResponse`]; the default
//! [`UreqTransport`] sends them over the network.

use crate::error::{LabelError, LabelResult};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// `application/x-www-form-urlencoded` key/value pairs
    Form(Vec<(String, String)>),
}

/// A POST request; every merch and OAuth endpoint is a POST.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn post(url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns a form field, if this is a form request.
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(pairs) => pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests. Any status code is a response; only failures to get one
/// are errors.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> LabelResult<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> LabelResult<HttpResponse> {
        (**self).send(request)
    }
}

/// Blocking transport backed by a [`ureq::Agent`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    fn read_body(url: &str, response: ureq::Response) -> LabelResult<HttpResponse> {
        let status = response.status();
        let body = response.into_string().map_err(|e| LabelError::Network {
            url: url.to_string(),
            reason: format!("failed to read response: {}", e),
        })?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> LabelResult<HttpResponse> {
        let mut call = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            RequestBody::Json(value) => call
                .set("Content-Type", "application/json")
                .send_string(&value.to_string()),
            RequestBody::Form(pairs) => {
                let pairs: Vec<(&str, &str)> = pairs
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str()))
                    .collect();
                call.send_form(&pairs)
            }
        };

        match result {
            Ok(response) => Self::read_body(&request.url, response),
            Err(ureq::Error::Status(_, response)) => Self::read_body(&request.url, response),
            Err(ureq::Error::Transport(e)) => Err(LabelError::Network {
                url: request.url.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
