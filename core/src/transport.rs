//! The network round-trip, behind a trait.
//!
//! # Design
//! A `Transport` executes one `HttpRequest` and returns the `HttpResponse`
//! as data: 4xx/5xx are responses, not errors, so status interpretation
//! stays in the builder. Only failures that yield no response at all are
//! `Err`. `UreqTransport` runs ureq's blocking agent on tokio's blocking
//! pool so callers are never blocked.
//!
//! The ureq agent keeps no cookie jar, so `with_credentials` has nothing to
//! forward: the only credential on the wire is the `Authorization` header
//! the builder chose. `response_type` and `observe` are ignored as well;
//! the full response is always read, with no body size cap.

use async_trait::async_trait;

use crate::error::GatewayError;
use ureq::typestate::WithBody;
use ureq::unversioned::multipart::{Form, Part};

use crate::http::{Body, FormData, FormPart, HttpMethod, HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError>;
}

/// Blocking ureq agent, executed off the async runtime.
///
/// `send` hands the call to `tokio::task::spawn_blocking`, so it must be
/// awaited inside a Tokio runtime; outside one it panics.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GatewayError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?
    }
}

fn execute(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, GatewayError> {
    let result = match req.method {
        HttpMethod::Get | HttpMethod::Delete => {
            let mut builder = if req.method == HttpMethod::Get {
                agent.get(&req.url)
            } else {
                agent.delete(&req.url)
            };
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()
        }
        HttpMethod::Post | HttpMethod::Put => {
            let mut builder = if req.method == HttpMethod::Post {
                agent.post(&req.url)
            } else {
                agent.put(&req.url)
            };
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            match &req.body {
                Some(Body::Json(text)) => builder.send(text.as_bytes()),
                // ureq sets the multipart content type with its boundary.
                Some(Body::Form(form)) => send_form(builder, form),
                None => builder.send_empty(),
            }
        }
    };

    let mut response = result.map_err(|e| GatewayError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn send_form(
    builder: ureq::RequestBuilder<WithBody>,
    form: &FormData,
) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let names: Vec<String> = form
        .parts()
        .iter()
        .map(|part| match part {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => disposition_param(name),
        })
        .collect();

    let mut multipart = Form::new();
    for (part, name) in form.parts().iter().zip(&names) {
        multipart = match part {
            FormPart::Text { value, .. } => multipart.text(name, value),
            FormPart::File {
                file_name,
                content_type,
                bytes,
                ..
            } => {
                let file = Part::bytes(bytes)
                    .file_name(&disposition_param(file_name))
                    .mime_str(content_type)?;
                multipart.part(name, file)
            }
        };
    }
    builder.send(multipart)
}

/// ureq writes `name` and `filename` between quotes verbatim. Quotes are
/// backslash-escaped and line breaks percent-encoded so the header stays
/// on one line and the value cannot end early.
fn disposition_param(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            c => out.push(c),
        }
    }
    out
}
