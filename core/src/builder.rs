//! Stateless request builder and response parser for the REST API.
//!
//! # Design
//! `RequestBuilder` holds the `Environment` and a credential lookup and
//! carries no mutable state between calls. Each gateway operation is split
//! into a `build_*` method that produces an `HttpRequest` and a `parse_*`
//! method that consumes an `HttpResponse`, so everything except the
//! round-trip itself is deterministic and testable without a network.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::credentials::{CredentialStore, Credentials};
use crate::env::Environment;
use crate::error::GatewayError;
use crate::http::{
    Body, FormData, HttpMethod, HttpRequest, HttpResponse, Observe, RequestOptions, ResponseType,
    APPLICATION_JSON, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE,
};
use crate::query::to_query_string;
use crate::types::BlobWithFileName;

/// Which header set a call carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// `Content-Type: application/json`, plus the bearer header when a token
    /// is stored.
    Json,
    /// Only the bearer header, and only when a token is stored. Used for form
    /// data so the transport can set the multipart content type.
    Bearer,
    /// Nothing at all; credentials are not forwarded either.
    Anonymous,
}

/// Body of a POST or PUT.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(serde_json::Value),
    Form(FormData),
}

impl Payload {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, GatewayError> {
        serde_json::to_value(value)
            .map(Payload::Json)
            .map_err(|e| GatewayError::Serialization(e.to_string()))
    }

    pub fn is_form_data(&self) -> bool {
        matches!(self, Payload::Form(_))
    }

    fn into_body(self) -> Option<Body> {
        match self {
            Payload::Empty => None,
            Payload::Json(value) => Some(Body::Json(value.to_string())),
            Payload::Form(form) => Some(Body::Form(form)),
        }
    }
}

impl From<FormData> for Payload {
    fn from(form: FormData) -> Self {
        Payload::Form(form)
    }
}

/// Builds requests against `Environment::api_base_url` and parses responses.
#[derive(Debug, Clone)]
pub struct RequestBuilder<S> {
    env: Environment,
    credentials: Credentials<S>,
}

impl<S: CredentialStore> RequestBuilder<S> {
    pub fn new(env: Environment, store: S) -> Self {
        Self {
            env,
            credentials: Credentials::new(store),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn credentials(&self) -> &Credentials<S> {
        &self.credentials
    }

    /// Base URL plus `path`, without a query string.
    pub fn get_url(&self, path: &str) -> String {
        format!("{}{}", self.env.api_base_url, path)
    }

    /// Base URL plus `path`, plus `?query` when `params` yields any pair.
    pub fn build_url<P: Serialize + ?Sized>(
        &self,
        path: &str,
        params: Option<&P>,
    ) -> Result<String, GatewayError> {
        let mut url = self.get_url(path);
        if let Some(params) = params {
            let query = to_query_string(params)?;
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
        }
        Ok(url)
    }

    pub fn build_headers(&self, kind: HeaderKind) -> RequestOptions {
        let mut headers = Vec::new();
        if kind == HeaderKind::Json {
            headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
        }
        if kind != HeaderKind::Anonymous {
            let auth = self.credentials.build_auth_header();
            if !auth.is_empty() {
                headers.push((AUTHORIZATION.to_string(), auth));
            }
        }
        RequestOptions {
            headers,
            with_credentials: kind != HeaderKind::Anonymous,
        }
    }

    pub fn build_get<P: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Option<&P>,
        disable_credentials: bool,
        override_url: Option<&str>,
    ) -> Result<HttpRequest, GatewayError> {
        let url = match non_empty(override_url) {
            Some(url) => url.to_string(),
            None => self.build_url(path, query)?,
        };
        let kind = if disable_credentials {
            HeaderKind::Anonymous
        } else {
            HeaderKind::Bearer
        };
        Ok(HttpRequest::new(HttpMethod::Get, url, self.build_headers(kind)))
    }

    pub fn build_post(&self, path: &str, body: Payload, override_url: Option<&str>) -> HttpRequest {
        self.build_with_body(HttpMethod::Post, path, body, override_url)
    }

    pub fn build_put(&self, path: &str, body: Payload, override_url: Option<&str>) -> HttpRequest {
        self.build_with_body(HttpMethod::Put, path, body, override_url)
    }

    pub fn build_delete(&self, path: &str, override_url: Option<&str>) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Delete,
            self.target(path, override_url),
            self.build_headers(HeaderKind::Json),
        )
    }

    pub fn build_upload(&self, path: &str, form: FormData) -> HttpRequest {
        let mut req = HttpRequest::new(
            HttpMethod::Post,
            self.get_url(path),
            self.build_headers(HeaderKind::Bearer),
        );
        req.body = Some(Body::Form(form));
        req
    }

    /// Absolute `http(s)://` paths are fetched as-is; anything else is
    /// joined to the API base URL.
    pub fn build_download(&self, path: &str) -> HttpRequest {
        let url = if is_absolute(path) {
            path.to_string()
        } else {
            self.get_url(path)
        };
        let mut req = HttpRequest::new(HttpMethod::Get, url, self.build_headers(HeaderKind::Bearer));
        req.response_type = ResponseType::Blob;
        req.observe = Observe::Response;
        req
    }

    fn build_with_body(
        &self,
        method: HttpMethod,
        path: &str,
        body: Payload,
        override_url: Option<&str>,
    ) -> HttpRequest {
        let kind = if body.is_form_data() {
            HeaderKind::Bearer
        } else {
            HeaderKind::Json
        };
        let mut req = HttpRequest::new(method, self.target(path, override_url), self.build_headers(kind));
        req.body = body.into_body();
        req
    }

    fn target(&self, path: &str, override_url: Option<&str>) -> String {
        match non_empty(override_url) {
            Some(url) => url.to_string(),
            None => self.get_url(path),
        }
    }

    /// Decode a 2xx JSON body. An empty body decodes as `null`.
    pub fn parse_json<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, GatewayError> {
        check_status(&response)?;
        let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &response.body
        };
        serde_json::from_slice(body).map_err(|e| GatewayError::Deserialization(e.to_string()))
    }

    /// Take the body as a file. A non-empty `suggested_name` wins over the
    /// `Content-Disposition` header.
    pub fn parse_download(
        &self,
        response: HttpResponse,
        suggested_name: Option<&str>,
    ) -> Result<BlobWithFileName, GatewayError> {
        check_status(&response)?;
        let file_name = match non_empty(suggested_name) {
            Some(name) => name.to_string(),
            None => response
                .header(CONTENT_DISPOSITION)
                .and_then(file_name_from_disposition)
                .ok_or(GatewayError::MissingFileName)?,
        };
        Ok(BlobWithFileName {
            file_name,
            blob: response.body,
        })
    }
}

/// File name from `attachment; filename="x.ext"`: second `;` segment, value
/// after `=`, quotes stripped.
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    let segment = header.split(';').nth(1)?.trim();
    let name = segment.split('=').nth(1)?.replace('"', "");
    if name.is_empty() {
        return None;
    }
    Some(name)
}

fn check_status(response: &HttpResponse) -> Result<(), GatewayError> {
    if response.is_success() {
        return Ok(());
    }
    Err(GatewayError::Http {
        status: response.status,
        body: response.body_text(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryStore;
    use serde_json::{json, Value};

    const BASE: &str = "https://api.test";

    fn env() -> Environment {
        Environment {
            api_base_url: BASE.to_string(),
            ..Environment::default()
        }
    }

    fn anonymous() -> RequestBuilder<MemoryStore> {
        RequestBuilder::new(env(), MemoryStore::new())
    }

    fn signed_in() -> RequestBuilder<MemoryStore> {
        RequestBuilder::new(env(), MemoryStore::with_token("abc123"))
    }

    fn response(status: u16, headers: &[(&str, &str)], body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_vec(),
        }
    }

    #[test]
    fn build_url_appends_query() {
        let url = anonymous()
            .build_url("/items", Some(&json!({"a": 1, "b": "x"})))
            .unwrap();
        assert_eq!(url, "https://api.test/items?a=1&b=x");
    }

    #[test]
    fn build_url_without_params() {
        let url = anonymous().build_url::<Value>("/items", None).unwrap();
        assert_eq!(url, "https://api.test/items");
        assert_eq!(anonymous().get_url("/items"), url);
    }

    #[test]
    fn build_url_omits_question_mark_when_everything_is_skipped() {
        let url = anonymous()
            .build_url("/items", Some(&json!({"a": null, "b": ""})))
            .unwrap();
        assert_eq!(url, "https://api.test/items");
        let url = anonymous().build_url("/items", Some(&json!({}))).unwrap();
        assert_eq!(url, "https://api.test/items");
    }

    #[test]
    fn build_url_keeps_zero_and_false() {
        let url = anonymous()
            .build_url("/items", Some(&json!({"page": 0, "done": false, "q": null})))
            .unwrap();
        assert_eq!(url, "https://api.test/items?page=0&done=false");
    }

    #[test]
    fn json_headers_without_token_are_content_type_only() {
        let options = anonymous().build_headers(HeaderKind::Json);
        assert_eq!(
            options.headers,
            vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())]
        );
    }

    #[test]
    fn json_headers_with_token_add_bearer() {
        let options = signed_in().build_headers(HeaderKind::Json);
        assert_eq!(
            options.headers,
            vec![
                (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
                (AUTHORIZATION.to_string(), "Bearer abc123".to_string()),
            ]
        );
        assert!(options.with_credentials);
    }

    #[test]
    fn bearer_headers_have_no_content_type() {
        let options = signed_in().build_headers(HeaderKind::Bearer);
        assert_eq!(
            options.headers,
            vec![(AUTHORIZATION.to_string(), "Bearer abc123".to_string())]
        );
        assert!(anonymous().build_headers(HeaderKind::Bearer).headers.is_empty());
    }

    #[test]
    fn get_with_credentials_sends_bearer() {
        let req = signed_in()
            .build_get("/items", Some(&json!({"a": 1})), false, None)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.test/items?a=1");
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer abc123"));
        assert!(req.with_credentials);
        assert!(req.body.is_none());
    }

    #[test]
    fn get_with_credentials_disabled_is_anonymous() {
        let req = signed_in()
            .build_get::<Value>("/public", None, true, None)
            .unwrap();
        assert!(req.headers.is_empty());
        assert!(!req.with_credentials);
    }

    #[test]
    fn override_url_replaces_base_and_query() {
        let req = signed_in()
            .build_get(
                "/ignored",
                Some(&json!({"a": 1})),
                false,
                Some("https://other.test/x"),
            )
            .unwrap();
        assert_eq!(req.url, "https://other.test/x");

        let req = signed_in().build_delete("/items/1", Some(""));
        assert_eq!(req.url, "https://api.test/items/1");
    }

    #[test]
    fn post_json_sends_content_type_and_bearer() {
        let body = Payload::json(&json!({"title": "x"})).unwrap();
        let req = signed_in().build_post("/items", body, None);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.test/items");
        assert_eq!(req.header(CONTENT_TYPE), Some(APPLICATION_JSON));
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer abc123"));
        match req.body {
            Some(Body::Json(text)) => {
                let value: Value = serde_json::from_str(&text).unwrap();
                assert_eq!(value["title"], "x");
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn post_form_data_omits_json_content_type() {
        let form = FormData::new().text("name", "value");
        let req = signed_in().build_post("/items", form.into(), None);
        assert_eq!(req.header(CONTENT_TYPE), None);
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer abc123"));
        assert!(matches!(req.body, Some(Body::Form(_))));
    }

    #[test]
    fn put_without_body_still_sends_json_headers() {
        let req = anonymous().build_put("/items/1", Payload::Empty, None);
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.header(CONTENT_TYPE), Some(APPLICATION_JSON));
        assert_eq!(req.header(AUTHORIZATION), None);
        assert!(req.body.is_none());
    }

    #[test]
    fn delete_uses_json_headers() {
        let req = signed_in().build_delete("/items/1", None);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.header(CONTENT_TYPE), Some(APPLICATION_JSON));
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer abc123"));
    }

    #[test]
    fn upload_leaves_content_type_to_transport() {
        let form = FormData::new().file("file", "a.txt", "text/plain", b"hi".to_vec());
        let req = signed_in().build_upload("/upload", form);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header(CONTENT_TYPE), None);
        assert!(matches!(req.body, Some(Body::Form(_))));
    }

    #[test]
    fn download_expects_full_blob_response() {
        let req = anonymous().build_download("/files/1");
        assert_eq!(req.url, "https://api.test/files/1");
        assert_eq!(req.response_type, ResponseType::Blob);
        assert_eq!(req.observe, Observe::Response);
        assert!(req.with_credentials);

        let req = anonymous().build_download("https://cdn.test/f.bin");
        assert_eq!(req.url, "https://cdn.test/f.bin");
    }

    #[test]
    fn parse_json_decodes_envelope() {
        let res = response(200, &[], br#"{"status":"ok","data":[1,2,3]}"#);
        let parsed: crate::types::ApiResponse<Vec<u8>> = anonymous().parse_json(res).unwrap();
        assert_eq!(parsed.data, vec![1, 2, 3]);
    }

    #[test]
    fn parse_json_empty_body_is_null() {
        let value: Value = anonymous().parse_json(response(204, &[], b"")).unwrap();
        assert_eq!(value, Value::Null);
        anonymous()
            .parse_json::<()>(response(200, &[], b""))
            .unwrap();
    }

    #[test]
    fn parse_json_non_success_is_http_error() {
        let err = anonymous()
            .parse_json::<Value>(response(401, &[], b"denied"))
            .unwrap_err();
        match err {
            GatewayError::Http { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "denied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_json_bad_body() {
        let err = anonymous()
            .parse_json::<Vec<u8>>(response(200, &[], b"not json"))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Deserialization(_)));
    }

    #[test]
    fn download_name_from_content_disposition() {
        let res = response(
            200,
            &[("Content-Disposition", "attachment; filename=\"report.pdf\"")],
            b"%PDF",
        );
        let file = anonymous().parse_download(res, None).unwrap();
        assert_eq!(file.file_name, "report.pdf");
        assert_eq!(file.blob, b"%PDF".to_vec());
    }

    #[test]
    fn suggested_name_wins() {
        let res = response(
            200,
            &[("Content-Disposition", "attachment; filename=\"report.pdf\"")],
            b"x",
        );
        let file = anonymous().parse_download(res, Some("mine.pdf")).unwrap();
        assert_eq!(file.file_name, "mine.pdf");
    }

    #[test]
    fn download_without_any_name_fails() {
        let err = anonymous()
            .parse_download(response(200, &[], b"x"), None)
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingFileName));
    }

    #[test]
    fn download_failure_keeps_status() {
        let err = anonymous()
            .parse_download(response(403, &[], b""), Some("x.bin"))
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn disposition_parsing() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=plain.txt").as_deref(),
            Some("plain.txt")
        );
        assert_eq!(
            file_name_from_disposition("attachment;filename=\"a b.csv\"").as_deref(),
            Some("a b.csv")
        );
        assert_eq!(file_name_from_disposition("inline"), None);
        assert_eq!(file_name_from_disposition("attachment; filename=\"\""), None);
    }
}
