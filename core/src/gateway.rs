//! Asynchronous REST gateway.
//!
//! # Design
//! `HttpGateway` glues the three capabilities together: the builder turns a
//! call into an `HttpRequest`, the `Transport` performs the round-trip and
//! the builder parses the `HttpResponse`. Every failure, whether from
//! building, the network or a non-2xx status, passes through the
//! `ErrorInterceptor` on its way back to the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::builder::{Payload, RequestBuilder};
use crate::credentials::CredentialStore;
use crate::env::Environment;
use crate::error::GatewayError;
use crate::http::{FormData, HttpRequest, HttpResponse};
use crate::interceptor::{ErrorInterceptor, Navigator};
use crate::transport::Transport;
use crate::types::BlobWithFileName;

/// Client-side gateway for the REST API.
pub struct HttpGateway<T, S, N> {
    transport: T,
    builder: RequestBuilder<S>,
    interceptor: ErrorInterceptor<N>,
}

impl<T, S, N> HttpGateway<T, S, N>
where
    T: Transport,
    S: CredentialStore,
    N: Navigator,
{
    pub fn new(env: Environment, transport: T, store: S, navigator: N) -> Self {
        let interceptor = ErrorInterceptor::new(navigator, env.login_url());
        Self {
            transport,
            builder: RequestBuilder::new(env, store),
            interceptor,
        }
    }

    pub fn builder(&self) -> &RequestBuilder<S> {
        &self.builder
    }

    pub fn navigator(&self) -> &N {
        self.interceptor.navigator()
    }

    /// Fully-qualified URL for `path`, without sending anything.
    pub fn url_for(&self, path: &str) -> String {
        self.builder.get_url(path)
    }

    /// GET `path?query`. With `disable_credentials` no auth header is sent
    /// and credentials are not forwarded.
    pub async fn get<R, P>(
        &self,
        path: &str,
        query: Option<&P>,
        disable_credentials: bool,
        override_url: Option<&str>,
    ) -> Result<R, GatewayError>
    where
        R: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let req = self
            .builder
            .build_get(path, query, disable_credentials, override_url)
            .map_err(|e| self.interceptor.handle(e))?;
        let res = self.round_trip(req).await?;
        self.decode(res)
    }

    pub async fn post<R: DeserializeOwned>(
        &self,
        path: &str,
        body: Payload,
        override_url: Option<&str>,
    ) -> Result<R, GatewayError> {
        let req = self.builder.build_post(path, body, override_url);
        let res = self.round_trip(req).await?;
        self.decode(res)
    }

    pub async fn put<R: DeserializeOwned>(
        &self,
        path: &str,
        body: Payload,
        override_url: Option<&str>,
    ) -> Result<R, GatewayError> {
        let req = self.builder.build_put(path, body, override_url);
        let res = self.round_trip(req).await?;
        self.decode(res)
    }

    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
        override_url: Option<&str>,
    ) -> Result<R, GatewayError> {
        let req = self.builder.build_delete(path, override_url);
        let res = self.round_trip(req).await?;
        self.decode(res)
    }

    pub async fn upload_file<R: DeserializeOwned>(
        &self,
        path: &str,
        form: FormData,
    ) -> Result<R, GatewayError> {
        let req = self.builder.build_upload(path, form);
        let res = self.round_trip(req).await?;
        self.decode(res)
    }

    /// Download `path` as bytes. The file name comes from `suggested_name`
    /// when given, else from the `Content-Disposition` header.
    pub async fn download_blob(
        &self,
        path: &str,
        suggested_name: Option<&str>,
    ) -> Result<BlobWithFileName, GatewayError> {
        let req = self.builder.build_download(path);
        let res = self.round_trip(req).await?;
        self.builder
            .parse_download(res, suggested_name)
            .map_err(|e| self.interceptor.handle(e))
    }

    async fn round_trip(&self, req: HttpRequest) -> Result<HttpResponse, GatewayError> {
        tracing::debug!(method = req.method.as_str(), url = %req.url, "sending request");
        let res = self
            .transport
            .send(req)
            .await
            .map_err(|e| self.interceptor.handle(e))?;
        tracing::debug!(status = res.status, bytes = res.body.len(), "response received");
        Ok(res)
    }

    fn decode<R: DeserializeOwned>(&self, res: HttpResponse) -> Result<R, GatewayError> {
        self.builder
            .parse_json(res)
            .map_err(|e| self.interceptor.handle(e))
    }
}
