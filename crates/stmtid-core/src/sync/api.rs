//! Remote statement registry transport.

use std::time::Duration;

use tracing::debug;

use crate::config::{Region, API_KEY_HEADER};
use crate::errors::StmtResult;
use crate::models::Manifest;

/// Status and body of a registry response. Any status is a valid response;
/// only transport failures are errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
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

/// The two registry endpoints the clients use.
pub trait StatementApi {
    /// Registry base URL, for reporting.
    fn base_url(&self) -> &str;

    /// `GET {base}/statements/{id}`
    fn fetch_statement(&self, id: &str) -> StmtResult<RemoteResponse>;

    /// `POST {base}/statements` with the whole manifest as body.
    fn upload_manifest(&self, manifest: &Manifest) -> StmtResult<RemoteResponse>;
}

impl<T: StatementApi + ?Sized> StatementApi for &T {
    fn base_url(&self) -> &str {
        (**self).base_url()
    }

    fn fetch_statement(&self, id: &str) -> StmtResult<RemoteResponse> {
        (**self).fetch_statement(id)
    }

    fn upload_manifest(&self, manifest: &Manifest) -> StmtResult<RemoteResponse> {
        (**self).upload_manifest(manifest)
    }
}

/// Blocking HTTP implementation. One request at a time, no retries.
pub struct HttpStatementApi {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpStatementApi {
    pub const TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> StmtResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Self::TIMEOUT)
            .user_agent(concat!("stmtid/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn for_region(region: Region, api_key: impl Into<String>) -> StmtResult<Self> {
        Self::new(region.api_base_url(), api_key)
    }

    pub fn upload_url(&self) -> String {
        format!("{}/statements", self.base_url)
    }

    pub fn statement_url(&self, id: &str) -> String {
        format!("{}/statements/{}", self.base_url, id)
    }

    fn into_remote(response: reqwest::blocking::Response) -> StmtResult<RemoteResponse> {
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(RemoteResponse { status, body })
    }
}

impl StatementApi for HttpStatementApi {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_statement(&self, id: &str) -> StmtResult<RemoteResponse> {
        let url = self.statement_url(id);
        debug!(%url, "fetching statement");
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()?;
        Self::into_remote(response)
    }

    fn upload_manifest(&self, manifest: &Manifest) -> StmtResult<RemoteResponse> {
        let url = self.upload_url();
        debug!(%url, statements = manifest.statements.len(), "uploading manifest");
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(manifest)
            .send()?;
        Self::into_remote(response)
    }
}
