//! Scripted in-memory `StatementApi` for tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::errors::{StmtError, StmtResult};
use crate::models::Manifest;
use crate::sync::api::{RemoteResponse, StatementApi};

enum Scripted {
    Respond(RemoteResponse),
    TransportFailure,
}

#[derive(Default)]
pub struct FakeStatementApi {
    statements: HashMap<String, Scripted>,
    upload: Option<Scripted>,
    requests: Cell<usize>,
    uploads: RefCell<Vec<Manifest>>,
}

impl FakeStatementApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement(mut self, id: &str, status: u16, body: &str) -> Self {
        self.statements.insert(
            id.to_string(),
            Scripted::Respond(RemoteResponse::new(status, body)),
        );
        self
    }

    pub fn with_transport_failure(mut self, id: &str) -> Self {
        self.statements
            .insert(id.to_string(), Scripted::TransportFailure);
        self
    }

    pub fn with_upload_response(mut self, status: u16, body: &str) -> Self {
        self.upload = Some(Scripted::Respond(RemoteResponse::new(status, body)));
        self
    }

    pub fn with_upload_failure(mut self) -> Self {
        self.upload = Some(Scripted::TransportFailure);
        self
    }

    /// Total requests issued against this fake.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }

    pub fn uploaded(&self) -> Vec<Manifest> {
        self.uploads.borrow().clone()
    }

    fn answer(scripted: Option<&Scripted>) -> StmtResult<RemoteResponse> {
        match scripted {
            Some(Scripted::Respond(response)) => Ok(response.clone()),
            Some(Scripted::TransportFailure) => {
                Err(StmtError::Http("connection reset by peer".to_string()))
            }
            None => Ok(RemoteResponse::new(404, "")),
        }
    }
}

impl StatementApi for FakeStatementApi {
    fn base_url(&self) -> &str {
        "http://fake.invalid"
    }

    fn fetch_statement(&self, id: &str) -> StmtResult<RemoteResponse> {
        self.requests.set(self.requests.get() + 1);
        Self::answer(self.statements.get(id))
    }

    fn upload_manifest(&self, manifest: &Manifest) -> StmtResult<RemoteResponse> {
        self.requests.set(self.requests.get() + 1);
        self.uploads.borrow_mut().push(manifest.clone());
        Self::answer(self.upload.as_ref())
    }
}
