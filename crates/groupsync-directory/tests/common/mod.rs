//! Common test utilities for groupsync-directory integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, Once};
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use groupsync_directory::{
    DirectoryClient, DirectoryConfig, DirectoryError, DirectoryResult, DiscoveredGroup,
    GoogleDirectoryClient, GroupKey,
};

pub const TEST_KEY_PEM: &str = include_str!("../fixtures/service_account_key.pem");
pub const DELEGATED_USER: &str = "admin@example.com";
pub const APPLICATION_NAME: &str = "groupsync-test";
pub const ACCESS_TOKEN: &str = "mock-access-token";
pub const GROUPS_PATH: &str = "/admin/directory/v1/groups";
pub const TOKEN_PATH: &str = "/token";

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

/// Test data factory for a Directory API group resource.
pub fn create_test_group(id: &str, name: &str) -> Value {
    json!({
        "kind": "admin#directory#group",
        "id": id,
        "email": format!("{}@example.com", id),
        "name": name,
        "directMembersCount": "3"
    })
}

/// Wraps groups in a `groups.list` response.
pub fn create_groups_response(groups: Vec<Value>, next_page_token: Option<&str>) -> Value {
    let mut response = json!({
        "kind": "admin#directory#groups",
        "etag": "\"test-etag\"",
    });
    if !groups.is_empty() {
        response["groups"] = json!(groups);
    }
    if let Some(token) = next_page_token {
        response["nextPageToken"] = json!(token);
    }
    response
}

/// Creates a Google API error body.
pub fn create_google_error(code: u16, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message,
            "errors": [{"message": message, "domain": "global", "reason": "forbidden"}]
        }
    })
}

/// Writes a service-account key file whose token endpoint is `token_uri`.
pub fn write_service_account_key(token_uri: &str) -> NamedTempFile {
    let key = json!({
        "type": "service_account",
        "project_id": "groupsync-test",
        "private_key_id": "test-key-id",
        "private_key": TEST_KEY_PEM,
        "client_email": "sync@groupsync-test.iam.gserviceaccount.com",
        "client_id": "1234567890",
        "token_uri": token_uri,
    });
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), key.to_string()).unwrap();
    file
}

/// Mock Directory API with a token endpoint.
pub struct MockDirectoryServer {
    pub server: MockServer,
    key_file: NamedTempFile,
}

impl MockDirectoryServer {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let key_file = write_service_account_key(&format!("{}{}", server.uri(), TOKEN_PATH));
        Self { server, key_file }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Sets up the OAuth token endpoint, expecting `times` token requests.
    pub async fn mock_token_endpoint(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    pub fn config(&self) -> DirectoryConfig {
        DirectoryConfig::builder()
            .delegated_user(DELEGATED_USER)
            .application_name(APPLICATION_NAME)
            .credentials_file(self.key_file.path())
            .base_url(format!("{}/admin/directory/v1", self.url()))
            .page_size(2)
            .build()
            .unwrap()
    }

    pub fn client(&self) -> GoogleDirectoryClient {
        GoogleDirectoryClient::new(self.config()).unwrap()
    }
}

/// In-memory directory graph keyed by member key.
#[derive(Default)]
pub struct FakeDirectory {
    memberships: HashMap<String, Vec<DiscoveredGroup>>,
    failing_keys: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `member` belongs directly to `group_id`, named `group_name`.
    pub fn with_membership(mut self, member: &str, group_id: &str, group_name: &str) -> Self {
        self.memberships
            .entry(member.to_string())
            .or_default()
            .push(DiscoveredGroup::new(group_name, group_id));
        self
    }

    /// Makes lookups for `key` fail as if the directory were down.
    pub fn with_failure(mut self, key: &str) -> Self {
        self.failing_keys.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn list_immediate_groups(&self, key: &GroupKey) -> DirectoryResult<Vec<DiscoveredGroup>> {
        self.calls.lock().unwrap().push(key.to_string());
        if self.failing_keys.contains(key.as_str()) {
            return Err(DirectoryError::Api {
                status: 503,
                message: "Backend Error".to_string(),
            });
        }
        Ok(self.memberships.get(key.as_str()).cloned().unwrap_or_default())
    }
}
