// crates/console-sso/tests/common/identity.rs
// ============================================================================
// Module: In-Memory Identity Directory
// Description: IdentityApi fake keyed by environment and username.
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;

use pingone_client::EnvironmentEndpoints;
use pingone_client::IdentityApi;
use pingone_client::PingOneError;
use serde_json::Value;

/// Directory contents and scripted failures.
#[derive(Debug, Default)]
pub struct Directory {
    /// `(environment_id, username)` to the last payload written.
    pub users: BTreeMap<(String, String), Value>,
    /// Population name to id.
    pub populations: BTreeMap<String, String>,
    /// `(username, role_name)` assignments.
    pub role_assignments: Vec<(String, String)>,
    /// Every call in order.
    pub calls: Vec<String>,
    /// Usernames whose creation fails.
    pub fail_create: BTreeSet<String>,
    /// Usernames whose deletion fails.
    pub fail_delete: BTreeSet<String>,
}

/// Thread-safe in-memory identity API.
#[derive(Debug, Default)]
pub struct FakeIdentity {
    pub directory: Mutex<Directory>,
}

impl FakeIdentity {
    /// Directory with the `acme` and `Default` populations.
    pub fn with_populations() -> Self {
        let identity = Self::default();
        {
            let mut directory = identity.directory.lock().unwrap();
            directory.populations.insert("acme".to_string(), "pop-acme".to_string());
            directory.populations.insert("Default".to_string(), "pop-default".to_string());
        }
        identity
    }

    pub fn calls(&self) -> Vec<String> {
        self.directory.lock().unwrap().calls.clone()
    }

    pub fn user(&self, environment_id: &str, username: &str) -> Option<Value> {
        self.directory
            .lock()
            .unwrap()
            .users
            .get(&(environment_id.to_string(), username.to_string()))
            .cloned()
    }

    pub fn usernames(&self) -> Vec<String> {
        self.directory.lock().unwrap().users.keys().map(|(_, name)| name.clone()).collect()
    }

    pub fn seed_user(&self, environment_id: &str, username: &str) {
        self.directory.lock().unwrap().users.insert(
            (environment_id.to_string(), username.to_string()),
            serde_json::json!({ "username": username }),
        );
    }

    pub fn fail_create(&self, username: &str) {
        self.directory.lock().unwrap().fail_create.insert(username.to_string());
    }

    pub fn fail_delete(&self, username: &str) {
        self.directory.lock().unwrap().fail_delete.insert(username.to_string());
    }
}

fn key(endpoints: &EnvironmentEndpoints, username: &str) -> (String, String) {
    (endpoints.environment_id().to_string(), username.to_string())
}

fn server_error(operation: &'static str) -> PingOneError {
    PingOneError::Status {
        operation,
        status: 500,
        body: "scripted failure".to_string(),
    }
}

impl IdentityApi for FakeIdentity {
    fn find_user_id(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
    ) -> Result<Option<String>, PingOneError> {
        let directory = self.directory.lock().unwrap();
        Ok(directory.users.contains_key(&key(endpoints, username)).then(|| format!("id-{username}")))
    }

    fn create_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        payload: &Value,
    ) -> Result<String, PingOneError> {
        let username = payload["username"].as_str().unwrap().to_string();
        let mut directory = self.directory.lock().unwrap();
        directory.calls.push(format!("create {username}@{}", endpoints.environment_id()));
        if directory.fail_create.contains(&username) {
            return Err(server_error("create user"));
        }
        directory.users.insert(key(endpoints, &username), payload.clone());
        Ok(format!("id-{username}"))
    }

    fn update_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
        payload: &Value,
    ) -> Result<(), PingOneError> {
        let mut directory = self.directory.lock().unwrap();
        directory.calls.push(format!("update {username}@{}", endpoints.environment_id()));
        let Some(existing) = directory.users.get_mut(&key(endpoints, username)) else {
            return Err(PingOneError::NotFound {
                kind: "user",
                name: username.to_string(),
            });
        };
        if let (Some(existing), Some(patch)) = (existing.as_object_mut(), payload.as_object()) {
            for (field, value) in patch {
                existing.insert(field.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn delete_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
    ) -> Result<bool, PingOneError> {
        let mut directory = self.directory.lock().unwrap();
        directory.calls.push(format!("delete {username}@{}", endpoints.environment_id()));
        if directory.fail_delete.contains(username) {
            return Err(server_error("delete user"));
        }
        Ok(directory.users.remove(&key(endpoints, username)).is_some())
    }

    fn find_population_id(
        &self,
        _endpoints: &EnvironmentEndpoints,
        name: &str,
    ) -> Result<String, PingOneError> {
        self.directory.lock().unwrap().populations.get(name).cloned().ok_or_else(|| {
            PingOneError::NotFound {
                kind: "population",
                name: name.to_string(),
            }
        })
    }

    fn add_role_to_user(
        &self,
        endpoints: &EnvironmentEndpoints,
        username: &str,
        role_name: &str,
        _scope_environment_id: &str,
    ) -> Result<(), PingOneError> {
        let mut directory = self.directory.lock().unwrap();
        directory.calls.push(format!("role {username}@{}", endpoints.environment_id()));
        directory.role_assignments.push((username.to_string(), role_name.to_string()));
        Ok(())
    }
}
