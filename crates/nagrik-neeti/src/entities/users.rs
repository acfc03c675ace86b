use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::{AccessError, AccessResult, ValidationError, WriteOutcome};
use super::input::{provided_text, require_id, variant_text, Input};
use crate::store::{Collection, DocumentStore, Patch, Query};
use crate::validate::is_valid_email;

const COLLECTION: Collection = Collection::Users;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    fn from_input(value: &Value) -> Result<Self, ValidationError> {
        match value.as_str() {
            Some("user") => Ok(Role::User),
            Some("admin") => Ok(Role::Admin),
            _ => Err(ValidationError::UnknownVariant {
                field: "role",
                value: variant_text(value),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile stored under the auth provider's uid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub uid: String,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// An empty address is allowed; anything else must look like `local@domain.tld`.
fn checked_email(input: &Input) -> Result<Option<String>, ValidationError> {
    let email = provided_text(input, "email")?.map(|email| email.trim().to_string());
    match email {
        Some(email) if !email.is_empty() && !is_valid_email(&email) => {
            Err(ValidationError::InvalidType {
                field: "email",
                expected: "a valid email address",
            })
        }
        other => Ok(other),
    }
}

fn creation_patch(input: &Input) -> Result<Patch, ValidationError> {
    let name = match input.get("name") {
        Some(Value::String(name)) => Value::String(name.clone()),
        _ => Value::Null,
    };
    let email = checked_email(input)?.unwrap_or_default();
    let role = match input.get("role") {
        None | Some(Value::Null) => Role::default(),
        Some(value) => Role::from_input(value)?,
    };

    Ok(Patch::new()
        .set("name", name)
        .set("email", email)
        .set("role", role.as_str())
        .server_timestamp("createdAt"))
}

/// Only `name`, `email` and `role` are writable after registration.
fn update_patch(input: &Input) -> Result<Patch, ValidationError> {
    let mut patch = Patch::new();

    match input.get("name") {
        None => {}
        Some(Value::Null) => patch = patch.set("name", Value::Null),
        Some(Value::String(name)) => patch = patch.set("name", name.clone()),
        Some(_) => {
            return Err(ValidationError::InvalidType {
                field: "name",
                expected: "a string or null",
            })
        }
    }
    if let Some(email) = checked_email(input)? {
        patch = patch.set("email", email);
    }
    if let Some(value) = input.get("role") {
        patch = patch.set("role", Role::from_input(value)?.as_str());
    }

    Ok(patch)
}

/// Access service for the `users` collection, keyed by auth uid.
pub struct UserService<S> {
    store: Arc<S>,
}

impl<S> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Write the profile record for a freshly registered account.
    pub async fn create(&self, uid: &str, input: &Input) -> AccessResult<()> {
        require_id(uid, "uid")?;
        let patch = creation_patch(input)?;
        self.store.set(COLLECTION, uid, patch).await?;
        info!(uid, "user profile created");
        Ok(())
    }

    pub async fn update(&self, uid: &str, input: &Input) -> AccessResult<WriteOutcome> {
        if uid.trim().is_empty() {
            return Ok(WriteOutcome::Skipped);
        }

        let patch = update_patch(input)?;
        if patch.is_empty() {
            debug!(uid, "user update carried no writable fields");
            return Ok(WriteOutcome::Skipped);
        }

        self.store.update(COLLECTION, uid, patch).await?;
        Ok(WriteOutcome::Applied)
    }

    pub async fn get_by_id(&self, uid: &str) -> AccessResult<Option<UserProfile>> {
        if uid.trim().is_empty() {
            return Ok(None);
        }
        match self.store.get(COLLECTION, uid).await? {
            Some(document) => Ok(Some(document.decode_keyed("uid")?)),
            None => Ok(None),
        }
    }

    pub async fn list_all(&self) -> AccessResult<Vec<UserProfile>> {
        let documents = self.store.query(COLLECTION, &Query::all()).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match document.decode_keyed::<UserProfile>("uid") {
                Ok(profile) => Some(profile),
                Err(err) => {
                    warn!(collection = %COLLECTION, error = %err, "skipping undecodable document");
                    None
                }
            })
            .collect())
    }

    /// Role guard for admin-only operations.
    pub async fn require_admin(&self, uid: &str) -> AccessResult<UserProfile> {
        let profile = self
            .get_by_id(uid)
            .await?
            .ok_or_else(|| AccessError::Forbidden("sign in as an administrator".to_string()))?;

        if !profile.is_admin() {
            warn!(uid, "non-admin attempted an admin operation");
            return Err(AccessError::Forbidden(format!(
                "user '{uid}' is not an administrator"
            )));
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> Input {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn registration_defaults_role_to_user() {
        let patch = creation_patch(&input(json!({ "email": "asha@example.org" })))
            .expect("valid profile");

        assert_eq!(patch.value("role"), Some(&json!("user")));
        assert_eq!(patch.value("name"), Some(&Value::Null));
    }

    #[test]
    fn update_ignores_non_profile_fields() {
        let patch = update_patch(&input(json!({ "uid": "other", "createdAt": "yesterday" })))
            .expect("nothing writable");
        assert!(patch.is_empty());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let err = update_patch(&input(json!({ "role": "superuser" }))).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownVariant { field: "role", .. }));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let err = creation_patch(&input(json!({ "email": "asha@example" }))).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { field: "email", .. }));

        let patch = creation_patch(&input(json!({ "email": "" }))).expect("blank email allowed");
        assert_eq!(patch.value("email"), Some(&json!("")));
    }
}
