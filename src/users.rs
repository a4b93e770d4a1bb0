use anyhow::Result;
use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::password::generate;
use crate::password::hash;
use crate::storage::CreateUserValues;
use crate::storage::Storage;
use crate::utils::env_var_or_else;

/// User roles
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Manage users/contacts/leads/meetings
    Admin,
    /// Manage contacts/leads/meetings
    Manager,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub session_id: Uuid,
    pub username: String,
    pub hashed_password: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub created_at: NaiveDateTime,
}

impl User {
    /// Display name of the user: first and last name separated by a space
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub async fn ensure_initial_user<S: Storage>(storage: &S) -> Result<()> {
    let user = storage.find_any_single_user().await?;

    if user.is_none() {
        let username = env_var_or_else("INITIAL_USERNAME", || {
            let initial_username = Uuid::new_v4().to_string();
            tracing::info!(
                "`INITIAL_USERNAME` not set, generating new username: {initial_username}"
            );
            initial_username
        });

        let password = env_var_or_else("INITIAL_PASSWORD", || {
            let initial_password = generate();
            tracing::info!(
                "`INITIAL_PASSWORD` not set, generating new password: {initial_password}"
            );
            initial_password
        });

        let first_name = env_var_or_else("INITIAL_FIRST_NAME", || String::from("Initial"));
        let last_name = env_var_or_else("INITIAL_LAST_NAME", || String::from("Admin"));

        let hashed_password = hash(&password)
            .map_err(|err| anyhow::anyhow!("Could not hash the initial password: {err}"))?;

        let values = CreateUserValues {
            session_id: &Uuid::new_v4(),
            role: Role::Admin,
            username: &username,
            hashed_password: &hashed_password,
            first_name: &first_name,
            last_name: &last_name,
        };

        storage.create_user(&values).await?;
    }

    Ok(())
}
