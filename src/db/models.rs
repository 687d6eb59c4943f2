use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How an account authenticates. Password accounts carry a bcrypt hash;
/// google accounts carry an empty hash and can never log in by password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Password,
    Google,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub avatar: String,
    pub account_type: AccountType,
    /// Currently valid refresh tokens, one per live session. Insertion order
    /// is kept but the column is treated as a set: rotation removes the
    /// presented token and appends the replacement.
    pub refresh_tokens: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new_password_account(
        name: String,
        email: String,
        password_hash: String,
        avatar: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            avatar: avatar.unwrap_or_default(),
            account_type: AccountType::Password,
            refresh_tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_google_account(name: String, email: String, avatar: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash: String::new(),
            avatar,
            account_type: AccountType::Google,
            refresh_tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
