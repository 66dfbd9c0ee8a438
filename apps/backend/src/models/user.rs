use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// Account record. The `password` field only ever holds an Argon2id PHC
/// hash; plaintext never reaches storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub admin: bool,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            password: password_hash.into(),
            admin: false,
        }
    }
}

/// A revoked bearer token. `expires_at` mirrors the token's own expiry so
/// a TTL index can drop the entry once the token would be dead anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokedToken {
    pub token: String,
    pub expires_at: DateTime,
}
