// 👤 User Entity
//
// Created at registration, immutable afterwards, never deleted.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Stable row id; every transaction and budget points at it
    pub id: i64,

    /// Unique, non-empty login name
    pub username: String,

    /// Lowercase hex SHA-256 of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
}
