// 🔐 Identity - registration and login
//
// Passwords are stored as unsalted SHA-256 hex digests.

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::entities::User;
use crate::error::{FinanceError, Result};
use crate::store::UserStore;

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create a user. Usernames are trimmed and must be unique.
pub fn register_user<S: UserStore + ?Sized>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(FinanceError::validation("Username cannot be empty."));
    }
    if password.is_empty() {
        return Err(FinanceError::validation("Password cannot be empty."));
    }

    let user = store.insert_user(username, &hash_password(password))?;
    info!(user_id = user.id, username, "user registered");
    Ok(user)
}

/// Unknown usernames and wrong passwords fail the same way.
pub fn login_user<S: UserStore + ?Sized>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<User> {
    let username = username.trim();
    match store.find_user_by_name(username)? {
        Some(user) if user.password_hash == hash_password(password) => {
            info!(user_id = user.id, "login succeeded");
            Ok(user)
        }
        _ => {
            warn!(username, "login failed");
            Err(FinanceError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
        assert_ne!(hash_password("a"), hash_password("b"));
    }

    #[test]
    fn test_register_then_login() {
        let store = MemoryStore::new();
        let registered = register_user(&store, "  alice ", "s3cret").unwrap();
        assert_eq!(registered.username, "alice");
        assert_ne!(registered.password_hash, "s3cret");

        let logged_in = login_user(&store, "alice", "s3cret").unwrap();
        assert_eq!(logged_in.id, registered.id);
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        register_user(&store, "alice", "one").unwrap();

        let err = register_user(&store, "alice", "two").unwrap_err();
        assert!(matches!(err, FinanceError::Conflict(_)));
        assert_eq!(err.to_string(), "Username 'alice' already exists.");
    }

    #[test]
    fn test_register_rejects_blank_input() {
        let store = MemoryStore::new();
        assert!(matches!(
            register_user(&store, "   ", "pw"),
            Err(FinanceError::Validation(_))
        ));
        assert!(matches!(
            register_user(&store, "bob", ""),
            Err(FinanceError::Validation(_))
        ));
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        register_user(&store, "alice", "right").unwrap();

        let wrong_password = login_user(&store, "alice", "wrong").unwrap_err();
        let unknown_user = login_user(&store, "nobody", "right").unwrap_err();

        assert!(matches!(wrong_password, FinanceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }
}
