// SPDX-License-Identifier: Apache-2.0

use crate::auth::UserAccount;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub session_ttl: Duration,
    pub users: Vec<UserAccount>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
            session_ttl: Duration::from_secs(8 * 60 * 60),
            users: Vec::new(),
        }
    }
}

pub fn validate_startup_config(api: &ApiConfig) -> Result<(), String> {
    if api.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if api.session_ttl.is_zero() {
        return Err("session ttl must be > 0".to_string());
    }
    if api.users.is_empty() {
        return Err("at least one user account is required".to_string());
    }
    let mut seen = HashSet::new();
    for user in &api.users {
        if user.username.trim().is_empty() || user.password.is_empty() {
            return Err("user accounts require a username and a password".to_string());
        }
        if !seen.insert(user.username.as_str()) {
            return Err(format!("duplicate username: {}", user.username));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserAccount {
        UserAccount {
            username: name.to_string(),
            password: "secret".to_string(),
            is_admin: false,
        }
    }

    #[test]
    fn startup_config_requires_at_least_one_user() {
        let api = ApiConfig::default();
        let err = validate_startup_config(&api).expect_err("no users");
        assert!(err.contains("user account"));
    }

    #[test]
    fn startup_config_rejects_duplicate_usernames() {
        let api = ApiConfig {
            users: vec![user("alice"), user("alice")],
            ..ApiConfig::default()
        };
        let err = validate_startup_config(&api).expect_err("duplicates");
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn startup_config_accepts_a_valid_account_list() {
        let api = ApiConfig {
            users: vec![user("alice"), user("bob")],
            ..ApiConfig::default()
        };
        assert!(validate_startup_config(&api).is_ok());
    }
}
