// SPDX-License-Identifier: Apache-2.0

//! Session-cookie authentication. Two tiers only: any authenticated user may
//! reach the entity handlers; accounts flagged `is_admin` additionally reach
//! the privileged admin surface.

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::SESSION_COOKIE;

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub is_admin: bool,
    expires_at: Instant,
}

impl Session {
    fn live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Server-side session table keyed by opaque token. Expired entries are
/// dropped lazily on lookup.
pub struct SessionStore {
    ttl: Duration,
    seed: u64,
    counter: AtomicU64,
    sessions: Mutex<HashMap<String, Session>>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1);
        Self {
            ttl,
            seed,
            counter: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn mint_token(&self, username: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        sha256_hex(format!("{}:{n}:{nanos}:{username}", self.seed).as_bytes())
    }

    /// Checks credentials against the configured accounts and, on a match,
    /// issues a session token.
    pub fn login(&self, users: &[UserAccount], username: &str, password: &str) -> Option<String> {
        let account = users
            .iter()
            .find(|u| u.username == username && u.password == password)?;
        let token = self.mint_token(username);
        let session = Session {
            username: account.username.clone(),
            is_admin: account.is_admin,
            expires_at: Instant::now() + self.ttl,
        };
        self.sessions.lock().ok()?.insert(token.clone(), session);
        Some(token)
    }

    pub fn authenticate(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock().ok()?;
        let now = Instant::now();
        if !sessions.get(token).is_some_and(|s| s.live(now)) {
            sessions.remove(token);
            return None;
        }
        sessions.get(token).cloned()
    }

    pub fn revoke(&self, token: &str) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(token);
        }
    }
}

/// Pulls the session token out of the `Cookie` request header.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("cookie").and_then(|v| v.to_str().ok())?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn users() -> Vec<UserAccount> {
        vec![
            UserAccount {
                username: "alice".to_string(),
                password: "secret".to_string(),
                is_admin: false,
            },
            UserAccount {
                username: "root".to_string(),
                password: "rootpw".to_string(),
                is_admin: true,
            },
        ]
    }

    #[test]
    fn login_rejects_bad_credentials() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.login(&users(), "alice", "wrong").is_none());
        assert!(store.login(&users(), "mallory", "secret").is_none());
    }

    #[test]
    fn login_issues_distinct_tokens_and_authenticate_round_trips() {
        let store = SessionStore::new(Duration::from_secs(60));
        let a = store.login(&users(), "alice", "secret").expect("login");
        let b = store.login(&users(), "root", "rootpw").expect("login");
        assert_ne!(a, b);
        let session = store.authenticate(&a).expect("session");
        assert_eq!(session.username, "alice");
        assert!(!session.is_admin);
        assert!(store.authenticate(&b).expect("session").is_admin);
        assert!(store.authenticate("bogus").is_none());
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let store = SessionStore::new(Duration::from_nanos(1));
        let token = store.login(&users(), "alice", "secret").expect("login");
        std::thread::sleep(Duration::from_millis(2));
        assert!(store.authenticate(&token).is_none());
    }

    #[test]
    fn revoked_tokens_stop_authenticating() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.login(&users(), "alice", "secret").expect("login");
        store.revoke(&token);
        assert!(store.authenticate(&token).is_none());
    }

    #[test]
    fn session_token_parses_out_of_a_multi_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; myclinic_session=tok123; lang=fr"),
        );
        assert_eq!(
            session_token_from_headers(&headers).as_deref(),
            Some("tok123")
        );
        headers.insert("cookie", HeaderValue::from_static("theme=dark"));
        assert!(session_token_from_headers(&headers).is_none());
    }
}
