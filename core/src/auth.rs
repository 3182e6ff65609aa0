//! Session token handling.
//!
//! The API hands out a JWT on login. It is kept in a credentials file under the
//! data directory (or supplied through `TASKDESK_TOKEN`) and checked for expiry
//! before any authenticated screen is shown.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use thiserror::Error;

pub const TOKEN_ENV: &str = "TASKDESK_TOKEN";
const CREDENTIALS_FILE_NAME: &str = "credentials";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not logged in; run `taskdesk login`")]
    NotAuthenticated,

    #[error("session expired; run `taskdesk login` again")]
    TokenExpired,

    #[error("token store error: {0}")]
    TokenStore(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Env,
    File,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Env => "env",
            TokenSource::File => "file",
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct Claims {
    exp: Option<i64>,
    sub: Option<String>,
}

/// An authenticated session that passed the expiry check.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub source: TokenSource,
    pub subject: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
    env_key: Option<&'static str>,
}

impl TokenStore {
    pub fn new(data_dir: &Path) -> Self {
        TokenStore {
            path: data_dir.join(CREDENTIALS_FILE_NAME),
            env_key: Some(TOKEN_ENV),
        }
    }

    /// Ignore the environment override. Tests use this to stay hermetic.
    pub fn without_env(mut self) -> Self {
        self.env_key = None;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn env_token(&self) -> Option<String> {
        let token = std::env::var(self.env_key?).ok()?;
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    /// Whether a token from the environment shadows the credentials file.
    /// Clearing the file does not end such a session.
    pub fn env_override_active(&self) -> bool {
        self.env_token().is_some()
    }

    /// Environment first, then the credentials file. Blank values count as absent.
    pub fn read_auth_token(&self) -> Option<(String, TokenSource)> {
        if let Some(token) = self.env_token() {
            return Some((token, TokenSource::Env));
        }

        fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|t| (t, TokenSource::File))
    }

    pub fn store_auth_token(&self, token: &str) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AuthError::TokenStore(format!("mkdir {}: {e}", parent.display())))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(e) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700)) {
                    tracing::warn!("failed to chmod 0700 {}: {e}", parent.display());
                }
            }
        }

        fs::write(&self.path, token)
            .map_err(|e| AuthError::TokenStore(format!("write {}: {e}", self.path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| AuthError::TokenStore(format!("chmod {}: {e}", self.path.display())))?;
        }

        tracing::info!(path = %self.path.display(), "stored session token");
        Ok(())
    }

    pub fn clear_auth_token(&self) -> Result<(), AuthError> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| {
                AuthError::TokenStore(format!("failed to delete {}: {e}", self.path.display()))
            })?;
        }
        tracing::info!("cleared session token");
        Ok(())
    }

    /// Guard for authenticated screens: a stored token that has not expired.
    pub fn require_session(&self) -> Result<Session, AuthError> {
        self.require_session_at(Utc::now())
    }

    pub fn require_session_at(&self, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let (token, source) = self.read_auth_token().ok_or(AuthError::NotAuthenticated)?;
        if is_auth_expired(&token, now) {
            tracing::debug!(source = source.as_str(), "stored token has expired");
            return Err(AuthError::TokenExpired);
        }

        let claims = decode_claims(&token).unwrap_or_default();
        Ok(Session {
            token,
            source,
            subject: claims.sub,
            expires_at: claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()),
        })
    }
}

fn decode_claims(token: &str) -> Option<Claims> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    // Some issuers keep the padding.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// A token that is not a readable JWT counts as expired. No `exp` claim never expires.
pub fn is_auth_expired(token: &str, now: DateTime<Utc>) -> bool {
    match decode_claims(token) {
        Some(Claims { exp: Some(exp), .. }) => exp <= now.timestamp(),
        Some(Claims { exp: None, .. }) => false,
        None => true,
    }
}

pub fn auth_header(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
