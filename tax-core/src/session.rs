//! Authenticated session passed explicitly to every API call.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::ApiError;

/// Login credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Invalidated,
}

/// A logged-in session.
///
/// Created by [`TaxApi::login`](crate::api::TaxApi::login) and invalidated by
/// logout or by the first `Unauthorized` response seen through
/// [`observe`](Self::observe). An invalidated session is never revived; log in
/// again for a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
    token: String,
    issued_at: DateTime<Utc>,
    state: SessionState,
}

impl Session {
    pub fn new(
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            issued_at: Utc::now(),
            state: SessionState::Active,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The bearer token, or [`ApiError::SessionInvalidated`] once the session
    /// has ended.
    pub fn token(&self) -> Result<&str, ApiError> {
        match self.state {
            SessionState::Active => Ok(&self.token),
            SessionState::Invalidated => Err(ApiError::SessionInvalidated),
        }
    }

    pub fn invalidate(&mut self) {
        if self.is_active() {
            info!(username = %self.username, "session invalidated");
        }
        self.state = SessionState::Invalidated;
    }

    /// Passes `result` through, invalidating the session on `Unauthorized`.
    pub fn observe<T>(
        &mut self,
        result: Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        if matches!(result, Err(ApiError::Unauthorized)) {
            self.invalidate();
        }
        result
    }
}

impl fmt::Debug for Session {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("state", &self.state)
            .finish()
    }
}
