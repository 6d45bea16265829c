//! Cookie-backed session holding the bearer token and user id.
use cookie::{Cookie, CookieJar};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::UserId;

pub const TOKEN_COOKIE: &str = "token";
pub const USER_ID_COOKIE: &str = "userID";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("I/O error reading cookie store: {0}")]
    Io(#[from] std::io::Error),
    #[error("not logged in: cookie `{0}` is missing")]
    Missing(&'static str),
    #[error("cookie `userID` is not a number: {0}")]
    BadUserId(String),
}

/// Credentials passed explicitly into every authenticated call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: UserId,
}

impl Credentials {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Header(String),
}

/// Owns the cookie store and the read/refresh lifecycle of credentials.
#[derive(Debug)]
pub struct Session {
    source: Source,
    jar: CookieJar,
}

impl Session {
    /// A session backed by a file holding a `Cookie:` header value.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let mut session = Self {
            source: Source::File(path.into()),
            jar: CookieJar::new(),
        };
        session.refresh()?;
        Ok(session)
    }

    /// A session backed by a fixed header value such as `token=abc; userID=3`.
    pub fn from_header(header: impl Into<String>) -> Self {
        let header = header.into();
        let jar = parse_jar(&header);
        Self {
            source: Source::Header(header),
            jar,
        }
    }

    /// Re-read the cookie store. Header-backed sessions are fixed.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        if let Source::File(path) = &self.source {
            self.jar = read_jar(path)?;
            info!(path=%path.display(), "loaded cookie store");
        }
        Ok(())
    }

    pub fn credentials(&self) -> Result<Credentials, SessionError> {
        let token = self
            .jar
            .get(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::Missing(TOKEN_COOKIE))?;
        let user_id = self
            .jar
            .get(USER_ID_COOKIE)
            .ok_or(SessionError::Missing(USER_ID_COOKIE))?
            .value();
        let user_id = user_id
            .trim()
            .parse::<UserId>()
            .map_err(|_| SessionError::BadUserId(user_id.to_string()))?;
        Ok(Credentials { token, user_id })
    }
}

fn read_jar(path: &Path) -> Result<CookieJar, SessionError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_jar(content.trim()))
}

fn parse_jar(header: &str) -> CookieJar {
    let header = header.strip_prefix("Cookie:").unwrap_or(header).trim();
    let mut jar = CookieJar::new();
    for cookie in Cookie::split_parse_encoded(header.to_string()) {
        match cookie {
            Ok(c) => jar.add_original(c),
            Err(e) => warn!(?e, "skipping unparsable cookie"),
        }
    }
    jar
}
