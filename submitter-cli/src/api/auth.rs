//! Portal credentials
//!
//! Storage of credentials is left to the environment; the access key pair is
//! read from `SUBMITTER_ACCESS_KEY` / `SUBMITTER_SECRET_KEY` (a `.env` file is
//! honoured through dotenvy in `main`).

use log::debug;

use super::constants::{ENV_ACCESS_KEY, ENV_SECRET_KEY};

/// Access key pair used for HTTP basic auth
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .finish()
    }
}

impl Credentials {
    /// Read the key pair from the environment. Both halves must be non-empty.
    pub fn from_env() -> Option<Self> {
        let access_key = std::env::var(ENV_ACCESS_KEY).ok()?;
        let secret_key = std::env::var(ENV_SECRET_KEY).ok()?;
        if access_key.trim().is_empty() || secret_key.trim().is_empty() {
            debug!("Ignoring empty portal credentials");
            return None;
        }
        Some(Self {
            access_key,
            secret_key,
        })
    }
}
