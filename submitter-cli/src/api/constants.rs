//! Portal constants

/// Default read endpoint (GET, profiles)
pub const DEFAULT_ENDPOINT_READ: &str = "https://api.sandbox.igvf.org";

/// Default write endpoint (POST/PUT/PATCH)
pub const DEFAULT_ENDPOINT_WRITE: &str = "https://api.sandbox.igvf.org";

/// Environment variables holding the portal access key pair
pub const ENV_ACCESS_KEY: &str = "SUBMITTER_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "SUBMITTER_SECRET_KEY";

/// Per-request timeout in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

pub const USER_AGENT: &str = concat!("metadata-submitter/", env!("CARGO_PKG_VERSION"));
