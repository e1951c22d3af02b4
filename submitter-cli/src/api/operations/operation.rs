//! Core operation types for portal REST calls

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single REST call against the portal, one per data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Look up an existing object by one of its identifying values
    Fetch {
        /// Identifying value (accession, uuid, alias)
        id: String,
    },
    /// Create a new object in the profile's collection
    Create {
        /// Profile name (e.g., "measurement_set")
        profile: String,
        /// Object data as JSON
        data: Value,
    },
    /// Replace an existing object. Properties missing from `data` are removed remotely.
    Replace {
        id: String,
        data: Value,
    },
    /// Partially update an existing object
    Update {
        id: String,
        data: Value,
    },
}

impl Operation {
    pub fn fetch(id: impl Into<String>) -> Self {
        Self::Fetch { id: id.into() }
    }

    pub fn create(profile: impl Into<String>, data: Value) -> Self {
        Self::Create {
            profile: profile.into(),
            data,
        }
    }

    pub fn replace(id: impl Into<String>, data: Value) -> Self {
        Self::Replace {
            id: id.into(),
            data,
        }
    }

    pub fn update(id: impl Into<String>, data: Value) -> Self {
        Self::Update {
            id: id.into(),
            data,
        }
    }

    /// Get the HTTP method for this operation
    pub fn http_method(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "GET",
            Self::Create { .. } => "POST",
            Self::Replace { .. } => "PUT",
            Self::Update { .. } => "PATCH",
        }
    }

    /// Request body, if the method carries one
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Fetch { .. } => None,
            Self::Create { data, .. } | Self::Replace { data, .. } | Self::Update { data, .. } => {
                Some(data)
            }
        }
    }

    /// Relative path of the target resource, without the endpoint
    pub fn path(&self) -> String {
        match self {
            Self::Fetch { id } => format!("{}/?frame=object", urlencoding::encode(id)),
            Self::Create { profile, .. } => format!("{}/", urlencoding::encode(profile)),
            Self::Replace { id, .. } | Self::Update { id, .. } => {
                format!("{}/", urlencoding::encode(id))
            }
        }
    }
}

/// Raw portal reply: status code and optional JSON body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl PortalResponse {
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// The returned object. Write responses wrap it as `{"@graph": [object]}`.
    pub fn object(&self) -> Option<&serde_json::Map<String, Value>> {
        let body = self.body.as_ref()?;
        match body.get("@graph").and_then(Value::as_array) {
            Some(graph) => graph.first().and_then(Value::as_object),
            None => body.as_object(),
        }
    }

    /// One-line summary of the reply for the response column
    pub fn short_message(&self) -> String {
        if self.is_success() {
            return "success".to_string();
        }
        let described = self.body.as_ref().and_then(|body| {
            ["description", "detail", "title"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str))
        });
        match described {
            Some(text) => text.to_string(),
            None if self.is_not_found() => "not found".to_string(),
            None => "request failed".to_string(),
        }
    }
}
