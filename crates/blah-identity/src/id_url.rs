//! ID URLs and identity discovery.
//!
//! An ID URL is an `https` origin with nothing after it: no path, no
//! trailing slash, no query, no fragment and no userinfo. An identity
//! publishes its description at `<ID URL>/.well-known/blah/identity.json`.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IdentityError, Result};

/// Path of the identity description under an ID URL.
pub const IDENTITY_DESCRIPTION_PATH: &str = "/.well-known/blah/identity.json";

/// Check whether a string is a well-formed ID URL.
pub fn validate_id_url_format(s: &str) -> bool {
    let Ok(url) = Url::parse(s) else {
        return false;
    };

    url.scheme() == "https"
        && url.path() == "/"
        && !s.ends_with('/')
        && url.query().is_none()
        && url.fragment().is_none()
        && url.username().is_empty()
        && url.password().is_none()
}

/// Build the URL of the identity description published under `id_url`.
pub fn identity_description_url(id_url: &str) -> Result<Url> {
    if !validate_id_url_format(id_url) {
        return Err(IdentityError::InvalidIdUrl(id_url.to_string()));
    }
    let mut url = Url::parse(id_url).map_err(|e| IdentityError::InvalidIdUrl(e.to_string()))?;
    url.set_path(IDENTITY_DESCRIPTION_PATH);
    Ok(url)
}

/// A validated ID URL. Keeps the string exactly as given so that signed
/// profiles re-serialize byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdUrl(String);

impl IdUrl {
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        Self::try_from(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Where this identity's description is published.
    pub fn description_url(&self) -> Result<Url> {
        identity_description_url(&self.0)
    }
}

impl TryFrom<String> for IdUrl {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self> {
        if validate_id_url_format(&s) {
            Ok(Self(s))
        } else {
            Err(IdentityError::InvalidIdUrl(s))
        }
    }
}

impl From<IdUrl> for String {
    fn from(url: IdUrl) -> Self {
        url.0
    }
}

impl fmt::Display for IdUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
