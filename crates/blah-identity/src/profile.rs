//! User profiles.
//!
//! A profile is an ordinary payload signed by one of the identity's act
//! keys. Its shape is enforced at deserialization time.

use std::fmt;

use blah_core::schema::non_empty;
use blah_core::CoreError;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{IdentityError, Result};
use crate::id_url::IdUrl;

/// Literal `typ` tag of a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    #[default]
    Profile,
}

/// A blah user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub typ: ProfileType,
    pub preferred_chat_server_urls: Vec<AbsoluteUrl>,
    /// At least one ID URL.
    #[serde(deserialize_with = "non_empty")]
    pub id_urls: Vec<IdUrl>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl Profile {
    /// Create a profile with a display name and its first ID URL.
    pub fn new(name: impl Into<String>, id_url: IdUrl) -> Self {
        Self {
            typ: ProfileType::Profile,
            preferred_chat_server_urls: Vec::new(),
            id_urls: vec![id_url],
            name: name.into(),
            bio: None,
        }
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_id_url(mut self, id_url: IdUrl) -> Self {
        self.id_urls.push(id_url);
        self
    }

    pub fn with_chat_server(mut self, url: AbsoluteUrl) -> Self {
        self.preferred_chat_server_urls.push(url);
        self
    }

    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.id_urls.is_empty() {
            return Err(CoreError::SchemaValidation(
                "profile must list at least one ID URL".into(),
            )
            .into());
        }
        Ok(())
    }
}

/// An absolute URL, kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AbsoluteUrl(String);

impl AbsoluteUrl {
    pub fn parse(s: impl Into<String>) -> Result<Self> {
        Self::try_from(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AbsoluteUrl {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self> {
        Url::parse(&s).map_err(|e| IdentityError::InvalidUrl(format!("{s}: {e}")))?;
        Ok(Self(s))
    }
}

impl From<AbsoluteUrl> for String {
    fn from(url: AbsoluteUrl) -> Self {
        url.0
    }
}

impl fmt::Display for AbsoluteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blah_core::schema;
    use serde_json::json;

    fn sample() -> Profile {
        Profile::new("Shibo Lyu", IdUrl::parse("https://localhost").unwrap())
    }

    #[test]
    fn test_profile_wire_shape() {
        let profile = sample().with_chat_server(AbsoluteUrl::parse("https://chat.lao.sb").unwrap());
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({
                "typ": "profile",
                "preferred_chat_server_urls": ["https://chat.lao.sb"],
                "id_urls": ["https://localhost"],
                "name": "Shibo Lyu",
            })
        );
    }

    #[test]
    fn test_bio_is_optional() {
        let parsed: Profile = schema::parse(json!({
            "typ": "profile",
            "preferred_chat_server_urls": [],
            "id_urls": ["https://lao.sb"],
            "name": "x",
            "bio": "hello",
        }))
        .unwrap();
        assert_eq!(parsed.bio.as_deref(), Some("hello"));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let base = json!({
            "typ": "profile",
            "preferred_chat_server_urls": [],
            "id_urls": ["https://lao.sb"],
            "name": "x",
        });

        let mut wrong_typ = base.clone();
        wrong_typ["typ"] = json!("user_act_key");
        let mut no_id_urls = base.clone();
        no_id_urls["id_urls"] = json!([]);
        let mut bad_id_url = base.clone();
        bad_id_url["id_urls"] = json!(["https://lao.sb/"]);
        let mut bad_server = base.clone();
        bad_server["preferred_chat_server_urls"] = json!(["not a url"]);
        let mut extra = base.clone();
        extra["avatar"] = json!("x");

        for doc in [wrong_typ, no_id_urls, bad_id_url, bad_server, extra] {
            assert!(matches!(
                schema::parse::<Profile>(doc),
                Err(CoreError::SchemaValidation(_))
            ));
        }
        assert!(schema::parse::<Profile>(base).is_ok());
    }

    #[test]
    fn test_validate_requires_id_url() {
        let mut profile = sample();
        assert!(profile.validate().is_ok());
        profile.id_urls.clear();
        assert!(matches!(
            profile.validate(),
            Err(IdentityError::Core(CoreError::SchemaValidation(_)))
        ));
    }
}
