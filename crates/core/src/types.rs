use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Username/password pair sent to the token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access/refresh pair issued by the token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Response of the refresh endpoint; `refresh` is only present when the
/// backend rotates refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRefresh {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Unverified payload of an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (as UTC timestamp)
    pub exp: i64,
    /// Every other claim, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Server-authoritative user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl User {
    /// Full name when both parts are known, otherwise the username
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{first} {last}")
            }
            (Some(first), _) if !first.is_empty() => first.to_string(),
            _ => self.username.clone(),
        }
    }
}

/// Account creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_confirm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Partial profile; absent fields are left untouched by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Result of registering an account
///
/// The register endpoint answers either with the bare user or with an
/// envelope that also carries freshly issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RegistrationWire")]
pub struct Registration {
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RegistrationWire {
    Envelope {
        user: User,
        #[serde(default)]
        tokens: Option<TokenPair>,
        #[serde(default)]
        message: Option<String>,
    },
    Bare(User),
}

impl From<RegistrationWire> for Registration {
    fn from(wire: RegistrationWire) -> Self {
        match wire {
            RegistrationWire::Envelope {
                user,
                tokens,
                message,
            } => Self {
                user,
                tokens,
                message,
            },
            RegistrationWire::Bare(user) => Self {
                user,
                tokens: None,
                message: None,
            },
        }
    }
}

// Django serializes primary keys as integers, the frontend treats them as strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_accepts_string_and_numeric_ids() {
        let user: User =
            serde_json::from_value(json!({"id": "1", "email": "a@b.com", "username": "a"}))
                .unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.first_name, None);

        let user: User =
            serde_json::from_value(json!({"id": 42, "email": "a@b.com", "username": "a"}))
                .unwrap();
        assert_eq!(user.id, "42");
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("testuser", "testpassword123");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("testuser"));
        assert!(!rendered.contains("testpassword123"));
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"first_name": "Ada"})
        );
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_registration_envelope_and_bare_user() {
        let envelope: Registration = serde_json::from_value(json!({
            "message": "User registered successfully",
            "user": {"id": 7, "email": "n@example.com", "username": "newuser"},
            "tokens": {"access": "A", "refresh": "R"}
        }))
        .unwrap();
        assert_eq!(envelope.user.username, "newuser");
        assert_eq!(
            envelope.tokens,
            Some(TokenPair {
                access: "A".to_string(),
                refresh: "R".to_string()
            })
        );

        let bare: Registration = serde_json::from_value(json!({
            "id": "7", "email": "n@example.com", "username": "newuser"
        }))
        .unwrap();
        assert_eq!(bare.user.id, "7");
        assert!(bare.tokens.is_none());
    }

    #[test]
    fn test_display_name() {
        let mut user = User {
            id: "1".to_string(),
            email: "t@t.com".to_string(),
            username: "testuser".to_string(),
            first_name: None,
            last_name: None,
        };
        assert_eq!(user.display_name(), "testuser");
        user.first_name = Some("Test".to_string());
        user.last_name = Some("User".to_string());
        assert_eq!(user.display_name(), "Test User");
    }
}
