use serde::{Deserialize, Serialize};

/// Placeholder username for accounts without an email address.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// An authenticated user identity, as supplied by the auth collaborator.
#[derive(Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
    /// Optional auth JWT for authenticated realtime connections.
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
            access_token: None,
        }
    }

    /// Create an identity from an auth session.
    pub fn from_auth_session(user_id: String, email: Option<String>, access_token: String) -> Self {
        Self {
            user_id,
            email,
            access_token: Some(access_token),
        }
    }

    /// Display username: the local part of the email address (text before
    /// the `@`), or a placeholder when the account has no email.
    pub fn username(&self) -> String {
        match &self.email {
            Some(email) => email.split('@').next().unwrap_or_default().to_string(),
            None => ANONYMOUS_USERNAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_email_local_part() {
        let id = Identity::new("u1", Some("jane@x.com".into()));
        assert_eq!(id.username(), "jane");
    }

    #[test]
    fn username_without_email_is_placeholder() {
        let id = Identity::new("u1", None);
        assert_eq!(id.username(), "Anonymous");
    }

    #[test]
    fn username_email_without_at_is_whole_string() {
        let id = Identity::new("u1", Some("nodomain".into()));
        assert_eq!(id.username(), "nodomain");
    }

    #[test]
    fn username_keeps_only_first_segment() {
        let id = Identity::new("u1", Some("a@b@c".into()));
        assert_eq!(id.username(), "a");
    }

    #[test]
    fn debug_redacts_access_token() {
        let id = Identity::from_auth_session(
            "u1".into(),
            Some("jane@x.com".into()),
            "secret-jwt".into(),
        );
        let debug = format!("{id:?}");
        assert!(!debug.contains("secret-jwt"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn access_token_is_not_serialized() {
        let id = Identity::from_auth_session("u1".into(), None, "secret-jwt".into());
        let json = serde_json::to_string(&id).unwrap();
        assert!(!json.contains("secret-jwt"));
    }
}
