use std::fmt;

use serde::Serialize;

use super::AuthError;

/// Username and password as entered in a form.
///
/// Never persisted. Fields are checked for emptiness after trimming but
/// sent exactly as entered.
#[derive(Clone, Serialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, AuthError> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() || password.trim().is_empty() {
            return Err(AuthError::Validation);
        }
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
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
