use crate::error::ConfigError;
use std::fmt;

pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";
pub const USER_AGENT_VAR: &str = "USER_AGENT";
pub const USERNAME_VAR: &str = "REDDIT_USERNAME";
pub const PASSWORD_VAR: &str = "REDDIT_PASSWORD";

/// Every variable a run needs, in the order they are reported when missing.
pub const REQUIRED_VARS: [&str; 5] = [
    CLIENT_ID_VAR,
    CLIENT_SECRET_VAR,
    USER_AGENT_VAR,
    USERNAME_VAR,
    PASSWORD_VAR,
];

/// Script-app credentials for the Reddit password grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Loads credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads credentials through `lookup`. Empty values count as missing, and
    /// the error names every missing variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = Vec::with_capacity(REQUIRED_VARS.len());
        let mut missing = Vec::new();

        for name in REQUIRED_VARS {
            match lookup(name).filter(|value| !value.is_empty()) {
                Some(value) => values.push(value),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnvironmentVariables { names: missing });
        }

        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        Ok(Self {
            client_id: next(),
            client_secret: next(),
            user_agent: next(),
            username: next(),
            password: next(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
