use chrono::Utc;

use crate::config::Config;

/// Credentials and stamps shared by every request of one client session.
///
/// Built once and only ever borrowed; nothing in the crate mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub auth_token: String,
    pub project_id: String,
    /// Unix timestamp (seconds) identifying this session in stored results.
    pub session_id: i64,
}

impl SessionContext {
    pub fn new(auth_token: impl Into<String>, project_id: impl Into<String>) -> SessionContext {
        SessionContext {
            auth_token: auth_token.into(),
            project_id: project_id.into(),
            session_id: Utc::now().timestamp(),
        }
    }

    pub fn from_config(config: &Config) -> SessionContext {
        Self::new(config.auth_token.clone(), config.project_id.clone())
    }
}
