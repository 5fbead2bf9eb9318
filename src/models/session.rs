use crate::error::DexcomError;
use crate::models::oauth::{OAuthRequest, TokenState};
use crate::models::readings::LoadedReadings;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

pub const SESSION_KEY: &str = "dexcom_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    AwaitingCallback,
    Authenticated,
    Refreshing,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Everything one browser session owns. Stored whole under [`SESSION_KEY`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub token: Option<TokenState>,
    pub pending: Option<OAuthRequest>,
    pub last_load: Option<LoadedReadings>,
    /// Notices queued for the next page render.
    #[serde(default)]
    pub flash: Vec<Notice>,
}

impl SessionContext {
    pub async fn load(session: &Session) -> Result<Self, DexcomError> {
        Ok(session.get::<Self>(SESSION_KEY).await?.unwrap_or_default())
    }

    pub async fn store(&self, session: &Session) -> Result<(), DexcomError> {
        session.insert(SESSION_KEY, self).await?;
        Ok(())
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.token, &self.pending) {
            (Some(_), _) => SessionPhase::Authenticated,
            (None, Some(_)) => SessionPhase::AwaitingCallback,
            (None, None) => SessionPhase::Unauthenticated,
        }
    }

    pub fn take_flash(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.flash)
    }
}
