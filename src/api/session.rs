use actix_session::Session;
use serde::{Deserialize, Serialize};

use crate::api::error::AppError;
use crate::token::random_token;

const SESSION_KEY: &str = "jobeet_user";

/// How many recently viewed jobs the history keeps
pub const JOB_HISTORY_SIZE: usize = 3;

/// Per-visitor state carried in the session cookie. Handlers load it at the
/// start of a request, mutate it, and store it back before responding.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserContext {
    csrf_token: String,
    job_history: Vec<i32>,
    flash: Option<String>,
}

impl UserContext {
    /// Read the context from the session, issuing an anti-forgery token on first use
    pub fn load(session: &Session) -> Result<Self, AppError> {
        let mut context = session.get::<UserContext>(SESSION_KEY)?.unwrap_or_default();
        if context.csrf_token.is_empty() {
            context.csrf_token = random_token();
        }
        Ok(context)
    }

    pub fn store(&self, session: &Session) -> Result<(), AppError> {
        session.insert(SESSION_KEY, self)?;
        Ok(())
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// Reject state-changing requests whose submitted token does not match
    pub fn check_csrf(&self, submitted: Option<&str>) -> Result<(), AppError> {
        match submitted {
            Some(token) if !self.csrf_token.is_empty() && token == self.csrf_token => Ok(()),
            Some(_) => Err(AppError::Forbidden("CSRF attack detected.".to_string())),
            None => Err(AppError::Forbidden("CSRF token is missing.".to_string())),
        }
    }

    /// Most recently viewed job first, without duplicates
    pub fn add_job_to_history(&mut self, job_id: i32) {
        self.job_history.retain(|id| *id != job_id);
        self.job_history.insert(0, job_id);
        self.job_history.truncate(JOB_HISTORY_SIZE);
    }

    pub fn job_history(&self) -> &[i32] {
        &self.job_history
    }

    pub fn set_flash(&mut self, message: impl Into<String>) {
        self.flash = Some(message.into());
    }

    /// A flash is displayed once, taking it clears it
    pub fn take_flash(&mut self) -> Option<String> {
        self.flash.take()
    }
}
