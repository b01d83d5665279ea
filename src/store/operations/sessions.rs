use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token_hash: String,
    pub hero_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Store {
    pub fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let key = keys::session_key(&session.token_hash);
        let bytes = Self::serialize(session)?;
        self.sessions.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Returns the session if present and unexpired. Expired rows are removed
    /// on read; there is no background sweeper.
    pub fn get_session(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let key = keys::session_key(token_hash);
        let Some(raw) = self.sessions.get(key.as_bytes())? else {
            return Ok(None);
        };
        let session: Session = Self::deserialize(&raw)?;
        if session.expires_at <= Utc::now() {
            let _ = self.sessions.remove(key.as_bytes());
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        self.sessions
            .remove(keys::session_key(token_hash).as_bytes())?;
        Ok(())
    }
}
