// In-memory store and mailer adapters
//
// Back the same ports as the Postgres adapters, with the conditional writes
// done under a single lock. Handler tests run entirely on these.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::mailer::{Mailer, MailerError};
use crate::auth::models::{NewUser, OtpToken, Role, User};
use crate::auth::store::{OtpStore, StoreError, UserStore};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.username == username))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            username: user.username,
            profile_pic_url: String::new(),
            is_verified: false,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn delete_unverified(&self, email: &str) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        users.retain(|_, u| u.email != email || u.is_verified);
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            user.is_verified = true;
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOtpStore {
    tokens: Arc<RwLock<Vec<OtpToken>>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn issue(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();

        // Retire stale unused rows, then enforce one active code per email
        for token in tokens.iter_mut() {
            if token.email == email && !token.used && token.expires_at <= now {
                token.used = true;
            }
        }
        if tokens.iter().any(|t| t.email == email && !t.used) {
            return Err(StoreError::ActiveCodeExists);
        }

        tokens.push(OtpToken {
            id: Uuid::new_v4(),
            email: email.to_string(),
            code: code.to_string(),
            expires_at,
            used: false,
            created_at: now,
        });
        Ok(())
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.write().await;
        match tokens
            .iter_mut()
            .find(|t| t.email == email && t.code == code && !t.used && t.expires_at > now)
        {
            Some(token) => {
                token.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn retire_all(&self, email: &str) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().await;
        for token in tokens.iter_mut() {
            if token.email == email && !token.used {
                token.used = true;
            }
        }
        Ok(())
    }
}

/// Records outgoing mail instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (recipient, code) pairs in send order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, code)| code.clone())
    }

    pub fn last_code_for(&self, recipient: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == recipient)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_otp(&self, recipient: &str, code: &str) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), code.to_string()));
        Ok(())
    }
}

/// Refuses every send; simulates an unreachable SMTP relay
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_otp(&self, _recipient: &str, _code: &str) -> Result<(), MailerError> {
        Err(MailerError::Failed("smtp relay unreachable".to_string()))
    }
}
