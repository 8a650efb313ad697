use crate::{
    config::AdminConfig,
    error::{BcryptSnafu, JoinSnafu, VaxError},
};
use async_trait::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::sync::Arc;

/// The portal's only kind of user.
#[derive(Clone, Debug)]
pub struct Admin {
    config: Arc<AdminConfig>,
}

impl Admin {
    pub fn username(&self) -> &str {
        &self.config.username
    }
}

impl AuthUser for Admin {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.config.username.clone()
    }

    //changing the configured hash logs everyone out
    fn session_auth_hash(&self) -> &[u8] {
        self.config.bcrypt_hashed_password.expose_secret().as_bytes()
    }
}

#[derive(Clone, Debug)]
pub struct VaxAuthBackend {
    admin: Arc<AdminConfig>,
}

impl VaxAuthBackend {
    pub const fn new(admin: Arc<AdminConfig>) -> Self {
        Self { admin }
    }
}

pub enum VaxAuthCredentials {
    UsernamePassword {
        username: String,
        password: SecretString,
    },
}

#[async_trait]
impl AuthnBackend for VaxAuthBackend {
    type User = Admin;
    type Credentials = VaxAuthCredentials;
    type Error = VaxError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        match creds {
            VaxAuthCredentials::UsernamePassword { username, password } => {
                if username.trim() != self.admin.username {
                    return Ok(None);
                }

                let admin = Arc::clone(&self.admin);
                let password_verification_result = tokio::task::spawn_blocking(move || {
                    bcrypt::verify(
                        password.expose_secret(),
                        admin.bcrypt_hashed_password.expose_secret(),
                    )
                })
                .await
                .context(JoinSnafu)?
                .context(BcryptSnafu)?;

                Ok(password_verification_result.then(|| Admin {
                    config: Arc::clone(&self.admin),
                }))
            }
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        Ok((*user_id == self.admin.username).then(|| Admin {
            config: Arc::clone(&self.admin),
        }))
    }
}

#[cfg(test)]
pub fn test_admin_config() -> AdminConfig {
    AdminConfig {
        username: "admin".into(),
        //cost 4 keeps the tests quick
        bcrypt_hashed_password: SecretString::from(
            bcrypt::hash("correct horse", 4).expect("hashing a fixed password"),
        ),
    }
}
