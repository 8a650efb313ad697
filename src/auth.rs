use crate::auth::backend::VaxAuthBackend;
use axum_login::AuthSession;

pub mod backend;
pub mod memory_store;

pub type VaxSession = AuthSession<VaxAuthBackend>;
