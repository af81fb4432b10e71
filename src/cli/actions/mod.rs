pub mod server;

use crate::{gate::config::PolicyConfig, raindrop::RaindropConfig};

/// A user provisioned into the in-memory store at startup.
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    pub admin: bool,
}

pub enum Action {
    Server {
        port: u16,
        secure_cookies: bool,
        policy: PolicyConfig,
        raindrop: RaindropConfig,
        seed_users: Vec<SeedUser>,
    },
}
