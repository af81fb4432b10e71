use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{self, primary::StoreUsers, GateState};
use crate::cli::actions::Action;
use crate::gate::{
    cookie::SigningSecret,
    kv::{KeyValueStore, MemoryStore},
    machine::MfaGate,
};
use crate::raindrop::RaindropClient;

/// Handle the server action
///
/// # Errors
/// Returns an error when the gate cannot be assembled or the server fails.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        secure_cookies,
        policy,
        raindrop,
        seed_users,
    } = action;

    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let secret = SigningSecret::load_or_create(store.as_ref())?;
    let identity = RaindropClient::new(raindrop)?;

    if !policy.enabled() {
        warn!("the MFA gate is disabled; logins will not be challenged");
    }

    let users = StoreUsers::new(Arc::clone(&store));
    for seed in &seed_users {
        let user_id = users.provision(&seed.username, &seed.password, seed.admin)?;
        info!(user_id, username = %seed.username, admin = seed.admin, "seeded user");
    }

    let gate = MfaGate::new(Arc::clone(&store), identity, policy, secret);
    let state = Arc::new(GateState::new(gate, Arc::new(users), secure_cookies));

    api::serve(port, state).await
}
