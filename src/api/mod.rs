//! HTTP surface for the gate.
//!
//! Thin glue: handlers assemble a [`RequestContext`] from the transport,
//! run the state machine, and translate the resulting verdict back into
//! redirects and `Set-Cookie` headers. No gate semantics live here.
//!
//! [`RequestContext`]: crate::gate::machine::RequestContext

pub mod handlers;
pub mod primary;
pub mod sessions;

use anyhow::Result;
use axum::{
    http::{HeaderName, HeaderValue},
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::info;
use ulid::Ulid;

use crate::{
    api::primary::PrimaryAuth,
    gate::{config::PolicyConfig, machine::MfaGate},
    raindrop::RaindropClient,
};

pub type Gate = MfaGate<RaindropClient>;

pub struct GateState {
    gate: Gate,
    users: Arc<dyn PrimaryAuth>,
    secure_cookies: bool,
}

impl GateState {
    #[must_use]
    pub fn new(gate: Gate, users: Arc<dyn PrimaryAuth>, secure_cookies: bool) -> Self {
        Self {
            gate,
            users,
            secure_cookies,
        }
    }

    #[must_use]
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    #[must_use]
    pub fn users(&self) -> &dyn PrimaryAuth {
        self.users.as_ref()
    }

    /// Whether cookies should carry the `Secure` attribute by default.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}

/// Build the router; the setup and verify routes follow the configured
/// page paths.
#[must_use]
pub fn router(config: &PolicyConfig) -> Router {
    Router::new()
        .route("/", get(handlers::login::home))
        .route("/health", get(handlers::health::health))
        .route(
            "/login",
            get(handlers::login::login_page).post(handlers::login::login),
        )
        .route("/logout", post(handlers::login::logout))
        .route(
            config.setup_page(),
            get(handlers::mfa::setup_page).post(handlers::mfa::setup_submit),
        )
        .route(
            config.verify_page(),
            get(handlers::mfa::verify_page).post(handlers::mfa::verify_submit),
        )
}

/// Start the server.
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(port: u16, state: Arc<GateState>) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    let app = router(state.gate().config())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http()),
        )
        .layer(Extension(state));

    info!(port, "hydrogate listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
