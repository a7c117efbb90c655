//! Application assembly.
//!
//! [`configure_app`] registers every route on an Actix `ServiceConfig` so
//! the binary and the integration tests build identical applications. The
//! REST surface lives under `/api/v1`; the chat upgrade endpoint and the
//! health probes hang off the root.

use std::sync::Arc;

use actix_web::web;

use crate::domain::SuggestionService;
use crate::domain::ports::{
    MembershipOracle, MessageStore, TokenVerifier, TripCatalogue, UserDirectory,
};
use crate::inbound::http::health::{self, HealthState};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::trips;
use crate::inbound::ws;
use crate::inbound::ws::registry::ConnectionRegistry;
use crate::inbound::ws::state::WsState;

/// Every port implementation the application needs, bundled for assembly.
pub struct Ports {
    pub verifier: Arc<dyn TokenVerifier>,
    pub membership: Arc<dyn MembershipOracle>,
    pub messages: Arc<dyn MessageStore>,
    pub directory: Arc<dyn UserDirectory>,
    pub catalogue: Arc<dyn TripCatalogue>,
}

/// Shared state handed to [`configure_app`].
#[derive(Clone)]
pub struct AppState {
    pub http: web::Data<HttpState>,
    pub ws: web::Data<WsState>,
    pub health: web::Data<HealthState>,
}

impl AppState {
    /// Wire adapter state from port implementations.
    pub fn new(ports: Ports) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let suggestions = SuggestionService::new(ports.catalogue);
        Self {
            http: web::Data::new(HttpState::new(
                Arc::clone(&ports.verifier),
                Arc::clone(&ports.directory),
                suggestions,
            )),
            ws: web::Data::new(WsState::new(
                registry,
                ports.verifier,
                ports.membership,
                ports.messages,
                ports.directory,
            )),
            health: web::Data::new(HealthState::new()),
        }
    }
}

/// Register all routes and shared state on `cfg`.
pub fn configure_app(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(state.http.clone())
        .app_data(state.ws.clone())
        .app_data(state.health.clone())
        .service(web::scope("/api/v1").service(trips::suggested_trips))
        .service(ws::chat_entry)
        .service(health::ready)
        .service(health::live);

    #[cfg(debug_assertions)]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        use crate::doc::ApiDoc;

        cfg.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }
}
