//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and services, and remain testable without I/O.

use std::sync::Arc;

use crate::domain::SuggestionService;
use crate::domain::ports::{TokenVerifier, UserDirectory};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub directory: Arc<dyn UserDirectory>,
    pub suggestions: SuggestionService,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        directory: Arc<dyn UserDirectory>,
        suggestions: SuggestionService,
    ) -> Self {
        Self {
            verifier,
            directory,
            suggestions,
        }
    }
}
