//! Shared WebSocket adapter state.
//!
//! The chat entry point and session tasks depend on domain ports plus the
//! connection registry; bundling them keeps the adapter constructible with
//! deterministic test doubles and the registry injectable per test case
//! rather than hidden behind a global.

use std::sync::Arc;

use crate::domain::ports::{MembershipOracle, MessageStore, TokenVerifier, UserDirectory};

use super::registry::ConnectionRegistry;

/// Dependency bundle for the chat WebSocket adapter.
#[derive(Clone)]
pub struct WsState {
    pub registry: Arc<ConnectionRegistry>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub membership: Arc<dyn MembershipOracle>,
    pub messages: Arc<dyn MessageStore>,
    pub directory: Arc<dyn UserDirectory>,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        verifier: Arc<dyn TokenVerifier>,
        membership: Arc<dyn MembershipOracle>,
        messages: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            registry,
            verifier,
            membership,
            messages,
            directory,
        }
    }
}
