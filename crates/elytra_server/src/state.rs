// SPDX-License-Identifier: MIT

//! Shared state handed to every HTTP and WebSocket handler via
//! `axum::extract::State`. The three pieces are the process-wide
//! singletons called out in spec.md §9 ("global process state") — owned
//! here, injected everywhere, never reached for as an ambient global.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::coordinator::Coordinator;
use crate::registry::Registry;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub registry: Arc<Registry>,
    pub coordinator: Arc<Coordinator>,
}
