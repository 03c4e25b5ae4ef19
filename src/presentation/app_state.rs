// Application state for HTTP handlers
use crate::application::snapshot::Snapshot;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<Snapshot>,
}
