//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::sim::{Arena, ArenaHandle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: ArenaHandle,
}

impl AppState {
    /// Create the state and the arena it hands commands to. The caller is
    /// responsible for spawning the returned arena task.
    pub fn new(config: Config) -> (Self, Arena) {
        let config = Arc::new(config);

        let seed = config.arena_seed.unwrap_or_else(rand::random);
        let (arena, handle) = Arena::new(seed);

        (
            Self {
                config,
                arena: handle,
            },
            arena,
        )
    }
}
