pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use crate::database::store::DirectoryStore;
use crate::services::workflow::{EngineSettings, WorkflowEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn DirectoryStore>, settings: EngineSettings, jwt_secret: &str) -> Self {
        Self {
            engine: WorkflowEngine::new(store, settings),
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
