pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod security;
pub mod services;

pub use error::{ApiError, Result};

use crate::config::Config;
use crate::db::Database;
use crate::realtime::NoteEventPublisher;
use crate::security::TokenSigner;
use crate::services::{AuthService, NoteService};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub signer: TokenSigner,
    pub auth: AuthService,
    pub notes: NoteService,
    pub events: NoteEventPublisher,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let signer = TokenSigner::new(&config.jwt);
        let events = NoteEventPublisher::new();
        let auth = AuthService::new(
            db.pool.clone(),
            signer.clone(),
            chrono::Duration::seconds(config.jwt.refresh_ttl_secs),
        );
        let notes = NoteService::new(db.pool.clone(), events.clone());

        Self {
            config,
            db,
            signer,
            auth,
            notes,
            events,
        }
    }
}
