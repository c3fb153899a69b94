pub mod auth_service;
pub mod note_service;

pub use auth_service::{AuthService, RefreshedSession, SessionTokens};
pub use note_service::NoteService;
