pub mod note;
pub mod token;
pub mod user;

pub use note::{Note, NoteResponse, NoteSearchResult, PagedResponse};
pub use token::{RefreshToken, TokenUsability};
pub use user::User;
