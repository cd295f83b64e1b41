mod models;
mod session;

pub use models::{ChatMessage, RequestState};
pub use session::{ChatSession, SESSION_KEY, WELCOME_MESSAGE};
