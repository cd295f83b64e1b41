pub mod chat;
pub mod recommend;
pub mod summarize;
pub mod summary;
