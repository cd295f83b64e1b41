use anyhow::Result;

use bookwise_core::chat::{ChatMessage, ChatSession};
use bookwise_core::storage::{Database, PreferenceStore};

pub fn print_message(message: &ChatMessage) {
    let speaker = if message.is_from_user() { "You" } else { "AI" };

    if !message.content().is_empty() {
        println!("{}: {}", speaker, message.content());
    }

    let recommendations = message.recommendations();
    if !recommendations.is_empty() {
        println!("{}:", speaker);
        for (i, rec) in recommendations.iter().enumerate() {
            println!("  {}. {} - {}", i + 1, rec.title, rec.author);
            println!("     {}", rec.reason);
            if !rec.tags.is_empty() {
                println!("     [{}]", rec.tags.join(", "));
            }
        }
    }
    println!();
}

pub async fn history(db: Database) -> Result<()> {
    let mut session = ChatSession::new(PreferenceStore::new(db));
    session.load().await;

    for message in session.current() {
        print_message(message);
    }

    Ok(())
}

pub async fn clear(db: Database) -> Result<()> {
    let mut session = ChatSession::new(PreferenceStore::new(db));
    session.clear().await;

    println!("Chat history cleared.");
    Ok(())
}
