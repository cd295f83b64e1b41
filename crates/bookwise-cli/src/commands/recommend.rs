use anyhow::Result;

use bookwise_core::ai::Assistant;
use bookwise_core::chat::ChatSession;
use bookwise_core::storage::PreferenceStore;

use super::chat::print_message;
use crate::Credentials;

pub async fn run(assistant: &Assistant, credentials: &Credentials, query: &str) -> Result<()> {
    let mut session = ChatSession::new(PreferenceStore::new(assistant.database().clone()));
    session.load().await;

    println!("Asking {} for recommendations...\n", credentials.provider);

    let result = session
        .request_recommendations(assistant, &credentials.provider, &credentials.api_key, query)
        .await;

    // The session appends either the recommendations or an error reply
    if let Some(reply) = session.current().last() {
        print_message(reply);
    }

    result?;
    Ok(())
}
