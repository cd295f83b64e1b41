use anyhow::{Context, Result};

use bookwise_core::ai::{Assistant, ChapterContent};

use crate::{ChapterArgs, Credentials};

pub async fn run(
    assistant: &Assistant,
    credentials: &Credentials,
    args: &ChapterArgs,
    regenerate: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read chapter file {}", args.file.display()))?;

    let chapter = ChapterContent {
        book_id: args.book_id.clone(),
        chapter_id: args.chapter_id.clone(),
        book_name: args.book_name.clone(),
        chapter_title: args.chapter_title.clone(),
        content,
    };

    println!("Summarizing '{}' with {}...", chapter.chapter_title, credentials.provider);

    let record = if regenerate {
        assistant
            .regenerate_summary(&credentials.provider, &credentials.api_key, &chapter)
            .await?
    } else {
        assistant
            .generate_summary(&credentials.provider, &credentials.api_key, &chapter)
            .await?
    };

    println!();
    println!("{}", record.text);
    println!();
    println!(
        "Generated by {} at {}",
        record.provider_id,
        record.created_at.format("%Y-%m-%d %H:%M")
    );

    Ok(())
}
