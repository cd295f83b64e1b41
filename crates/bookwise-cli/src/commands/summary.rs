use anyhow::Result;

use bookwise_core::storage::{Database, SummaryRecord, SummaryRepository};

fn print_record(record: &SummaryRecord) {
    println!(
        "  {} ({}, {})",
        record.chapter_id,
        record.provider_id,
        record.created_at.format("%Y-%m-%d %H:%M")
    );
    println!("    {}", record.text);
    println!();
}

pub async fn show(db: &Database, book_id: &str, chapter_id: Option<&str>) -> Result<()> {
    let repo = SummaryRepository::new(db);

    let records: Vec<SummaryRecord> = match chapter_id {
        Some(chapter_id) => repo.get(book_id, chapter_id).await?.into_iter().collect(),
        None => repo.list_for_book(book_id).await?,
    };

    if records.is_empty() {
        println!("No cached summaries.");
        return Ok(());
    }

    println!("Summaries for {} ({}):\n", book_id, records.len());
    for record in &records {
        print_record(record);
    }

    Ok(())
}

pub async fn purge(db: &Database, book_id: &str, chapter_id: Option<&str>) -> Result<()> {
    let repo = SummaryRepository::new(db);

    match chapter_id {
        Some(chapter_id) => {
            if repo.delete_one(book_id, chapter_id).await? {
                println!("Deleted summary of {} / {}.", book_id, chapter_id);
            } else {
                println!("No summary cached for {} / {}.", book_id, chapter_id);
            }
        }
        None => {
            let deleted = repo.delete_for_book(book_id).await?;
            println!("Deleted {} summaries of {}.", deleted, book_id);
        }
    }

    Ok(())
}

pub async fn count(db: &Database, book_id: &str) -> Result<()> {
    let count = SummaryRepository::new(db).count_for_book(book_id).await?;
    println!("{} cached summaries for {}.", count, book_id);
    Ok(())
}
