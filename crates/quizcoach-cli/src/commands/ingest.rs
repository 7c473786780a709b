//! The `quizcoach ingest` command.

use std::path::PathBuf;

use anyhow::Result;

use quizcoach_core::ingest::ingest_files;

pub async fn execute(files: Vec<PathBuf>) -> Result<()> {
    let corpus = ingest_files(&files).await?;
    eprintln!(
        "{} file(s), {} characters",
        files.len(),
        corpus.chars().count()
    );
    println!("{corpus}");
    Ok(())
}
