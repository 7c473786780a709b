//! The `quizcoach courses` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizcoach_core::courses::BUILT_IN_COURSES;

pub fn execute() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Slug", "Title", "Characters"]);
    for course in &BUILT_IN_COURSES {
        table.add_row(vec![
            Cell::new(course.slug),
            Cell::new(course.title),
            Cell::new(course.corpus().chars().count()),
        ]);
    }
    println!("{table}");
    println!("\nPlay one with: quizcoach play --name <you> --course <slug>");
    Ok(())
}
