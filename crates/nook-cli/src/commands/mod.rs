//! Command handlers, one module per entity.

pub mod note;
pub mod project;
pub mod resource;

use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Ask for confirmation before a destructive action. Skipped (treated as
/// yes) when `assume_yes` is set.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
