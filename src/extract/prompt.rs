use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::{ExtractError, Result};

/// Asks whether an existing output file may be replaced
#[cfg_attr(test, mockall::automock)]
pub trait OverwritePrompt {
    fn confirm_overwrite(&self, path: &Path) -> Result<bool>;
}

/// Interactive prompt on stdin/stdout
pub struct StdinPrompt;

impl OverwritePrompt for StdinPrompt {
    fn confirm_overwrite(&self, _path: &Path) -> Result<bool> {
        print!("Overwrite? (y/n): ");
        io::stdout()
            .flush()
            .map_err(|e| ExtractError::Unexpected(format!("Failed to write prompt: {}", e)))?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|e| ExtractError::Unexpected(format!("Failed to read answer: {}", e)))?;

        Ok(is_affirmative(&answer))
    }
}

/// Only `y` and `yes` count, in any case
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
