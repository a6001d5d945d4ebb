pub mod clear;
pub mod daemon;
pub mod delete;
pub mod list;
pub mod recall;
pub mod status;

use std::io::Read;

use anyhow::{Context, Result};

/// Read a picker selection from stdin. Trailing newline handling is left to
/// the store's resolution logic so leading whitespace survives.
pub fn read_selection() -> Result<String> {
    let mut selection = String::new();
    std::io::stdin()
        .read_to_string(&mut selection)
        .context("reading selection from stdin")?;
    Ok(selection)
}
