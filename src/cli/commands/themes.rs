//! Themes Command
//!
//! Lists the built-in thematic analysis catalog.

use crate::ai::THEMES;
use crate::cli::output::Output;
use crate::types::Result;

pub fn run() -> Result<()> {
    let out = Output::new();
    out.section("Available themes");
    for theme in THEMES {
        println!("  {}", theme);
    }
    println!("\nUse with: finsight analyze <file> --kind thematic --theme \"<name>\"");
    Ok(())
}
