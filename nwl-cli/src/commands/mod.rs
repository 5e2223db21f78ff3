use clap::ValueEnum;
use std::io::{self, Write};

use nwl_core::join_path;

mod config_cmd;
mod document;
mod level;
mod list;
mod record;
mod reorder;
mod show;

pub use config_cmd::ConfigCommand;
pub use document::{ExportCommand, ImportCommand};
pub use level::LevelCommand;
pub use list::ListCommand;
pub use record::RecordCommand;
pub use reorder::ReorderCommand;
pub use show::ShowCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Where level files are read from and written to.
pub struct Workspace {
    pub folder: String,
}

impl Workspace {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    /// Resolves a level file argument to its remote path. The `.json`
    /// extension may be omitted.
    pub fn level_path(&self, file: &str) -> String {
        let file = file.trim().trim_start_matches('/');
        if file.ends_with(".json") {
            join_path(&self.folder, file)
        } else {
            join_path(&self.folder, &format!("{}.json", file))
        }
    }
}

/// Turns a 1-based record number from the command line into an index.
fn record_index(number: usize) -> Result<usize, String> {
    number
        .checked_sub(1)
        .ok_or_else(|| "Record numbers start at 1".to_string())
}

/// Asks a yes/no question on stdin; anything but `y` means no.
fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_path() {
        let ws = Workspace::new("data");
        assert_eq!(ws.level_path("tidal_wave.json"), "data/tidal_wave.json");
        assert_eq!(ws.level_path("tidal_wave"), "data/tidal_wave.json");
    }

    #[test]
    fn test_record_index_is_one_based() {
        assert_eq!(record_index(1).unwrap(), 0);
        assert_eq!(record_index(12).unwrap(), 11);
        assert!(record_index(0).is_err());
    }
}
