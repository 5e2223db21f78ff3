//! Whole-document transfer between the remote folder and local files.

use clap::Args;
use std::path::PathBuf;

use nwl_core::codec;
use nwl_core::{RemoteStore, Session};

use super::Workspace;

/// Print a level file as canonical JSON
#[derive(Args)]
pub struct ExportCommand {
    /// Level file (e.g. tidal_wave.json)
    pub file: String,
}

impl ExportCommand {
    pub async fn run<S: RemoteStore>(
        &self,
        session: &mut Session<S>,
        workspace: &Workspace,
    ) -> Result<(), Box<dyn std::error::Error>> {
        session.load(&workspace.level_path(&self.file)).await?;
        let bytes = session.encoded()?;
        println!("{}", String::from_utf8_lossy(&bytes));
        Ok(())
    }
}

/// Replace a level file with the contents of a local JSON file
#[derive(Args)]
pub struct ImportCommand {
    /// Level file to replace (e.g. tidal_wave.json)
    pub file: String,

    /// Local JSON file with the new contents
    pub path: PathBuf,
}

impl ImportCommand {
    pub async fn run<S: RemoteStore>(
        &self,
        session: &mut Session<S>,
        workspace: &Workspace,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| format!("Failed to read '{}': {}", self.path.display(), e))?;
        let document = codec::decode(&bytes)?;

        let repository = session.load(&workspace.level_path(&self.file)).await?;
        let file_name = repository.handle().file_name().to_string();

        let count = document.records.len();
        session.edit(|repo| repo.replace_document(document))?;
        session
            .save(&format!("Replace contents of {}", file_name))
            .await?;

        println!("Replaced {} ({} records)", file_name, count);
        Ok(())
    }
}
