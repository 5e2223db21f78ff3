use clap::Args;

use nwl_core::{RemoteStore, Session};

use super::{OutputFormat, Workspace};

/// Show a level and its records
#[derive(Args)]
pub struct ShowCommand {
    /// Level file (e.g. tidal_wave.json)
    pub file: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ShowCommand {
    pub async fn run<S: RemoteStore>(
        &self,
        session: &mut Session<S>,
        workspace: &Workspace,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let path = workspace.level_path(&self.file);
        session.load(&path).await?;

        match self.format {
            OutputFormat::Json => {
                let bytes = session.encoded()?;
                println!("{}", String::from_utf8_lossy(&bytes));
            }
            OutputFormat::Text => {
                let repository = session.repository().ok_or("No document is loaded")?;
                print!("{}", repository.document());
                println!("\nFile: {}", repository.handle().path());
            }
        }
        Ok(())
    }
}
