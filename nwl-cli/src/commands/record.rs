use clap::{Args, Subcommand};

use nwl_core::{Record, RemoteStore, Session};

use super::{confirm, record_index, Workspace};

#[derive(Args)]
pub struct RecordCommand {
    #[command(subcommand)]
    pub command: RecordSubcommand,
}

#[derive(Subcommand)]
pub enum RecordSubcommand {
    /// Append a record to a level
    Add {
        /// Level file (e.g. tidal_wave.json)
        file: String,

        /// Player name
        #[arg(long, short)]
        user: String,

        /// Video link
        #[arg(long, short)]
        link: String,

        /// Percent reached
        #[arg(long, short, default_value = "100")]
        percent: String,

        /// Refresh rate (e.g. 240 or 360fps)
        #[arg(long, default_value = "")]
        hz: String,

        /// Record was set on a mobile device
        #[arg(long)]
        mobile: bool,
    },

    /// Change fields of a record; fields not given keep their value
    Update {
        /// Level file (e.g. tidal_wave.json)
        file: String,

        /// Record number as shown by `nwl show`
        number: usize,

        /// New player name
        #[arg(long, short)]
        user: Option<String>,

        /// New video link
        #[arg(long, short)]
        link: Option<String>,

        /// New percent
        #[arg(long, short)]
        percent: Option<String>,

        /// New refresh rate
        #[arg(long)]
        hz: Option<String>,

        /// Mobile flag (`--mobile` alone means true)
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        mobile: Option<bool>,
    },

    /// Remove a record from a level
    Remove {
        /// Level file (e.g. tidal_wave.json)
        file: String,

        /// Record number as shown by `nwl show`
        number: usize,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl RecordCommand {
    pub async fn run<S: RemoteStore>(
        &self,
        session: &mut Session<S>,
        workspace: &Workspace,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RecordSubcommand::Add {
                file,
                user,
                link,
                percent,
                hz,
                mobile,
            } => {
                session.load(&workspace.level_path(file)).await?;

                let (number, record) = session.edit(|repo| {
                    let record = Record::from_fields(user, link, percent, hz, *mobile)?;
                    repo.add(record.clone())?;
                    Ok((repo.records().len(), record))
                })?;

                save_records(session).await?;
                println!("Added record #{}: {}", number, record);
                Ok(())
            }

            RecordSubcommand::Update {
                file,
                number,
                user,
                link,
                percent,
                hz,
                mobile,
            } => {
                let index = record_index(*number)?;
                session.load(&workspace.level_path(file)).await?;

                let updated = session.edit(|repo| {
                    let current = repo.record(index)?;
                    let mut record = Record::from_fields(
                        user.as_deref().unwrap_or(&current.user),
                        link.as_deref().unwrap_or(&current.link),
                        &percent.clone().unwrap_or_else(|| current.percent.to_string()),
                        hz.as_deref().unwrap_or(&current.hz),
                        mobile.unwrap_or(current.mobile),
                    )?;
                    record.extra = current.extra.clone();
                    repo.update(index, record.clone())?;
                    Ok(record)
                })?;

                save_records(session).await?;
                println!("Updated record #{}: {}", number, updated);
                Ok(())
            }

            RecordSubcommand::Remove {
                file,
                number,
                force,
            } => {
                let index = record_index(*number)?;
                let repository = session.load(&workspace.level_path(file)).await?;
                let record = repository.record(index)?.clone();

                if !force && !confirm(&format!("Remove record #{} ({})?", number, record))? {
                    println!("Removal cancelled.");
                    return Ok(());
                }

                session.edit(|repo| repo.remove(index))?;
                save_records(session).await?;
                println!("Removed record #{}: {}", number, record);
                Ok(())
            }
        }
    }
}

async fn save_records<S: RemoteStore>(
    session: &mut Session<S>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = session
        .repository()
        .map(|repo| repo.handle().file_name().to_string())
        .ok_or("No document is loaded")?;
    session
        .save(&format!("Update records in {}", file))
        .await?;
    Ok(())
}
