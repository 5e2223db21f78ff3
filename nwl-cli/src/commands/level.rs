use clap::{Args, Subcommand};

use std::str::FromStr;

use nwl_core::{
    parse_creators, AredlClient, LevelDocument, LevelMetadata, RemoteStore, RepositoryError,
    Session,
};

use super::{confirm, Workspace};

#[derive(Args)]
pub struct LevelCommand {
    #[command(subcommand)]
    pub command: LevelSubcommand,
}

/// Metadata fields shared by `create` and `edit`.
#[derive(Args, Default, Clone)]
pub struct MetadataArgs {
    /// Level ID in the game
    #[arg(long)]
    pub id: Option<String>,

    /// Level name
    #[arg(long, short)]
    pub name: Option<String>,

    /// Publisher of the level
    #[arg(long, short)]
    pub author: Option<String>,

    /// Player who verified the level
    #[arg(long, short)]
    pub verifier: Option<String>,

    /// Comma-separated list of creators
    #[arg(long)]
    pub creators: Option<String>,

    /// Verification video link
    #[arg(long)]
    pub verification: Option<String>,

    /// Percent a record needs to count
    #[arg(long)]
    pub percent_to_qualify: Option<String>,
}

impl MetadataArgs {
    /// Overlays the given fields on `base`. Fields not given are kept
    /// exactly as they are.
    fn apply(&self, base: LevelMetadata) -> Result<LevelMetadata, RepositoryError> {
        let mut metadata = base;
        if let Some(id) = &self.id {
            metadata.id = parse_integer("id", id)?;
        }
        if let Some(name) = &self.name {
            metadata.name = name.trim().to_string();
        }
        if let Some(author) = &self.author {
            metadata.author = author.trim().to_string();
        }
        if let Some(verifier) = &self.verifier {
            metadata.verifier = verifier.trim().to_string();
        }
        if let Some(creators) = &self.creators {
            metadata.creators = parse_creators(creators);
        }
        if let Some(verification) = &self.verification {
            metadata.verification = verification.trim().to_string();
        }
        if let Some(percent) = &self.percent_to_qualify {
            metadata.percent_to_qualify = parse_integer("percentToQualify", percent)?;
        }
        Ok(metadata)
    }

    fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.author.is_none()
            && self.verifier.is_none()
            && self.creators.is_none()
            && self.verification.is_none()
            && self.percent_to_qualify.is_none()
    }
}

#[derive(Subcommand)]
pub enum LevelSubcommand {
    /// Create a new level file with no records
    Create {
        #[command(flatten)]
        fields: MetadataArgs,

        /// Prefill fields from the AREDL entry with this level ID
        #[arg(long, value_name = "ID")]
        from_aredl: Option<String>,
    },

    /// Change level metadata; fields not given keep their value
    Edit {
        /// Level file (e.g. tidal_wave.json)
        file: String,

        #[command(flatten)]
        fields: MetadataArgs,
    },

    /// Delete a level file
    Delete {
        /// Level file (e.g. tidal_wave.json)
        file: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl LevelCommand {
    pub async fn run<S: RemoteStore>(
        &self,
        session: &mut Session<S>,
        workspace: &Workspace,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            LevelSubcommand::Create { fields, from_aredl } => {
                let prefill = match from_aredl {
                    Some(level_id) => {
                        let metadata = AredlClient::new().fetch_level(level_id).await?;
                        println!("Imported '{}' from AREDL.", metadata.name);
                        Some(metadata)
                    }
                    None => None,
                };
                create_level(session, workspace, fields, prefill).await
            }

            LevelSubcommand::Edit { file, fields } => {
                if fields.is_empty() {
                    return Err("Nothing to change; pass at least one field".into());
                }

                let repository = session.load(&workspace.level_path(file)).await?;
                let metadata = fields.apply(repository.document().metadata())?;
                let file_name = repository.handle().file_name().to_string();

                session.edit(|repo| repo.update_metadata(metadata))?;
                session
                    .save(&format!("Update metadata for {}", file_name))
                    .await?;

                if let Some(repository) = session.repository() {
                    println!("Updated level:");
                    print!("{}", repository.document());
                }
                Ok(())
            }

            LevelSubcommand::Delete { file, force } => {
                let repository = session.load(&workspace.level_path(file)).await?;
                let name = repository.document().name.clone();
                let file_name = repository.handle().file_name().to_string();

                if !force
                    && !confirm(&format!(
                        "Delete level '{}' ({})? This cannot be undone.",
                        name, file_name
                    ))?
                {
                    println!("Deletion cancelled.");
                    return Ok(());
                }

                session
                    .delete(&format!("Delete level: {}", file_name))
                    .await?;
                println!("Deleted level: {} ({})", name, file_name);
                Ok(())
            }
        }
    }
}

fn parse_integer<T: FromStr>(field: &str, value: &str) -> Result<T, RepositoryError> {
    value.trim().parse::<T>().map_err(|_| {
        RepositoryError::Validation(format!("{} must be an integer, got '{}'", field, value))
    })
}

/// Creates a level from the command-line fields, optionally layered over
/// prefilled metadata.
async fn create_level<S: RemoteStore>(
    session: &mut Session<S>,
    workspace: &Workspace,
    fields: &MetadataArgs,
    prefill: Option<LevelMetadata>,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = match prefill {
        Some(base) => fields.apply(base)?,
        None => LevelMetadata::from_fields(
            fields.id.as_deref().unwrap_or(""),
            fields.name.as_deref().unwrap_or(""),
            fields.author.as_deref().unwrap_or(""),
            fields.verifier.as_deref().unwrap_or(""),
            fields.creators.as_deref().unwrap_or(""),
            fields.verification.as_deref().unwrap_or(""),
            fields.percent_to_qualify.as_deref().unwrap_or("100"),
        )?,
    };
    metadata.validate_for_create()?;

    let file_name = metadata.file_name()?;
    let path = workspace.level_path(&file_name);
    let message = format!("Add new level: {}", metadata.name);

    let document = LevelDocument::new(metadata);
    session.create_new(&path, &document, &message).await?;

    println!("Created level '{}' as {}", document.name, file_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{level, remote, seeded, users, PATH};
    use super::*;
    use nwl_core::codec;
    use nwl_core::{SessionError, StoreError};

    fn acheron_fields() -> MetadataArgs {
        MetadataArgs {
            id: Some("73667628".to_string()),
            name: Some("Acheron".to_string()),
            author: Some("ryamu".to_string()),
            verifier: Some("Zoink".to_string()),
            creators: Some(" ryamu, , Zoink ".to_string()),
            verification: Some("https://youtu.be/acheron".to_string()),
            percent_to_qualify: None,
        }
    }

    #[tokio::test]
    async fn test_create_writes_new_file() {
        let (store, mut session, ws) = seeded();

        create_level(&mut session, &ws, &acheron_fields(), None)
            .await
            .unwrap();

        let doc = remote(&store, "data/acheron.json");
        assert_eq!(doc.id, 73667628);
        assert_eq!(doc.creators, vec!["ryamu", "Zoink"]);
        assert_eq!(doc.percent_to_qualify, 100);
        assert!(doc.records.is_empty());
        assert_eq!(store.changes()[0].message, "Add new level: Acheron");
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let (store, mut session, ws) = seeded();
        let mut fields = acheron_fields();
        fields.author = None;

        let err = create_level(&mut session, &ws, &fields, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("author"));
        assert!(store.content("data/acheron.json").is_none());
    }

    #[tokio::test]
    async fn test_create_refuses_existing_file() {
        let (_store, mut session, ws) = seeded();
        let mut fields = acheron_fields();
        fields.name = Some("Tidal Wave".to_string());

        let err = create_level(&mut session, &ws, &fields, None)
            .await
            .unwrap_err();
        let err = err.downcast::<SessionError>().unwrap();
        assert!(matches!(
            *err,
            SessionError::Store(StoreError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_over_prefill_lets_flags_win() {
        let (store, mut session, ws) = seeded();
        let prefill = LevelMetadata {
            id: 1,
            name: "Slaughterhouse".to_string(),
            author: "icedcave".to_string(),
            verifier: "Doggie".to_string(),
            creators: vec!["icedcave".to_string()],
            verification: "https://youtu.be/sh".to_string(),
            percent_to_qualify: 100,
        };
        let fields = MetadataArgs {
            percent_to_qualify: Some("60".to_string()),
            ..Default::default()
        };

        create_level(&mut session, &ws, &fields, Some(prefill))
            .await
            .unwrap();

        let doc = remote(&store, "data/slaughterhouse.json");
        assert_eq!(doc.author, "icedcave");
        assert_eq!(doc.percent_to_qualify, 60);
    }

    #[tokio::test]
    async fn test_edit_changes_only_given_fields() {
        let (store, mut session, ws) = seeded();
        let cmd = LevelCommand {
            command: LevelSubcommand::Edit {
                file: "tidal_wave.json".to_string(),
                fields: MetadataArgs {
                    verifier: Some("Zoink ".to_string()),
                    percent_to_qualify: Some("57".to_string()),
                    ..Default::default()
                },
            },
        };

        cmd.run(&mut session, &ws).await.unwrap();

        let doc = remote(&store, PATH);
        assert_eq!(doc.name, "Tidal Wave");
        assert_eq!(doc.verifier, "Zoink");
        assert_eq!(doc.percent_to_qualify, 57);
        assert_eq!(users(&doc), vec!["A", "B", "C"]);
        assert_eq!(
            store.changes()[0].message,
            "Update metadata for tidal_wave.json"
        );
    }

    #[tokio::test]
    async fn test_edit_keeps_untouched_creators_verbatim() {
        let (store, mut session, ws) = seeded();
        let mut document = level();
        document.creators = vec![
            "Smith, John".to_string(),
            "Zoink".to_string(),
            "Zoink".to_string(),
        ];
        store.seed(PATH, codec::encode(&document).unwrap());

        let cmd = LevelCommand {
            command: LevelSubcommand::Edit {
                file: "tidal_wave.json".to_string(),
                fields: MetadataArgs {
                    verifier: Some("Someone".to_string()),
                    ..Default::default()
                },
            },
        };
        cmd.run(&mut session, &ws).await.unwrap();

        let doc = remote(&store, PATH);
        assert_eq!(doc.verifier, "Someone");
        assert_eq!(doc.creators, vec!["Smith, John", "Zoink", "Zoink"]);
    }

    #[tokio::test]
    async fn test_edit_rejects_non_integer_id() {
        let (store, mut session, ws) = seeded();
        let cmd = LevelCommand {
            command: LevelSubcommand::Edit {
                file: "tidal_wave.json".to_string(),
                fields: MetadataArgs {
                    id: Some("seven".to_string()),
                    ..Default::default()
                },
            },
        };

        let err = cmd.run(&mut session, &ws).await.unwrap_err();
        assert!(err.to_string().contains("id must be an integer"));
        assert!(store.changes().is_empty());
    }

    #[tokio::test]
    async fn test_edit_rejects_empty_name() {
        let (store, mut session, ws) = seeded();
        let cmd = LevelCommand {
            command: LevelSubcommand::Edit {
                file: "tidal_wave.json".to_string(),
                fields: MetadataArgs {
                    name: Some("  ".to_string()),
                    ..Default::default()
                },
            },
        };

        assert!(cmd.run(&mut session, &ws).await.is_err());
        assert!(store.changes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_force() {
        let (store, mut session, ws) = seeded();
        let cmd = LevelCommand {
            command: LevelSubcommand::Delete {
                file: "tidal_wave".to_string(),
                force: true,
            },
        };

        cmd.run(&mut session, &ws).await.unwrap();
        assert!(store.content(PATH).is_none());
        assert_eq!(store.changes()[0].message, "Delete level: tidal_wave.json");
    }
}
