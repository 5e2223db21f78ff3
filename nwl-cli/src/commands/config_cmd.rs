use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{mask_token, Config};

use super::OutputFormat;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# nwl configuration

# GitHub repository holding the list
repo_url: https://github.com/Abuigsito/nowavelist

# Folder with the level files inside the repository
folder: data

# GitHub REST API base URL
# api_base: https://api.github.com

# Personal access token with contents write access.
# Reading works without one. NWL_TOKEN overrides this value.
# token: ghp_...
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                config_path
                                    .unwrap_or_else(Config::default_config_path)
                                    .display()
                            );
                        }
                        println!();

                        println!("repo_url: {}", config.repo_url.value);
                        println!("  source: {}", config.repo_url.source);
                        println!();

                        println!("folder: {}", config.folder.value);
                        println!("  source: {}", config.folder.source);
                        println!();

                        println!("api_base: {}", config.api_base.value);
                        println!("  source: {}", config.api_base.source);
                        println!();

                        match &config.token {
                            Some(token) => {
                                println!("token: {}", mask_token(&token.value));
                                println!("  source: {}", token.source);
                            }
                            None => println!("token: (not set, read-only)"),
                        }
                    }
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = config_path.unwrap_or_else(Config::default_config_path);
                write_default_config(&config_path)
            }
        }
    }
}

fn write_default_config(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() {
        println!("Config file already exists: {}", config_path.display());
        println!("Use 'nwl config show' to view current configuration.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(config_path)?;
    file.write_all(DEFAULT_CONFIG.as_bytes())?;

    println!("Created config file: {}", config_path.display());
    println!("\nEdit this file to customize your settings.");
    Ok(())
}
