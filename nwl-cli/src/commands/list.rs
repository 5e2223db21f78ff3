use clap::Args;

use nwl_core::{RemoteStore, Session};

use super::Workspace;

/// List level files in the configured folder
#[derive(Args)]
pub struct ListCommand {
    /// Only show files whose name contains this text (case-insensitive)
    #[arg(long, short)]
    pub search: Option<String>,
}

impl ListCommand {
    pub async fn run<S: RemoteStore>(
        &self,
        session: &mut Session<S>,
        workspace: &Workspace,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let names = session.list(&workspace.folder).await?;
        let levels = level_files(names, self.search.as_deref());

        if levels.is_empty() {
            println!("No levels found.");
            return Ok(());
        }

        for name in &levels {
            println!("{}", name);
        }
        println!("\n{} level(s)", levels.len());
        Ok(())
    }
}

/// Keeps `.json` names matching `search`, sorted.
fn level_files(names: Vec<String>, search: Option<&str>) -> Vec<String> {
    let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    let mut levels: Vec<String> = names
        .into_iter()
        .filter(|n| n.ends_with(".json"))
        .filter(|n| n.to_lowercase().contains(&needle))
        .collect();
    levels.sort();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        ["Tidal_Wave.json", "acheron.json", "README.md", "silent_clubstep.json"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_only_json_files() {
        assert_eq!(
            level_files(names(), None),
            vec!["Tidal_Wave.json", "acheron.json", "silent_clubstep.json"]
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        assert_eq!(level_files(names(), Some("tidal")), vec!["Tidal_Wave.json"]);
        assert_eq!(level_files(names(), Some("CLUB")), vec!["silent_clubstep.json"]);
        assert!(level_files(names(), Some("bloodbath")).is_empty());
    }
}
