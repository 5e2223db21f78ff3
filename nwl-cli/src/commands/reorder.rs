use clap::Args;
use std::path::PathBuf;

use nwl_core::codec;
use nwl_core::{RemoteStore, ReorderReport, Session};

use super::Workspace;

/// Reorder a level's records to follow an order list
///
/// The order list is a JSON array of player names. Records it does not
/// mention keep their data and are appended in name order.
#[derive(Args)]
pub struct ReorderCommand {
    /// Level file (e.g. tidal_wave.json)
    pub file: String,

    /// Order list file in the level folder
    #[arg(long, short, value_name = "ORDER_FILE", required_unless_present = "order_path")]
    pub order: Option<String>,

    /// Read the order list from a local file instead
    #[arg(long, value_name = "PATH", conflicts_with = "order")]
    pub order_path: Option<PathBuf>,

    /// Show the resulting order without saving
    #[arg(long)]
    pub dry_run: bool,
}

impl ReorderCommand {
    pub async fn run<S: RemoteStore>(
        &self,
        session: &mut Session<S>,
        workspace: &Workspace,
    ) -> Result<(), Box<dyn std::error::Error>> {
        session.load(&workspace.level_path(&self.file)).await?;

        let report = match (&self.order, &self.order_path) {
            (_, Some(local)) => {
                let bytes = std::fs::read(local)
                    .map_err(|e| format!("Failed to read '{}': {}", local.display(), e))?;
                let order = codec::decode_order_list(&bytes)?;
                session.reorder(&order)?
            }
            (Some(remote), None) => {
                session
                    .reorder_from(&workspace.level_path(remote))
                    .await?
            }
            (None, None) => return Err("An order list is required".into()),
        };

        print_report(&report);

        let repository = session.repository().ok_or("No document is loaded")?;
        if self.dry_run {
            println!("\nNew order (not saved):");
            for (i, record) in repository.records().iter().enumerate() {
                println!("  {:>3}. {}", i + 1, record);
            }
            return Ok(());
        }

        let message = format!("Reorder records in {}", repository.handle().file_name());
        session.save(&message).await?;
        println!("Saved new order.");
        Ok(())
    }
}

fn print_report(report: &ReorderReport) {
    println!(
        "Placed {} record(s) from the order list, {} appended.",
        report.placed,
        report.tail.len()
    );
    if !report.tail.is_empty() {
        println!("  Appended: {}", report.tail.join(", "));
    }
    if !report.has_warnings() {
        return;
    }
    println!("Warnings:");
    if !report.unknown.is_empty() {
        println!("  Not in level: {}", report.unknown.join(", "));
    }
    if !report.repeated.is_empty() {
        println!("  Listed more than once: {}", report.repeated.join(", "));
    }
    if !report.duplicate_records.is_empty() {
        println!(
            "  Duplicate records for: {}",
            report.duplicate_records.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{remote, seeded, users, PATH};
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn command(order: Option<&str>, order_path: Option<PathBuf>, dry_run: bool) -> ReorderCommand {
        ReorderCommand {
            file: "tidal_wave.json".to_string(),
            order: order.map(String::from),
            order_path,
            dry_run,
        }
    }

    #[tokio::test]
    async fn test_reorder_from_remote_list() {
        let (store, mut session, ws) = seeded();
        store.seed("data/_order.json", r#"["C", "A"]"#);

        command(Some("_order.json"), None, false)
            .run(&mut session, &ws)
            .await
            .unwrap();

        assert_eq!(users(&remote(&store, PATH)), vec!["C", "A", "B"]);
        assert_eq!(
            store.changes()[0].message,
            "Reorder records in tidal_wave.json"
        );
    }

    #[tokio::test]
    async fn test_reorder_from_local_file() {
        let (store, mut session, ws) = seeded();
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"["B", "Nobody", "B"]"#).unwrap();

        command(None, Some(file.path().to_path_buf()), false)
            .run(&mut session, &ws)
            .await
            .unwrap();

        assert_eq!(users(&remote(&store, PATH)), vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_save() {
        let (store, mut session, ws) = seeded();
        store.seed("data/_order.json", r#"["C", "B", "A"]"#);

        command(Some("_order"), None, true)
            .run(&mut session, &ws)
            .await
            .unwrap();

        assert_eq!(users(&remote(&store, PATH)), vec!["A", "B", "C"]);
        assert!(store.changes().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_order_list() {
        let (store, mut session, ws) = seeded();
        store.seed("data/_order.json", r#"{"order": []}"#);

        let err = command(Some("_order.json"), None, false)
            .run(&mut session, &ws)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Malformed document"));
        assert!(store.changes().is_empty());
    }
}
