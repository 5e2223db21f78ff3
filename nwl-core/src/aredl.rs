//! Prefills level metadata from the public AREDL API.

use serde::Deserialize;
use thiserror::Error;

use crate::models::LevelMetadata;

/// Levels endpoint of the AREDL API.
pub const DEFAULT_AREDL_BASE: &str = "https://api.aredl.net/v2/api/aredl/levels";

#[derive(Debug, Error)]
pub enum AredlError {
    #[error("AREDL level id must be numeric, got '{0}'")]
    InvalidId(String),

    #[error("AREDL API returned {status} for level '{level_id}'; check that the id is correct")]
    Status { status: u16, level_id: String },

    #[error("Could not reach the AREDL API: {0}")]
    Network(String),

    #[error("Unexpected AREDL response: {0}")]
    Malformed(String),
}

#[derive(Debug, Default, Deserialize)]
struct LevelInfo {
    #[serde(default)]
    level_id: Option<i64>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    publisher: Option<Person>,
    #[serde(default)]
    verifications: Vec<Verification>,
}

#[derive(Debug, Default, Deserialize)]
struct Person {
    #[serde(default)]
    global_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Verification {
    #[serde(default)]
    submitted_by: Option<Person>,
    #[serde(default)]
    video_url: Option<String>,
}

fn global_name(person: &Option<Person>) -> String {
    person
        .as_ref()
        .and_then(|p| p.global_name.clone())
        .unwrap_or_default()
}

/// Builds metadata from the level and creators responses.
///
/// Missing fields come back empty; the caller still validates before
/// creating a level. When no creator has a name the publisher is used.
pub fn metadata_from_responses(
    level: &serde_json::Value,
    creators: &serde_json::Value,
) -> Result<LevelMetadata, AredlError> {
    let info: LevelInfo = serde_json::from_value(level.clone())
        .map_err(|e| AredlError::Malformed(format!("level: {}", e)))?;
    let creators: Vec<Person> = serde_json::from_value(creators.clone())
        .map_err(|e| AredlError::Malformed(format!("creators: {}", e)))?;

    let author = global_name(&info.publisher);
    let (verifier, verification) = match info.verifications.first() {
        Some(v) => (
            global_name(&v.submitted_by),
            v.video_url.clone().unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };

    let mut names: Vec<String> = creators
        .into_iter()
        .filter_map(|c| c.global_name)
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() && !author.is_empty() {
        names.push(author.clone());
    }

    Ok(LevelMetadata {
        id: info.level_id.unwrap_or_default(),
        name: info.name,
        author,
        verifier,
        creators: names,
        verification,
        percent_to_qualify: 100,
    })
}

/// Client for the AREDL level endpoints.
#[derive(Debug, Clone)]
pub struct AredlClient {
    http: reqwest::Client,
    base_url: String,
}

impl AredlClient {
    pub fn new() -> Self {
        Self::with_base(DEFAULT_AREDL_BASE)
    }

    /// Points the client at another levels endpoint.
    pub fn with_base(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetches a level and its creators and maps them to metadata.
    pub async fn fetch_level(&self, level_id: &str) -> Result<LevelMetadata, AredlError> {
        let level_id = level_id.trim();
        if level_id.is_empty() || !level_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(AredlError::InvalidId(level_id.to_string()));
        }

        let level = self.get_json(&format!("{}/{}", self.base_url, level_id), level_id).await?;
        let creators = self
            .get_json(&format!("{}/{}/creators", self.base_url, level_id), level_id)
            .await?;

        let metadata = metadata_from_responses(&level, &creators)?;
        tracing::info!(level_id, name = %metadata.name, "imported level from AREDL");
        Ok(metadata)
    }

    async fn get_json(&self, url: &str, level_id: &str) -> Result<serde_json::Value, AredlError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AredlError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(url, %status, "aredl request");
        if !status.is_success() {
            return Err(AredlError::Status {
                status: status.as_u16(),
                level_id: level_id.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AredlError::Malformed(e.to_string()))
    }
}

impl Default for AredlClient {
    fn default() -> Self {
        Self::new()
    }
}
