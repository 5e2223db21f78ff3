mod level;
mod record;

pub use level::{level_file_name, parse_creators, LevelDocument, LevelMetadata};
pub use record::Record;
