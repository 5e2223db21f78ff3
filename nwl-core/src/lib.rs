//! NWL Manager Core Library
//!
//! Level documents of a list repository: reading and writing them through a
//! remote store with compare-and-swap saves, editing their records, and
//! reordering records against an external order list.

pub mod aredl;
pub mod codec;
pub mod merge;
pub mod models;
pub mod repository;
pub mod session;
pub mod store;

pub use aredl::{AredlClient, AredlError};
pub use codec::CodecError;
pub use merge::{reorder, ReorderReport, Reordered};
pub use models::{level_file_name, parse_creators, LevelDocument, LevelMetadata, Record};
pub use repository::{LevelRepository, RepositoryError};
pub use session::{Session, SessionError, SessionState};
pub use store::{
    join_path, Blob, GitHubStore, MemoryStore, RemoteBlobHandle, RemoteStore, RepoLocation,
    StoreError,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
