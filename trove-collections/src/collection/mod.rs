//! Collection commands

pub(crate) mod archive;
mod create;
mod get;
mod list;
mod mv;
mod root;
mod update;

pub use archive::{ArchiveCollection, ArchiveOutcome};
pub use create::CreateCollection;
pub use get::{CollectionView, GetCollection};
pub use list::ListCollections;
pub use mv::MoveCollection;
pub use root::GetRootCollection;
pub use update::UpdateCollection;
