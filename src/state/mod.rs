//! Persistent recording state: metadata store, in-memory list and reconciliation

mod database;
mod library;
mod pending_deletes;
mod recording_list;

pub use database::JsonMetadataStore;
pub use library::Library;

#[cfg(test)]
pub(crate) use library::tests::RejectingStore;
