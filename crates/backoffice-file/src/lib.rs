//! backoffice-file - File-backed credential store.
//!
//! Keeps the admin session on disk so a restarted client comes back logged
//! in. See [`FileStore`].

mod store;

pub use store::FileStore;
