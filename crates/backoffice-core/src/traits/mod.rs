//! Core traits for backend transport.

mod backend;

pub use backend::Backend;
