// Crate root library declaration and module exports.
pub mod cli;
pub mod config;
pub mod context;
pub mod model;
pub mod quick_entry;
pub mod store;
pub mod timeline;
pub mod vault;
