// src/lib.rs
// Library interface for ct-viewer
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod identity;
pub mod issuer;
pub mod labeler;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod source;
pub mod time;
pub mod types;
