//! # rustpapers
//!
//! Browse, render and survey a corpus of structured scientific-paper JSON records.
//!
//! ## Modules
//!
//! - [`store`] - Record store over a directory of JSON files, subject index
//! - [`record`] - Paper records and tolerant field access
//! - [`render`] - Tolerant renderer: record to display blocks, Markdown output
//! - [`navigation`] - Subject/paper cascade, filename search, selection state
//! - [`survey`] - Survey generation through an OpenAI-compatible API
//! - [`server`] - HTTP interface
//! - [`config`] - TOML configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustpapers::{render, store::RecordStore};
//!
//! fn main() -> rustpapers::Result<()> {
//!     let store = RecordStore::open("Papers")?;
//!     for id in store.list_records()? {
//!         let blocks = render::render(&store.load(&id)?);
//!         println!("{}", render::to_markdown(&blocks));
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod navigation;
pub mod prompts;
pub mod record;
pub mod render;
pub mod server;
pub mod store;
pub mod survey;

pub use error::{PapersError, Result};
pub use record::PaperRecord;
