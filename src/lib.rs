//! Screen-recapture dataset collection.
//!
//! A controller shows reference images full-screen while a capture device
//! photographs the screen. Each photo is saved under a filename that encodes
//! the row it came from, so a flat export directory can later be turned back
//! into an ordered, validated dataset.
//!
//! - `codec` - filename identity encoding
//! - `config` - validated run configuration
//! - `dataset` - manifest loading and row selection
//! - `display` - display and filter collaborator interfaces
//! - `sync` - the capture session state machine and wire protocol
//! - `reconstruct` - offline dataset rebuild from an export directory

pub mod codec;
pub mod config;
pub mod dataset;
pub mod display;
pub mod error;
pub mod reconstruct;
pub mod sync;

pub use error::{Error, Result};
