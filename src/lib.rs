//! Demux/decode timing diagnostics
//!
//! Reads a media container, feeds every audio and video stream to its
//! decoder and reports, per stream, each timestamp together with the
//! delta to the previous one.

pub mod cli;
pub mod config;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod utils;

pub use error::{Error, Result};
