//! `assetpipe`: extracts arcade game asset containers into web-friendly media.
//!
//! This crate provides:
//! - Readers for CRI `@UTF` tables, AFS2 banks and ACB cue sheets
//! - Cue name resolution for the streams in a bank
//! - Per-title job enumeration and a fail-fast parallel scheduler
//! - Thin wrappers around `vgmstream` and `ffmpeg`
//! - Static metadata export as JSON
//!
//! The library is used by the `asset-extract` and `meta-export` binaries, and is designed so
//! each stage can be driven and tested on its own.

// High-level API (most consumers should start here).
pub mod extractor;
pub mod opts;

// Configuration.
pub mod category;
pub mod config;

// Container formats and name resolution.
pub mod acb;
pub mod afs2;
pub mod resolver;
pub mod utf_table;

// Job production and execution.
pub mod discover;
pub mod job;
pub mod scheduler;
pub mod titles;

// External tools and the files they share.
pub mod scratch;
pub mod tools;
pub mod wav;

// Static metadata export.
pub mod metadata;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use error::{Error, Result};
