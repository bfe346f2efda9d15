//! `murmur` — an asynchronous, cancellable, streaming transcription job engine.
//!
//! This crate manages transcription jobs keyed by a message identifier:
//! - fetch the audio, decode it, feed it incrementally to a recognizer
//! - publish incremental and final results to subscribed observers
//! - guarantee at-most-one active job per key (single-flight)
//! - support safe, race-free cancellation at every suspension point
//!
//! The acoustic engine, platform audio retrieval, and user-facing status
//! display are external collaborators behind the traits in [`engine`];
//! defaults are provided for fetch (HTTP) and decode (Symphonia). Most
//! consumers should start with [`Transcriber`].

// High-level API (most consumers should start here).
pub mod transcriber;

// Shared registries: results, observers, in-flight jobs.
pub mod cache;
pub mod listeners;
pub mod registry;

// Model acquisition and the job state machine.
mod job;
pub mod model;

// Collaborator interfaces and their default implementations.
pub mod decode;
pub mod engine;
pub mod fetch;

// Core data types.
pub mod error;
pub mod key;
pub mod opts;
pub mod transcript;

// Logging configuration and control.
pub mod logging;

pub use error::{Error, Result};
pub use key::MessageId;
pub use listeners::Subscription;
pub use opts::{ModelSelection, Opts, SMALL_MODEL_URL};
pub use transcriber::{Transcriber, TranscriberBuilder};

pub use logging::init as init_logging;
