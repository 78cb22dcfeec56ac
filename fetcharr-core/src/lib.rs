//! Core library for fetcharr: content-addressed cache, perceptual-hash
//! dedup, rate-limited provider HTTP, the provider registry/orchestrator,
//! the field-lock arbiter, path translation, the scoring engine, the scan
//! pipeline, the publish engine, the player notifier, and the priority job
//! queue that drives all of it.

pub mod cache;
pub mod db;
pub mod error;
pub mod events;
pub mod http;
pub mod locks;
pub mod nfo;
pub mod notify;
pub mod pathmap;
pub mod phash;
pub mod probe;
pub mod providers;
pub mod publish;
pub mod queue;
pub mod scan;
pub mod scheduler;
pub mod scoring;
pub mod settings;
pub mod templates;
pub mod verify;
pub mod webhook;

pub use error::{CoreError, Result};
