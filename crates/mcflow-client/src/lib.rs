//! Typed client for the Materials Commons JSON API.
//!
//! - [`McApi`] — The operation surface consumed by workflow materialization.
//! - [`McClient`] — The reqwest-backed implementation.
//! - [`RecordingClient`] — An in-memory fake that records the call sequence,
//!   for tests that assert call ordering and counts.

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod recording;

pub use api::{McApi, SampleConnection, SampleMeasurements};
pub use client::McClient;
pub use error::McError;
pub use models::{
    Experiment, File, FileAndDirection, Measurement, Process, Project, Property, Sample,
    SampleProperty, Setup, SetupProperty, Timestamp,
};
pub use recording::{RecordedCall, RecordingClient};
