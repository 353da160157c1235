//! Shared building blocks for the DSP control workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): Location-tracked error plumbing shared by every crate
//! - **dsp-client**: Protocol client for the DSP appliance (transport, parser, correlator)
//! - **dsp-monitor**: Command-line monitor wiring the client to config and logging

pub mod error;

pub use error::error_location::ErrorLocation;
