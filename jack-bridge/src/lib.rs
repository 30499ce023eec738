//! # jack-bridge
//!
//! A small, safe bridge from Rust to the JACK audio server's process
//! callback.
//!
//! ## Quick Start
//!
//! ```no_run
//! use jack_bridge::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! // Open a client with two inputs and two outputs
//! let client = JackClient::new("passthru", 2, 2)?;
//!
//! // Copy each input to the matching output, once per block
//! let active = client.activate(|scope: &mut ProcessScope<'_>| {
//!     for i in 0..scope.output_count() {
//!         let input = scope.input(i);
//!         if let (Some(input), Some(output)) = (input, scope.output(i)) {
//!             output.copy_from_slice(input);
//!         }
//!     }
//!     ProcessStatus::Continue
//! })?;
//!
//! // Deactivate and close
//! active.deactivate()?;
//! # Ok(())
//! # }
//! ```
//!
//! The lower layer in [`bridge`] mirrors the raw contract: open a client,
//! register a trampoline with an opaque context, and let the server call it.

#![warn(missing_docs)]

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod ffi;
pub mod library;

pub use bridge::{
    close_client, open_client, open_client_with_options, process_trampoline, register_callback,
    ClientHandle, ContextToken, RawProcessHandler,
};
pub use client::{
    ActiveClient, JackClient, JackClientBuilder, PortHandle, ProcessHandler, ProcessScope,
    ProcessStatus,
};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use ffi::{Frames, JackApi, JackOptions, JackStatus};
pub use library::LibJack;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        client::{ActiveClient, JackClient, ProcessHandler, ProcessScope, ProcessStatus},
        config::ClientConfig,
        error::{Error, Result},
    };
}
