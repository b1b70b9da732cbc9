#![forbid(unsafe_code)]

//! HTTP boundary between the floorplan editor and the optimizer service.
//!
//! [`SyncClient`] performs the requests an [`floorplan_core::Editor`] asks
//! for and turns each response into the message the editor expects back.
//! Response envelopes vary between optimizer deployments, so every body
//! passes through [`normalize`] before it reaches the editor.

pub mod client;
pub mod error;
pub mod normalize;

pub use client::SyncClient;
pub use error::{Result, SyncError};
