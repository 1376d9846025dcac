//! # rastro-server
//!
//! HTTP server library for the rastro lost-pet beacon scanning node.
//!
//! This library provides the API handlers and state management for rastro.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
