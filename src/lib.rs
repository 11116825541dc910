//! Illustration variation generator: a key-holding proxy in front of the
//! Gemini content API, a client for it, and the fan-out that turns one base
//! image and many prompts into many variations.

#![allow(clippy::multiple_crate_versions)]
#![deny(clippy::all)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::disallowed_methods)]
#![deny(clippy::expect_used)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::panic)]
#![deny(clippy::perf)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::unreachable)]
#![deny(clippy::unwrap_used)]
#![deny(warnings)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod asset;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod state;
pub mod web;
