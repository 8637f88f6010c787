//! Optional hosted backend
//!
//! A thin client for a PostgREST-style table API with password sign-in.

pub mod client;
pub mod filter;

pub use client::{RemoteClient, RemoteError, RemoteResult, Session};
pub use filter::Filter;
