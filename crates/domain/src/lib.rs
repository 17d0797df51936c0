//! `pc-domain`: types shared by the conduit crates: the error enum,
//! configuration, and structured trace events.

pub mod config;
pub mod error;
pub mod trace;
