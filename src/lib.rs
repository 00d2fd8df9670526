//! Personal Blog - access core
//!
//! Session acquisition, role resolution and route gating for a personal
//! blog whose auth and tables live on a hosted backend. The same pipeline
//! backs the HTTP surface, which runs it once per request.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
