//! services/api/src/lib.rs
//!
//! The LPMS HTTP service: adapters for the core ports, authentication, and
//! the axum web layer.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod pdf;
pub mod web;
