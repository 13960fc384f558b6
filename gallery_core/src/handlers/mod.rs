//! HTTP handlers translating requests into storage operations

pub mod files;
pub mod health;
pub mod routes;
