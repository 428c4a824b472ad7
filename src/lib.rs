// src/lib.rs — Library root for tourney

pub mod auth;
pub mod cache;
pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod util;
