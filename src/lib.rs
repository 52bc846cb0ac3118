// src/lib.rs — Library root for hotloop

pub mod cache;
pub mod cli;
pub mod explore;
pub mod infra;
pub mod script;
