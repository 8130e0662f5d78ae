//! Periodic collector for the TFT ranked ladder with a small JSON front end.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod riot;
pub mod web;
