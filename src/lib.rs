// Tenor: sentiment analysis for text, voice, CSV files, and YouTube comments.
//
// This is the library root. Each module corresponds to a major subsystem;
// the binary in main.rs and the optional web server are thin layers over
// `analysis::Analyzer`.

pub mod aggregate;
pub mod analysis;
pub mod auth;
pub mod config;
pub mod db;
pub mod emotion;
pub mod models;
pub mod output;
pub mod sentiment;
pub mod speech;
pub mod youtube;

#[cfg(feature = "web")]
pub mod web;
