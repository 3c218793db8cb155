//! Client for a full-text document search service spoken over SOAP/XML.
//!
//! A [`traversal::Traversal`] walks a date range in adaptive windows and
//! pages through each, handing finished pages to a [`sink::ResultSink`].

pub mod client;
pub mod config;
pub mod data_models;
pub mod db;
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod session;
pub mod sink;
pub mod transport;
pub mod traversal;

pub use client::WskClient;
pub use error::{Error, Result};
