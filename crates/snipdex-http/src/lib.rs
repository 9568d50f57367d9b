//! HTTP transport for snipdex
//!
//! A small layer over `reqwest` that the search backend talks through:
//!
//! - [`HttpClientTrait`] is the seam tests replace, either by pointing the real
//!   client at a `wiremock` server or by swapping in their own implementation.
//! - [`Payload`] carries a body with its content type (JSON or NDJSON).
//! - [`HttpError::is_connect`] tells callers whether a request never reached a
//!   server and may be sent to another host.

pub mod client;
pub mod config;
pub mod error;

pub use client::{shared_client, HttpClient, HttpClientTrait, Payload};
pub use config::HttpConfig;
pub use error::{HttpError, Result};

pub use reqwest::{Method, Response, StatusCode};
