//! HTTP client wrapper shared by the remote system clients.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
