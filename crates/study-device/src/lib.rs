pub mod client;
mod http;

pub use client::HttpDevice;
