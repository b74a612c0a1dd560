pub mod client;

pub use client::RconClient;
