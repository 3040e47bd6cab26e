pub mod common;
pub mod completions;
pub mod config;
pub mod expiry;
pub mod qr;
pub mod send;
