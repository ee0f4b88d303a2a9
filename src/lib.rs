pub mod account;
pub mod chain;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod witness;
