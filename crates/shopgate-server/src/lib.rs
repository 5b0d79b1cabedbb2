//! Shopgate server: an API gateway exposing the OAuth endpoints from
//! `shopgate-auth` and proxying authorized calls to the Shopify Admin API.

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod observability;
pub mod scheduler;
pub mod server;

pub use config::{AppConfig, load_config};
pub use server::{AppState, build_app};
