pub mod auth;
pub mod clean_text;
pub mod config;
pub mod jwt;
pub mod secret;
