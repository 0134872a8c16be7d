//! # htpasswd-rs
//!
//! Authenticate users against Apache-style htpasswd files.
//!
//! ## Crates
//!
//! - [`htpasswd_auth`] - Password recognition, verification and reloadable tables
//! - [`htpasswd_config`] - Configuration loading and validation
//! - [`htpasswd_helper`] - Stdin authentication helper

pub use htpasswd_auth as auth;
pub use htpasswd_config as config;
pub use htpasswd_helper as helper;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use htpasswd_auth::{
        BadLinePolicy, EncodedPassword, HtGroup, Htpasswd, Options, ParseError, ParserChain,
        System,
    };
    pub use htpasswd_config::{Config, load_config, validate_config};
    pub use htpasswd_helper::{Authenticator, CancellationToken, serve};
}
