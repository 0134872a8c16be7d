//! Line-oriented basic authentication helper.
//!
//! Proxies such as Squid run an external program per worker and write one
//! `username password` line per login attempt to its stdin, each field
//! URL-escaped. The helper answers `OK` or `ERR` on stdout, one line per
//! request, in order.
//!
//! The htpasswd file (and group file, when a group is required) is loaded at
//! startup and reloaded on SIGHUP. A failed reload keeps the previous
//! credentials. The helper exits when stdin closes or on SIGTERM/Ctrl+C.

mod authenticator;
pub mod cli;
mod error;
mod serve;

pub use authenticator::{Authenticator, Reply};
pub use cli::HelperArgs;
pub use error::HelperError;
pub use serve::serve;
pub use tokio_util::sync::CancellationToken;
