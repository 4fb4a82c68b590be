//! Emitter configuration.
//!
//! An emitter is described by a single identifier,
//! `scheme://owner/repository?option=value&...`. The scheme selects the
//! source, the host and path locate the tree, and the query carries options.
//! Options not given in the query fall back to `CANOPY_*` environment
//! variables, then `{config_dir}/canopy/config.toml`, then built-in defaults.
//!
//! ```
//! use canopy_config::{Identifier, Loader};
//!
//! let id = Identifier::parse("githubapi://whosonfirst-data/whosonfirst-data-admin-us?access_token=abc&concurrent=true").unwrap();
//! let options = Loader::isolated().load(&id).unwrap();
//! assert!(options.concurrent);
//! assert_eq!(id.repository().unwrap(), ("whosonfirst-data", "whosonfirst-data-admin-us"));
//! ```

pub mod error;
mod flag;
mod identifier;
mod loader;
mod options;

pub use crate::flag::parse_bool;
pub use crate::identifier::Identifier;
pub use crate::loader::{ENV_PREFIX, Loader, default_config_file};
pub use crate::options::{DEFAULT_RATE_MS, InFlight, Options};
