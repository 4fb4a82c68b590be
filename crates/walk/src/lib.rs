//! Recursive tree walker.
//!
//! A [`Walker`] fetches a path from its source. Files go through the
//! extension gate and the filter pipeline and, if accepted, to the caller's
//! [`Callback`] with the stream at offset zero. Directories are walked either
//! sequentially (listing order) or concurrently (one worker per child, first
//! error wins, every worker joined before returning).
//!
//! Walkers are normally built from an emitter identifier by a [`Registry`]:
//!
//! ```no_run
//! use canopy_walk::{Context, Registry, callback};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::default();
//! let walker = registry.build("githubapi://whosonfirst-data/whosonfirst-data-admin-us?access_token=ghp_...&concurrent=true")?;
//! walker
//!     .walk_uri(&Context::new(), callback(|_ctx, path, _stream| async move {
//!         println!("{path}");
//!         Ok(())
//!     }), "data")
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod callback;
mod context;
pub mod error;
mod fanout;
pub mod registry;
mod stats;
pub mod stream;
mod walker;

pub use crate::callback::{Callback, CallbackError, CallbackResult, callback};
pub use crate::context::Context;
pub use crate::registry::Registry;
pub use crate::stats::Stats;
pub use crate::stream::{WalkEvent, walk};
pub use crate::walker::{Strategy, Walker, WalkerBuilder};
pub use canopy_config::InFlight;
