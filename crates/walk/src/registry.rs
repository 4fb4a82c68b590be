//! Scheme name to walker constructor map.
//!
//! Built once at startup and passed to whatever needs to turn an emitter
//! identifier into a [`Walker`]:
//!
//! ```
//! use canopy_walk::Registry;
//!
//! let registry = Registry::default();
//! assert!(registry.schemes().contains(&"directory"));
//! ```

use crate::error::{ErrorKind, Result};
use crate::walker::Walker;
use canopy_config::{Identifier, Loader};
use canopy_source::backend::LocalSource;
use exn::ResultExt;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Builds a walker from a parsed identifier, resolving options with the
/// registry's [`Loader`].
pub type Constructor = Box<dyn Fn(&Identifier, &Loader) -> Result<Walker> + Send + Sync>;

pub struct Registry {
    constructors: BTreeMap<String, Constructor>,
    loader: Loader,
}
impl Default for Registry {
    /// Every built-in scheme, with options loaded from the host.
    fn default() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "github")]
        registry.register("githubapi", github);
        registry.register("directory", directory);
        registry
    }
}
impl Registry {
    /// No schemes registered.
    pub fn empty() -> Self {
        Self { constructors: BTreeMap::new(), loader: Loader::default() }
    }

    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    /// Register (or replace) the constructor for `scheme`.
    pub fn register<F>(&mut self, scheme: impl Into<String>, constructor: F)
    where
        F: Fn(&Identifier, &Loader) -> Result<Walker> + Send + Sync + 'static,
    {
        self.constructors.insert(scheme.into(), Box::new(constructor));
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn build(&self, uri: &str) -> Result<Walker> {
        let identifier = Identifier::parse(uri).or_raise(|| ErrorKind::Config)?;
        let Some(constructor) = self.constructors.get(identifier.scheme()) else {
            exn::bail!(ErrorKind::UnknownScheme(identifier.scheme().to_string()));
        };
        let walker = constructor(&identifier, &self.loader)?;
        tracing::debug!(%identifier, walker = ?walker, "Built walker");
        Ok(walker)
    }
}
impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("schemes", &self.schemes()).field("loader", &self.loader).finish()
    }
}

/// `githubapi://{owner}/{repo}?access_token=...`
#[cfg(feature = "github")]
fn github(identifier: &Identifier, loader: &Loader) -> Result<Walker> {
    use canopy_source::backend::GitHubSource;

    let (owner, repo) = identifier.repository().or_raise(|| ErrorKind::Config)?;
    let options = loader.load(identifier).or_raise(|| ErrorKind::Config)?;
    let token = options.require_token().or_raise(|| ErrorKind::Config)?;
    let source = GitHubSource::new(owner, repo, options.branch.clone(), token).or_raise(|| ErrorKind::Config)?;
    Walker::from_options(Arc::new(source), &options)
}

/// `directory:///{absolute/root}`
fn directory(identifier: &Identifier, loader: &Loader) -> Result<Walker> {
    let options = loader.load(identifier).or_raise(|| ErrorKind::Config)?;
    let root = PathBuf::from(format!("/{}", identifier.path()));
    let source = LocalSource::new("directory", root).or_raise(|| ErrorKind::Config)?;
    Walker::from_options(Arc::new(source), &options)
}
