use crate::error::{ErrorKind, Result};
use crate::identifier::Identifier;
use crate::options::Options;
use directories::BaseDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::PathBuf;

/// Prefix for environment variable overrides (`CANOPY_RATE=250`).
pub const ENV_PREFIX: &str = "CANOPY_";

/// `{config_dir}/canopy/config.toml`, if the platform has a config directory.
pub fn default_config_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("canopy").join("config.toml"))
}

/// Resolves [`Options`] from, lowest precedence first: built-in defaults, a
/// TOML config file, `CANOPY_*` environment variables and the identifier's
/// query string.
#[derive(Debug, Clone)]
pub struct Loader {
    file: Option<PathBuf>,
    env: bool,
}
impl Default for Loader {
    fn default() -> Self {
        Self { file: default_config_file(), env: true }
    }
}
impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only defaults and the identifier. Nothing is read from the host.
    pub fn isolated() -> Self {
        Self { file: None, env: false }
    }

    /// Use this file instead of the default location. A missing file is not
    /// an error.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn with_env(mut self, enabled: bool) -> Self {
        self.env = enabled;
        self
    }

    fn figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Options::default()));
        if let Some(file) = &self.file {
            figment = figment.merge(Toml::file(file));
        }
        if self.env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX));
        }
        figment
    }

    /// Options before the identifier is applied.
    pub fn base(&self) -> Result<Options> {
        self.figment().extract().or_raise(|| ErrorKind::Load)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(identifier = %identifier))]
    pub fn load(&self, identifier: &Identifier) -> Result<Options> {
        let mut options = self.base()?;
        options.apply_query(identifier.query())?;
        tracing::debug!(
            concurrent = options.concurrent,
            rate_ms = options.rate,
            in_flight = %options.in_flight,
            "Resolved walker options"
        );
        Ok(options)
    }
}
