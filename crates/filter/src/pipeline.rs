use crate::ReadSeek;
use crate::error::Result;
use crate::filters::{Filter, Filters, rewind};

/// Extension used when none is configured.
pub const DEFAULT_EXTENSION: &str = ".geojson";

/// Extension gate followed by predicate filters.
#[derive(Debug)]
pub struct Pipeline {
    extensions: Vec<String>,
    filters: Filters,
}
impl Default for Pipeline {
    fn default() -> Self {
        Self { extensions: vec![DEFAULT_EXTENSION.to_string()], filters: Filters::new() }
    }
}
impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted extensions. A leading dot is added when missing;
    /// an empty list restores the default.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().to_string())
            .filter(|ext| !ext.is_empty())
            .map(|ext| if ext.starts_with('.') { ext } else { format!(".{ext}") })
            .collect();
        if self.extensions.is_empty() {
            self.extensions.push(DEFAULT_EXTENSION.to_string());
        }
        self
    }

    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Whether a file with this name may be emitted at all.
    pub fn is_eligible(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Full decision for one leaf. The stream is at offset zero on return.
    pub fn accepts(&self, name: &str, stream: &mut dyn ReadSeek) -> Result<bool> {
        if !self.is_eligible(name) {
            tracing::trace!(name, "Extension not eligible");
            return Ok(false);
        }
        if self.filters.is_empty() {
            rewind(stream)?;
            return Ok(true);
        }
        self.filters.apply(stream)
    }
}
