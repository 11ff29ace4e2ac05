//! Traversal and decoding configuration.

/// Default container nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration shared by the walker and the decoding visitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum nesting of `multipart/*` containers.
    pub max_depth: usize,
    /// Charset assumed for text parts without a `charset` parameter.
    ///
    /// `None` treats such parts as UTF-8.
    pub default_charset: Option<String>,
    /// Charset tried when the declared charset cannot be resolved.
    ///
    /// `None` keeps the original bytes.
    pub fallback_charset: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_charset: None,
            fallback_charset: None,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    max_depth: Option<usize>,
    default_charset: Option<String>,
    fallback_charset: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the container nesting limit.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the charset assumed when a text part declares none.
    #[must_use]
    pub fn default_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_charset = Some(charset.into());
        self
    }

    /// Sets the charset tried when the declared one is unsupported.
    #[must_use]
    pub fn fallback_charset(mut self, charset: impl Into<String>) -> Self {
        self.fallback_charset = Some(charset.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            default_charset: self.default_charset,
            fallback_charset: self.fallback_charset,
        }
    }
}
