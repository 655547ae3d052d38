use std::fmt::Display;

/// Parser configuration.
///
/// In strict mode every container invariant violation is an error. In lenient
/// mode (the default) violations are logged, counted and parsing continues with
/// the value as observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlvParserConfig {
    /// Fail on non-conformant files instead of warning.
    pub strict: bool,
}

impl FlvParserConfig {
    pub const fn strict() -> Self {
        Self { strict: true }
    }

    pub const fn lenient() -> Self {
        Self { strict: false }
    }

    pub fn builder() -> FlvParserConfigBuilder {
        FlvParserConfigBuilder::default()
    }
}

impl Display for FlvParserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.strict { "strict" } else { "lenient" };
        write!(f, "FlvParserConfig {{ mode: {} }}", mode)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlvParserConfigBuilder {
    config: FlvParserConfig,
}

impl FlvParserConfigBuilder {
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    pub fn build(self) -> FlvParserConfig {
        self.config
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lenient() {
        assert_eq!(FlvParserConfig::default(), FlvParserConfig::lenient());
        assert!(!FlvParserConfig::builder().build().strict);
    }

    #[test]
    fn test_builder() {
        let config = FlvParserConfig::builder().strict(true).build();
        assert_eq!(config, FlvParserConfig::strict());
        assert_eq!(config.to_string(), "FlvParserConfig { mode: strict }");
    }
}
