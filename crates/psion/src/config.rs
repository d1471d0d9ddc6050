//! Decoder configuration.

/// What to do with a layout tag the decoder does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTagPolicy {
    /// Warn and assume the tag carries no payload, skipping only the tag byte.
    #[default]
    SkipByte,
    /// Fail the whole list with a parse error.
    Reject,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub unknown_layout_tags: UnknownTagPolicy,
    /// Deepest nesting of variable-arity functions a formula may use.
    pub max_formula_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            unknown_layout_tags: UnknownTagPolicy::SkipByte,
            max_formula_depth: 64,
        }
    }
}

impl Config {
    pub fn with_unknown_layout_tags(mut self, policy: UnknownTagPolicy) -> Self {
        self.unknown_layout_tags = policy;
        self
    }

    pub fn with_max_formula_depth(mut self, depth: usize) -> Self {
        self.max_formula_depth = depth;
        self
    }
}
