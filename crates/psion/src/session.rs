//! Per-conversion state: configuration, collected warnings and target ids.

use crate::config::Config;
use crate::reloc_buffer::{IdSequence, TargetId};

/// A condition that was downgraded instead of failing the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub offset: u64,
    pub message: String,
}

/// State shared by every codec call of one file conversion.
///
/// Sessions never share state, so independent conversions can run side by
/// side without racing on id allocation.
#[derive(Debug, Default)]
pub struct Session {
    config: Config,
    ids: IdSequence,
    warnings: Vec<Warning>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            config,
            ids: IdSequence::default(),
            warnings: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn next_id(&mut self) -> TargetId {
        self.ids.next_id()
    }

    pub fn warn(&mut self, offset: u64, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(offset, "{message}");
        self.warnings.push(Warning { offset, message });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }
}
