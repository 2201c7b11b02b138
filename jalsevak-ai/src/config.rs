//! Runtime wiring from bootstrap configuration

use crate::translation::{BatchSize, CoordinatorConfig, DispatchMode};
use jalsevak_common::config::{DispatchSetting, TranslationConfig};
use jalsevak_common::{Error, Result};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Convert the `[translation]` section into coordinator settings
pub fn coordinator_config(config: &TranslationConfig) -> Result<CoordinatorConfig> {
    let batch_size = BatchSize::new(config.batch_size).ok_or_else(|| {
        Error::Config("translation.batch_size must be at least 1".to_string())
    })?;

    let dispatch = match config.dispatch {
        DispatchSetting::Sequential => DispatchMode::Sequential,
        DispatchSetting::Concurrent => DispatchMode::Concurrent {
            max_in_flight: NonZeroUsize::new(config.max_in_flight).ok_or_else(|| {
                Error::Config("translation.max_in_flight must be at least 1".to_string())
            })?,
        },
    };

    Ok(CoordinatorConfig {
        batch_size,
        dispatch,
        batch_timeout: config.batch_timeout_secs.map(Duration::from_secs),
    })
}
