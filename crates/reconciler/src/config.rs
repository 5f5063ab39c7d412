//! Configuration settings for a renderer.
//!
//! This module defines the time budget handed to each work-loop slice, the
//! threshold below which the loop yields, and whether per-commit telemetry is
//! logged. Configuration can be loaded from environment variables or
//! constructed programmatically.

use core::time::Duration;
use std::env;

/// Runtime configuration for a [`Renderer`](crate::Renderer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Time budget of one frame slice in milliseconds
    pub frame_budget_ms: u64,
    /// The work loop yields once less than this many milliseconds remain
    pub yield_threshold_ms: u64,
    /// Whether to log a telemetry line after every commit
    pub telemetry_enabled: bool,
}

impl RendererConfig {
    /// Construct a new `RendererConfig` with explicit values.
    ///
    /// # Arguments
    ///
    /// * `frame_budget_ms` - Frame budget in milliseconds (minimum 1ms)
    /// * `yield_threshold_ms` - Remaining time below which the loop yields
    /// * `telemetry_enabled` - Whether to emit telemetry logs
    ///
    /// # Returns
    ///
    /// A new `RendererConfig` instance with the specified settings
    #[inline]
    #[must_use]
    pub const fn new(frame_budget_ms: u64, yield_threshold_ms: u64, telemetry_enabled: bool) -> Self {
        let budget = if frame_budget_ms < 1 {
            1
        } else {
            frame_budget_ms
        };
        Self {
            frame_budget_ms: budget,
            yield_threshold_ms,
            telemetry_enabled,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `SAPLING_FRAME_BUDGET_MS`: Frame budget in milliseconds (default: 16)
    /// - `SAPLING_YIELD_THRESHOLD_MS`: Yield threshold in milliseconds (default: 1)
    /// - `SAPLING_TELEMETRY`: Set to "1" to enable telemetry (default: disabled)
    ///
    /// # Returns
    ///
    /// A new `RendererConfig` instance populated from environment variables
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let frame_budget_ms = env::var("SAPLING_FRAME_BUDGET_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(16)
            .max(1);
        let yield_threshold_ms = env::var("SAPLING_YIELD_THRESHOLD_MS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(1);
        let telemetry_enabled = env::var("SAPLING_TELEMETRY").ok().as_deref() == Some("1");
        Self {
            frame_budget_ms,
            yield_threshold_ms,
            telemetry_enabled,
        }
    }

    /// Get the frame budget as a `Duration`.
    ///
    /// # Returns
    ///
    /// The frame budget duration
    #[inline]
    #[must_use]
    pub const fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// Get the yield threshold as a `Duration`.
    ///
    /// # Returns
    ///
    /// The remaining-time threshold below which the work loop yields
    #[inline]
    #[must_use]
    pub const fn yield_threshold(&self) -> Duration {
        Duration::from_millis(self.yield_threshold_ms)
    }
}

impl Default for RendererConfig {
    #[inline]
    fn default() -> Self {
        Self::new(16, 1, false)
    }
}
