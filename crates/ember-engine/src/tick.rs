//! Fixed-timestep driver for the ECS.
//!
//! The [`GameLoop`] decouples the simulation rate from the frame rate. Each
//! frame the caller reports how much real time has passed; the loop adds it to
//! an accumulator and runs one [`Ecs::update`] per whole `fixed_dt_ms` in the
//! accumulator, carrying the remainder into the next frame. A frame may
//! therefore run zero, one, or several ticks.
//!
//! # Example
//!
//! ```
//! use ember_engine::prelude::*;
//!
//! let config = TickConfig { fixed_dt_ms: 10.0, ..Default::default() };
//! let mut game = GameLoop::new(Ecs::new(), config);
//!
//! assert_eq!(game.advance(25.0).unwrap(), 2);
//! assert_eq!(game.accumulator_ms(), 5.0);
//! assert_eq!(game.advance(5.0).unwrap(), 1);
//! assert_eq!(game.tick_count(), 3);
//! ```

use std::time::{Duration, Instant};

use ember_ecs::ecs::{Ecs, DEFAULT_TIMESTEP_MS};
use ember_ecs::EcsError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::view::View;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep loop.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Simulated milliseconds per tick. Must be positive and finite.
    pub fixed_dt_ms: f64,
    /// Headless mode: frames run ticks but never draw.
    pub headless: bool,
}

impl Default for TickConfig {
    /// Defaults to 30 Hz (`1000 / 30` ms per tick), headless off.
    fn default() -> Self {
        Self {
            fixed_dt_ms: DEFAULT_TIMESTEP_MS,
            headless: false,
        }
    }
}

impl TickConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidTimestep`] for a bad `fixed_dt_ms`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimestep`] unless `fixed_dt_ms` is
    /// positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_dt_ms > 0.0 && self.fixed_dt_ms.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidTimestep(self.fixed_dt_ms))
        }
    }

    /// Ticks per second implied by `fixed_dt_ms`.
    pub fn tick_rate(&self) -> f64 {
        1000.0 / self.fixed_dt_ms
    }
}

/// Errors produced while loading a [`TickConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for a [`TickConfig`].
    #[error("failed to parse tick config: {0}")]
    Parse(#[from] serde_json::Error),

    /// `fixed_dt_ms` is zero, negative, NaN, or infinite.
    #[error("fixed_dt_ms must be positive and finite, got {0}")]
    InvalidTimestep(f64),
}

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Ticks executed during the frame.
    pub ticks_run: u32,
    /// Wall-clock time spent in [`Ecs::update`] calls.
    pub update_time: Duration,
    /// Wall-clock time spent drawing (zero when headless).
    pub draw_time: Duration,
}

// ---------------------------------------------------------------------------
// GameLoop
// ---------------------------------------------------------------------------

/// Accumulator-driven game loop around an [`Ecs`].
///
/// The loop owns all timing. The ECS itself only ever sees a sequence of
/// `update(fixed_dt_ms)` calls.
pub struct GameLoop {
    ecs: Ecs,
    config: TickConfig,
    /// Real time not yet consumed by a tick.
    accumulator_ms: f64,
    /// Number of frames processed.
    frame_counter: u64,
    last_diagnostics: FrameDiagnostics,
}

impl std::fmt::Debug for GameLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoop")
            .field("config", &self.config)
            .field("accumulator_ms", &self.accumulator_ms)
            .field("tick_count", &self.ecs.tick_count())
            .field("frame_counter", &self.frame_counter)
            .finish()
    }
}

impl GameLoop {
    /// Create a loop driving `ecs`.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt_ms` is not positive and finite.
    pub fn new(ecs: Ecs, config: TickConfig) -> Self {
        if let Err(err) = config.validate() {
            panic!("{err}");
        }
        debug!(
            fixed_dt_ms = config.fixed_dt_ms,
            headless = config.headless,
            "game loop created"
        );
        Self {
            ecs,
            config,
            accumulator_ms: 0.0,
            frame_counter: 0,
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Account for `elapsed_ms` of real time and run every tick that fits.
    ///
    /// Negative or non-finite elapsed times are ignored. Returns the number
    /// of ticks run.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Ecs::update`]. The failed tick's
    /// time stays in the accumulator, so the next call retries it.
    pub fn advance(&mut self, elapsed_ms: f64) -> Result<u32, EcsError> {
        if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
            warn!(elapsed_ms, "ignoring invalid frame time");
            return Ok(0);
        }

        let started = Instant::now();
        self.accumulator_ms += elapsed_ms;
        let dt = self.config.fixed_dt_ms;
        let mut ticks_run = 0u32;
        let result = loop {
            if self.accumulator_ms < dt {
                break Ok(ticks_run);
            }
            if let Err(err) = self.ecs.update(dt) {
                break Err(err);
            }
            self.accumulator_ms -= dt;
            ticks_run += 1;
        };

        self.frame_counter += 1;
        self.last_diagnostics = FrameDiagnostics {
            ticks_run,
            update_time: started.elapsed(),
            draw_time: Duration::ZERO,
        };
        result
    }

    /// [`advance`](Self::advance), then draw the world through `view` unless
    /// the loop is headless.
    ///
    /// # Errors
    ///
    /// See [`advance`](Self::advance). Nothing is drawn when a tick fails.
    pub fn frame(&mut self, elapsed_ms: f64, view: &mut dyn View) -> Result<u32, EcsError> {
        let ticks_run = self.advance(elapsed_ms)?;
        if !self.config.headless {
            let started = Instant::now();
            view.draw(self.ecs.world());
            self.last_diagnostics.draw_time = started.elapsed();
        }
        Ok(ticks_run)
    }

    /// Run exactly `count` ticks, bypassing the accumulator.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first error from [`Ecs::update`].
    pub fn run_ticks(&mut self, count: u64) -> Result<(), EcsError> {
        for _ in 0..count {
            self.ecs.update(self.config.fixed_dt_ms)?;
        }
        Ok(())
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.ecs.tick_count()
    }

    /// Simulated time in milliseconds.
    ///
    /// Computed as `tick_count * fixed_dt_ms` to avoid drift from repeated
    /// addition.
    pub fn sim_time_ms(&self) -> f64 {
        self.ecs.tick_count() as f64 * self.config.fixed_dt_ms
    }

    /// Real time carried over to the next frame.
    pub fn accumulator_ms(&self) -> f64 {
        self.accumulator_ms
    }

    /// The number of frames processed.
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// The configuration this loop was created with.
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Whether headless mode is enabled.
    pub fn is_headless(&self) -> bool {
        self.config.headless
    }

    /// Diagnostics from the last frame.
    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }

    /// Read-only access to the ECS.
    pub fn ecs(&self) -> &Ecs {
        &self.ecs
    }

    /// Mutable access to the ECS, for setup between frames.
    pub fn ecs_mut(&mut self) -> &mut Ecs {
        &mut self.ecs
    }

    /// Consume the loop and return the ECS.
    pub fn into_ecs(self) -> Ecs {
        self.ecs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
