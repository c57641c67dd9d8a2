// Editor preview - walks one instrument's equation over the preview domain
//
// Independent of the timeline: x starts at the domain start, advances by dX
// every dT milliseconds and wraps back once it passes the domain end.

use crate::audio::pitch::{FrequencyBand, note_name};
use crate::equation::{EvalError, Evaluator};
use crate::sequencer::instrument::{Instrument, PREVIEW_DOMAIN};
use std::ops::RangeInclusive;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    Sounded { frequency: f64, note: String },
    Muted,
    Failed(EvalError),
}

/// One preview tick
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewStep {
    pub tick_index: usize,
    pub x: f64,
    pub outcome: PreviewOutcome,
}

pub struct PreviewLoop {
    domain: RangeInclusive<f64>,
    x: f64,
    tick_index: usize,
}

impl PreviewLoop {
    pub fn new(domain: RangeInclusive<f64>) -> Self {
        let x = *domain.start();
        Self {
            domain,
            x,
            tick_index: 0,
        }
    }

    /// Tick period for an instrument (its dT, at least 1 ms)
    pub fn period(instrument: &Instrument) -> Duration {
        Duration::from_millis(instrument.d_t.max(1))
    }

    pub fn tick_index(&self) -> usize {
        self.tick_index
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn reset(&mut self) {
        self.x = *self.domain.start();
        self.tick_index = 0;
    }

    /// Evaluate the current point, then move to the next one
    pub fn step(
        &mut self,
        instrument: &Instrument,
        evaluator: &mut dyn Evaluator,
        band: &FrequencyBand,
    ) -> PreviewStep {
        let tick_index = self.tick_index;
        let x = self.x;

        let outcome = if !instrument.is_step_enabled(tick_index) {
            PreviewOutcome::Muted
        } else {
            match evaluator.evaluate(&instrument.equation, x) {
                Ok(raw) => {
                    let frequency = band.shape(raw);
                    PreviewOutcome::Sounded {
                        frequency,
                        note: note_name(frequency),
                    }
                }
                Err(e) => {
                    log::warn!("Preview of {} skipped x = {}: {}", instrument.label(), x, e);
                    PreviewOutcome::Failed(e)
                }
            }
        };

        self.advance(instrument.d_x);

        PreviewStep {
            tick_index,
            x,
            outcome,
        }
    }

    fn advance(&mut self, d_x: f64) {
        let next = self.x + d_x;
        if d_x > 0.0 && next.is_finite() && next <= *self.domain.end() {
            self.x = next;
            self.tick_index += 1;
        } else {
            self.reset();
        }
    }
}

impl Default for PreviewLoop {
    fn default() -> Self {
        Self::new(PREVIEW_DOMAIN)
    }
}
