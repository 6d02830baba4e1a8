use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{PKError, PKResult};

/// One sample every 30 minutes.
pub const DEFAULT_RESOLUTION_H: f64 = 0.5;

/// Upper bound on samples in a single request.
const MAX_SAMPLES: f64 = 5_000_000.0;

const HOURS_PER_DAY: f64 = 24.0;

/// Closed time range plus grid spacing, all in hours since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSampleWindow")]
pub struct SampleWindow {
    start_h: f64,
    end_h: f64,
    resolution_h: f64,
}

/// Unchecked wire form; every deserialized window goes through [`SampleWindow::new`].
#[derive(Debug, Deserialize)]
struct RawSampleWindow {
    start_h: f64,
    end_h: f64,
    resolution_h: f64,
}

impl TryFrom<RawSampleWindow> for SampleWindow {
    type Error = PKError;

    fn try_from(raw: RawSampleWindow) -> PKResult<Self> {
        SampleWindow::new(raw.start_h, raw.end_h, raw.resolution_h)
    }
}

impl SampleWindow {
    pub fn new(start_h: f64, end_h: f64, resolution_h: f64) -> PKResult<Self> {
        if !start_h.is_finite() || !end_h.is_finite() {
            return Err(PKError::InvalidWindow(format!(
                "bounds must be finite, got [{}, {}]",
                start_h, end_h
            )));
        }
        if end_h < start_h {
            return Err(PKError::InvalidWindow(format!(
                "end ({}h) precedes start ({}h)",
                end_h, start_h
            )));
        }
        if !(resolution_h.is_finite() && resolution_h > 0.0) {
            return Err(PKError::InvalidWindow(format!(
                "resolution must be positive, got {}",
                resolution_h
            )));
        }
        if (end_h - start_h) / resolution_h > MAX_SAMPLES {
            return Err(PKError::InvalidWindow(format!(
                "{}h at {}h resolution exceeds {} samples",
                end_h - start_h,
                resolution_h,
                MAX_SAMPLES
            )));
        }

        Ok(Self {
            start_h,
            end_h,
            resolution_h,
        })
    }

    pub fn start_h(&self) -> f64 {
        self.start_h
    }

    pub fn end_h(&self) -> f64 {
        self.end_h
    }

    pub fn resolution_h(&self) -> f64 {
        self.resolution_h
    }

    pub fn span_h(&self) -> f64 {
        self.end_h - self.start_h
    }

    pub fn contains(&self, time_h: f64) -> bool {
        time_h >= self.start_h && time_h <= self.end_h
    }

    /// Evenly spaced, strictly increasing sample times. Both bounds are
    /// included; the final step may be shorter than the resolution.
    pub fn grid(&self) -> Vec<f64> {
        let steps = (self.span_h() / self.resolution_h).floor() as usize;
        let mut times: Vec<f64> = (0..=steps)
            .map(|i| self.start_h + i as f64 * self.resolution_h)
            .collect();

        if let Some(&last) = times.last() {
            let slack = self.end_h - last;
            if slack > self.resolution_h * 1e-9 {
                times.push(self.end_h);
            } else if let Some(tail) = times.last_mut() {
                *tail = self.end_h;
            }
        }

        times
    }
}

/// Canned viewports around "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreset {
    /// One week either side of now.
    #[default]
    Default,
    /// Last seven days and the next day.
    Week,
    /// Last thirty days and the next two.
    Month,
}

impl ViewPreset {
    /// Hours before and after now.
    pub fn offsets_h(&self) -> (f64, f64) {
        match self {
            ViewPreset::Default => (7.0 * HOURS_PER_DAY, 7.0 * HOURS_PER_DAY),
            ViewPreset::Week => (7.0 * HOURS_PER_DAY, HOURS_PER_DAY),
            ViewPreset::Month => (30.0 * HOURS_PER_DAY, 2.0 * HOURS_PER_DAY),
        }
    }

    pub fn window(&self, now_h: f64, resolution_h: f64) -> PKResult<SampleWindow> {
        let (before, after) = self.offsets_h();
        SampleWindow::new(now_h - before, now_h + after, resolution_h)
    }
}
