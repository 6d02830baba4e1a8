pub mod result;
pub mod window;

use log::{debug, info};

use crate::calibration::Calibration;
use crate::catalog::Analyte;
use crate::dosing::DosingRegimen;
use crate::models::{DoseEvent, LabResult, OneCompartmentModel, PKModel, TimeSeriesPoint};

pub use result::*;
pub use window::*;

/// Superposition of per-dose responses for a single analyte.
///
/// Holds no clock and no grid: it is evaluated lazily at whatever instants
/// the caller asks for, so zooming or panning only means sampling again.
#[derive(Debug, Clone)]
pub struct Simulator {
    analyte: Analyte,
    doses: Vec<(DoseEvent, OneCompartmentModel)>,
}

impl Simulator {
    /// Keeps only the events whose formulation produces `analyte`.
    pub fn new(analyte: Analyte, events: &[DoseEvent]) -> Self {
        let mut doses: Vec<(DoseEvent, OneCompartmentModel)> = events
            .iter()
            .filter(|event| event.analyte() == analyte)
            .map(|event| {
                let model = OneCompartmentModel::from_formulation(event.ester.params());
                (event.clone(), model)
            })
            .collect();
        doses.sort_by(|a, b| a.0.time_h.total_cmp(&b.0.time_h));

        Self { analyte, doses }
    }

    pub fn analyte(&self) -> Analyte {
        self.analyte
    }

    pub fn dose_count(&self) -> usize {
        self.doses.len()
    }

    pub fn events(&self) -> impl Iterator<Item = &DoseEvent> {
        self.doses.iter().map(|(event, _)| event)
    }

    pub fn first_dose_h(&self) -> Option<f64> {
        self.doses.first().map(|(event, _)| event.time_h)
    }
}

impl PKModel for Simulator {
    fn concentration_at(&self, time_h: f64) -> f64 {
        self.doses
            .iter()
            .take_while(|(event, _)| event.time_h <= time_h)
            .map(|(event, model)| model.concentration(event.dose_mg, time_h - event.time_h))
            .sum()
    }
}

/// Evaluate any curve on the window's grid.
pub fn sample<M: PKModel>(model: &M, window: &SampleWindow) -> Vec<TimeSeriesPoint> {
    window
        .grid()
        .into_iter()
        .map(|time_h| TimeSeriesPoint {
            time_h,
            conc: model.concentration_at(time_h),
        })
        .collect()
}

/// Raw predicted series for one analyte.
pub fn simulate(
    analyte: Analyte,
    events: &[DoseEvent],
    window: &SampleWindow,
) -> Vec<TimeSeriesPoint> {
    let simulator = Simulator::new(analyte, events);
    let series = sample(&simulator, window);
    debug!(
        "Sampled {} points of {} from {} doses",
        series.len(),
        analyte.code(),
        simulator.dose_count()
    );
    series
}

/// Raw predicted concentration of one analyte at a single instant.
pub fn concentration_at(analyte: Analyte, events: &[DoseEvent], time_h: f64) -> f64 {
    Simulator::new(analyte, events).concentration_at(time_h)
}

/// Full pipeline for one analyte: raw curve, calibration against that
/// analyte's labs, and event markers on the calibrated curve.
pub fn simulate_analyte(
    analyte: Analyte,
    regimen: &DosingRegimen,
    labs: &[LabResult],
    window: &SampleWindow,
    calibrate: bool,
) -> AnalyteResult {
    let simulator = Simulator::new(analyte, &regimen.events);
    info!(
        "Simulating {} from {} doses over [{:.1}h, {:.1}h]",
        analyte,
        simulator.dose_count(),
        window.start_h(),
        window.end_h()
    );

    let calibration = if calibrate {
        Calibration::build(analyte, &simulator, labs)
    } else {
        Calibration::uncalibrated(analyte, &simulator, labs)
    };

    let rows = window
        .grid()
        .into_iter()
        .map(|time_h| {
            let raw_conc = simulator.concentration_at(time_h);
            let factor = calibration.function.evaluate(time_h);
            SeriesRow {
                time_h,
                raw_conc,
                calibrated_conc: raw_conc * factor,
                factor,
            }
        })
        .collect();

    let curve = calibration.curve(&simulator);
    let events = simulator
        .events()
        .map(|event| EventMarker {
            time_h: event.time_h,
            dose_mg: event.dose_mg,
            ester: event.ester,
            conc: curve.concentration_at(event.time_h),
        })
        .collect();

    AnalyteResult {
        analyte,
        rows,
        labs: calibration.outcomes,
        events,
    }
}
