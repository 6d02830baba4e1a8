use crate::catalog::FormulationParams;
use crate::error::{PKError, PKResult};

/// Relative gap below which `ka` and `ke` are treated as equal.
const DEGENERATE_TOLERANCE: f64 = 1e-9;

/// One-compartment model with first-order absorption, evaluated per dose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneCompartmentModel {
    ka: f64,
    ke: f64,
    /// Bioavailability times the mg → canonical-unit scaling.
    scale: f64,
}

impl OneCompartmentModel {
    pub fn new(ka: f64, ke: f64, scale: f64) -> PKResult<Self> {
        if !(ka.is_finite() && ka > 0.0) {
            return Err(PKError::Validation("KA must be positive".to_string()));
        }
        if !(ke.is_finite() && ke > 0.0) {
            return Err(PKError::Validation("KE must be positive".to_string()));
        }
        if !(scale.is_finite() && scale >= 0.0) {
            return Err(PKError::Validation("Scale must be non-negative".to_string()));
        }
        Ok(Self { ka, ke, scale })
    }

    pub fn from_formulation(params: &FormulationParams) -> Self {
        Self {
            ka: params.ka,
            ke: params.ke,
            scale: params.bioavailability * params.canonical_scale(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        (self.ka - self.ke).abs() <= DEGENERATE_TOLERANCE * self.ka.max(self.ke)
    }

    /// Concentration `elapsed_h` hours after a single dose of `dose_mg`.
    /// Zero before the dose.
    pub fn concentration(&self, dose_mg: f64, elapsed_h: f64) -> f64 {
        if !(elapsed_h > 0.0) {
            return 0.0;
        }

        let amount = dose_mg * self.scale;

        if self.is_degenerate() {
            // ka == ke: limit of the Bateman function
            return amount * self.ke * elapsed_h * (-self.ke * elapsed_h).exp();
        }

        // ka/(ka-ke) * (e^-ke*t - e^-ka*t), rewritten around the slower rate so
        // that neither factor overflows and close rates do not cancel.
        let slow = self.ka.min(self.ke);
        let gap = (self.ka - self.ke).abs();
        let rising = -(-gap * elapsed_h).exp_m1();

        (amount * self.ka / gap * (-slow * elapsed_h).exp() * rising).max(0.0)
    }

    /// Time of the single-dose peak after administration.
    pub fn time_to_peak(&self) -> f64 {
        if self.is_degenerate() {
            1.0 / self.ke
        } else {
            (self.ka / self.ke).ln() / (self.ka - self.ke)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Ester;
    use approx::assert_relative_eq;

    #[test]
    fn test_matches_bateman_closed_form() {
        let model = OneCompartmentModel::new(1.0, 0.2, 0.1).unwrap();
        let (ka, ke) = (1.0_f64, 0.2_f64);

        for &t in &[0.5, 1.0, 5.0, 24.0] {
            let expected = 100.0 * 0.1 * ka / (ka - ke) * ((-ke * t).exp() - (-ka * t).exp());
            assert_relative_eq!(model.concentration(100.0, t), expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_flip_flop_matches_closed_form() {
        let model = OneCompartmentModel::new(0.02, 0.07, 1.0).unwrap();
        let (ka, ke) = (0.02_f64, 0.07_f64);
        let t = 30.0;
        let expected = 10.0 * ka / (ka - ke) * ((-ke * t).exp() - (-ka * t).exp());
        assert_relative_eq!(model.concentration(10.0, t), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_zero_before_and_at_dose() {
        let model = OneCompartmentModel::from_formulation(Ester::Valerate.params());
        assert_eq!(model.concentration(10.0, -1.0), 0.0);
        assert_eq!(model.concentration(10.0, 0.0), 0.0);
        assert!(model.concentration(10.0, 1.0) > 0.0);
    }

    #[test]
    fn test_degenerate_limit_is_continuous() {
        let ke = 0.07;
        let degenerate = OneCompartmentModel::new(ke, ke, 1.0).unwrap();
        assert!(degenerate.is_degenerate());

        for &t in &[1.0, 10.0, 48.0, 200.0] {
            let limit = degenerate.concentration(5.0, t);
            assert_relative_eq!(limit, 5.0 * ke * t * (-ke * t).exp(), max_relative = 1e-12);

            for &gap in &[1e-4, 1e-6] {
                let near = OneCompartmentModel::new(ke * (1.0 + gap), ke, 1.0).unwrap();
                assert!(!near.is_degenerate());
                let tolerance = 10.0 * gap * (ke * t).max(1.0);
                assert_relative_eq!(near.concentration(5.0, t), limit, max_relative = tolerance);
            }
        }
    }

    #[test]
    fn test_long_horizon_underflows_to_zero() {
        let model = OneCompartmentModel::from_formulation(Ester::Undecylate.params());
        let c = model.concentration(100.0, 5.0e6);
        assert!(c.is_finite());
        assert_eq!(c, 0.0);
    }

    #[test]
    fn test_time_to_peak() {
        let model = OneCompartmentModel::new(1.0, 0.2, 1.0).unwrap();
        let tmax = model.time_to_peak();
        assert_relative_eq!(tmax, (5.0_f64).ln() / 0.8, epsilon = 1e-12);
        assert!(model.concentration(1.0, tmax) > model.concentration(1.0, tmax - 0.1));
        assert!(model.concentration(1.0, tmax) > model.concentration(1.0, tmax + 0.1));
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        assert!(OneCompartmentModel::new(0.0, 0.1, 1.0).is_err());
        assert!(OneCompartmentModel::new(0.1, -0.1, 1.0).is_err());
        assert!(OneCompartmentModel::new(0.1, 0.1, f64::NAN).is_err());
    }
}
