//! Option valuation models.
//!
//! Both models short-circuit to intrinsic value when there is no time left or
//! no volatility, and neither clamps its output otherwise.

pub mod analytic;
pub mod lattice;

pub use analytic::AnalyticModel;
pub use lattice::LatticeModel;

use crate::types::ValuationRequest;
use config::ModelKind;

/// A pricing function from option terms to a theoretical premium.
pub trait ValuationModel: Send + Sync {
    fn kind(&self) -> ModelKind;

    fn valuate(&self, request: &ValuationRequest) -> f64;
}

/// The two models, addressable by [`ModelKind`].
#[derive(Debug, Clone)]
pub struct ModelSet {
    analytic: AnalyticModel,
    lattice: LatticeModel,
}

impl ModelSet {
    pub fn new(lattice_steps: u32) -> Self {
        Self {
            analytic: AnalyticModel,
            lattice: LatticeModel::new(lattice_steps),
        }
    }

    pub fn get(&self, kind: ModelKind) -> &dyn ValuationModel {
        match kind {
            ModelKind::Analytic => &self.analytic,
            ModelKind::Lattice => &self.lattice,
        }
    }
}

impl Default for ModelSet {
    fn default() -> Self {
        Self::new(lattice::DEFAULT_STEPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OptionType;

    fn request(option_type: OptionType, spot: f64, time: f64) -> ValuationRequest {
        ValuationRequest {
            option_type,
            spot,
            strike: 100.0,
            time,
            vol: 0.3,
            rate: 0.05,
        }
    }

    #[test]
    fn test_model_set_dispatch() {
        let models = ModelSet::default();
        assert_eq!(models.get(ModelKind::Analytic).kind(), ModelKind::Analytic);
        assert_eq!(models.get(ModelKind::Lattice).kind(), ModelKind::Lattice);
    }

    #[test]
    fn test_models_approach_intrinsic_near_expiry() {
        let models = ModelSet::default();
        for kind in [ModelKind::Analytic, ModelKind::Lattice] {
            let model = models.get(kind);
            for option_type in [OptionType::Call, OptionType::Put] {
                for spot in [80.0, 95.0, 100.0, 105.0, 120.0] {
                    let req = request(option_type, spot, 1e-6);
                    let price = model.valuate(&req);
                    assert!(
                        price >= req.intrinsic() - 1e-3,
                        "{} {} spot {}: {} below intrinsic {}",
                        kind,
                        option_type,
                        spot,
                        price,
                        req.intrinsic()
                    );
                    assert!((price - req.intrinsic()).abs() < 0.05);
                }
            }
        }
    }

    #[test]
    fn test_models_agree_on_european_call() {
        // Without dividends early exercise of a call is never optimal
        let models = ModelSet::new(500);
        let req = request(OptionType::Call, 100.0, 0.5);
        let analytic = models.get(ModelKind::Analytic).valuate(&req);
        let lattice = models.get(ModelKind::Lattice).valuate(&req);
        assert!((analytic - lattice).abs() < 0.05, "{} vs {}", analytic, lattice);
    }

    #[test]
    fn test_degenerate_inputs_return_intrinsic() {
        let models = ModelSet::default();
        for kind in [ModelKind::Analytic, ModelKind::Lattice] {
            let model = models.get(kind);
            let expired = request(OptionType::Put, 90.0, -0.1);
            assert_eq!(model.valuate(&expired), 10.0);

            let flat = ValuationRequest {
                vol: 0.0,
                ..request(OptionType::Call, 90.0, 1.0)
            };
            assert_eq!(model.valuate(&flat), 0.0);
        }
    }
}
