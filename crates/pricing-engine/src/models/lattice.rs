//! Cox-Ross-Rubinstein binomial tree with American early exercise.

use super::ValuationModel;
use crate::types::ValuationRequest;
use config::ModelKind;

pub const DEFAULT_STEPS: u32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct LatticeModel {
    steps: u32,
}

impl LatticeModel {
    /// A tree with `steps` time steps (at least one).
    pub fn new(steps: u32) -> Self {
        Self {
            steps: steps.max(1),
        }
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }
}

impl Default for LatticeModel {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS)
    }
}

impl ValuationModel for LatticeModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Lattice
    }

    fn valuate(&self, request: &ValuationRequest) -> f64 {
        if request.is_degenerate() {
            return request.intrinsic();
        }

        let steps = self.steps as usize;
        let dt = request.time / steps as f64;
        let u = (request.vol * dt.sqrt()).exp();
        let d = 1.0 / u;
        let p = ((request.rate * dt).exp() - d) / (u - d);
        let discount = (-request.rate * dt).exp();

        let option_type = request.option_type;
        let node_price = |step: usize, ups: usize| {
            request.spot * u.powi(ups as i32) * d.powi((step - ups) as i32)
        };

        let mut values: Vec<f64> = (0..=steps)
            .map(|ups| option_type.intrinsic(node_price(steps, ups), request.strike))
            .collect();

        for step in (0..steps).rev() {
            for ups in 0..=step {
                let hold = (p * values[ups + 1] + (1.0 - p) * values[ups]) * discount;
                let exercise = option_type.intrinsic(node_price(step, ups), request.strike);
                values[ups] = hold.max(exercise);
            }
        }

        values[0]
    }
}
