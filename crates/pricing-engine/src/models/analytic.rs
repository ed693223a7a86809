//! Closed-form European pricing (Black-Scholes).

use super::ValuationModel;
use crate::types::{OptionType, ValuationRequest};
use config::ModelKind;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_2_SQRT_PI};

/// 1/sqrt(2*pi)
const INV_SQRT_2PI: f64 = FRAC_1_SQRT_2 * FRAC_2_SQRT_PI * 0.5;

/// Abramowitz-Stegun 26.2.17
const AS_P: f64 = 0.2316419;
const AS_B: [f64; 5] = [
    0.319381530,
    -0.356563782,
    1.781477937,
    -1.821255978,
    1.330274429,
];

pub fn norm_pdf(x: f64) -> f64 {
    INV_SQRT_2PI * (-x * x / 2.0).exp()
}

/// Standard normal CDF, accurate to about 7.5e-8.
pub fn norm_cdf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + AS_P * x.abs());
    // b1*t + b2*t^2 + ... + b5*t^5
    let series = AS_B.iter().rev().fold(0.0, |acc, b| (acc + b) * t);
    let upper_tail = norm_pdf(x) * series;

    if x < 0.0 {
        upper_tail
    } else {
        1.0 - upper_tail
    }
}

pub fn d1_d2(request: &ValuationRequest) -> (f64, f64) {
    let ValuationRequest {
        spot: s,
        strike: k,
        time: t,
        vol: v,
        rate: r,
        ..
    } = *request;

    let d1 = ((s / k).ln() + (r + 0.5 * v * v) * t) / (v * t.sqrt());
    let d2 = d1 - v * t.sqrt();

    (d1, d2)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticModel;

impl ValuationModel for AnalyticModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Analytic
    }

    fn valuate(&self, request: &ValuationRequest) -> f64 {
        if request.is_degenerate() {
            return request.intrinsic();
        }

        let (d1, d2) = d1_d2(request);
        let s = request.spot;
        let discounted_strike = request.strike * (-request.rate * request.time).exp();

        match request.option_type {
            OptionType::Call => s * norm_cdf(d1) - discounted_strike * norm_cdf(d2),
            OptionType::Put => discounted_strike * norm_cdf(-d2) - s * norm_cdf(-d1),
        }
    }
}
