//! Angular distances between physics objects
//!
//! These are pure functions of (pseudorapidity, azimuth) pairs, so that they
//! can be applied to parallel attribute columns without any global state.

use num_traits::{Float, FloatConst};

/// Azimuthal angle difference, wrapped into (-π, π]
pub fn delta_phi<F: Float + FloatConst>(phi1: F, phi2: F) -> F {
    let two_pi = F::TAU();
    let mut dphi = (phi1 - phi2) % two_pi;
    if dphi > F::PI() {
        dphi = dphi - two_pi;
    } else if dphi <= -F::PI() {
        dphi = dphi + two_pi;
    }
    dphi
}

/// Angular separation ΔR = √(Δη² + Δφ²)
pub fn delta_r<F: Float + FloatConst>(eta1: F, phi1: F, eta2: F, phi2: F) -> F {
    let deta = eta1 - eta2;
    let dphi = delta_phi(phi1, phi2);
    (deta * deta + dphi * dphi).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn delta_phi_wraps() {
        assert_relative_eq!(delta_phi(0.1, -0.1), 0.2, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(3.0, -3.0), 6.0 - 2. * PI, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(-3.0, 3.0), 2. * PI - 6.0, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(PI, 0.), PI, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(0., PI), PI, epsilon = 1e-12);
        assert_relative_eq!(delta_phi(7.0, 0.), 7.0 - 2. * PI, epsilon = 1e-12);
    }

    #[test]
    fn delta_r_is_symmetric() {
        let a = delta_r(0.5, 2.9, -0.7, -3.0);
        let b = delta_r(-0.7, -3.0, 0.5, 2.9);
        assert_relative_eq!(a, b, epsilon = 1e-12);
        let expected = (1.2f64.powi(2) + (5.9 - 2. * PI).powi(2)).sqrt();
        assert_relative_eq!(a, expected, epsilon = 1e-12);
    }

    #[test]
    fn delta_r_single_precision() {
        let dr = delta_r(0.0f32, 0.0, 0.3, 0.4);
        assert_relative_eq!(dr, 0.5f32, epsilon = 1e-6);
    }
}
