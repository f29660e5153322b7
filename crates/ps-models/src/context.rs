//! Read-only view of a bus and its electrical neighbourhood.

use num_complex::Complex64;
use ps_core::{Admittance, VoltagePolar};

/// One off-diagonal admittance-matrix entry and the voltage at its far end.
///
/// `admittance` holds the *stored* matrix entry `(G_ik, B_ik)`, where the
/// stored susceptance is the negated physical one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub admittance: Admittance,
    pub voltage: VoltagePolar,
}

/// Everything a model may read about the bus it is attached to.
#[derive(Clone, Copy, Debug)]
pub struct BusContext<'a> {
    /// Current bus voltage (pending iterate when a solve is in progress).
    pub voltage: VoltagePolar,
    /// Stored diagonal entry `(G_ii, B_ii)`.
    pub self_admittance: Admittance,
    pub neighbors: &'a [Neighbor],
}

impl<'a> BusContext<'a> {
    pub fn new(
        voltage: VoltagePolar,
        self_admittance: Admittance,
        neighbors: &'a [Neighbor],
    ) -> Self {
        Self {
            voltage,
            self_admittance,
            neighbors,
        }
    }

    /// Net complex power flowing from the bus into the network.
    pub fn network_injection(&self) -> Complex64 {
        self.network_injection_at(self.voltage)
    }

    /// Network injection evaluated as if the bus sat at `voltage`,
    /// neighbours unchanged.
    ///
    /// ```text
    /// P_i = V_i [ G_ii V_i + Σ V_k (G_ik cos θ_ik − B_ik sin θ_ik) ]
    /// Q_i = V_i [ B_ii V_i + Σ V_k (G_ik sin θ_ik + B_ik cos θ_ik) ]
    /// ```
    pub fn network_injection_at(&self, voltage: VoltagePolar) -> Complex64 {
        let vi = voltage.magnitude;
        let mut p_sum = self.self_admittance.conductance * vi;
        let mut q_sum = self.self_admittance.susceptance * vi;
        for n in self.neighbors {
            let (sin, cos) = (voltage.angle - n.voltage.angle).sin_cos();
            let g = n.admittance.conductance;
            let b = n.admittance.susceptance;
            let vk = n.voltage.magnitude;
            p_sum += vk * (g * cos - b * sin);
            q_sum += vk * (g * sin + b * cos);
        }
        Complex64::new(vi * p_sum, vi * q_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two buses joined by a lossless line of reactance 0.1 (y = -j10).
    /// Stored entries: G_ii = 0, B_ii = 10, G_ik = 0, B_ik = -10.
    fn two_bus(angle_i: f64) -> (VoltagePolar, [Neighbor; 1]) {
        let neighbor = Neighbor {
            admittance: Admittance::new(0.0, -10.0),
            voltage: VoltagePolar::FLAT,
        };
        (VoltagePolar::new(1.0, angle_i), [neighbor])
    }

    #[test]
    fn flat_start_carries_no_power() {
        let (v, n) = two_bus(0.0);
        let ctx = BusContext::new(v, Admittance::new(0.0, 10.0), &n);
        let s = ctx.network_injection();
        assert!(s.norm() < 1e-12);
    }

    #[test]
    fn leading_angle_exports_real_power() {
        // P = V_i V_k sin(θ_ik) / x for a lossless line.
        let theta = 0.1_f64;
        let (v, n) = two_bus(theta);
        let ctx = BusContext::new(v, Admittance::new(0.0, 10.0), &n);
        let s = ctx.network_injection();
        assert!((s.re - 10.0 * theta.sin()).abs() < 1e-12);
        assert!((s.im - 10.0 * (1.0 - theta.cos())).abs() < 1e-12);
    }

    #[test]
    fn matches_complex_current_formula() {
        let y_line = Complex64::new(1.5, -6.0);
        let neighbor = Neighbor {
            admittance: Admittance::new(-y_line.re, y_line.im),
            voltage: VoltagePolar::new(0.97, -0.05),
        };
        let neighbors = [neighbor];
        let vi = VoltagePolar::new(1.03, 0.12);
        let ctx = BusContext::new(vi, Admittance::new(y_line.re, -y_line.im), &neighbors);
        let s = ctx.network_injection();

        // Stored: G_ii = g, B_ii = -b, G_ik = -g, B_ik = b.
        let current = y_line * (vi.phasor() - neighbor.voltage.phasor());
        let expected = vi.phasor() * current.conj();
        assert!((s.re - expected.re).abs() < 1e-12);
        assert!((s.im - expected.im).abs() < 1e-12);
    }
}
