//! Complex power flowing through lines.

use num_complex::Complex64;
use ps_core::{Admittance, VoltagePolar};

/// Power leaving each end of a line into the line (pu).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineFlow {
    pub p_ab: f64,
    pub q_ab: f64,
    pub p_ba: f64,
    pub q_ba: f64,
}

impl LineFlow {
    /// `S_ab = V_a conj(y (V_a − V_b))` and symmetrically for `S_ba`.
    pub fn compute(y: Admittance, va: VoltagePolar, vb: VoltagePolar) -> Self {
        let y = y.complex();
        let (va, vb) = (va.phasor(), vb.phasor());
        let s_ab = va * (y * (va - vb)).conj();
        let s_ba = vb * (y * (vb - va)).conj();
        Self {
            p_ab: s_ab.re,
            q_ab: s_ab.im,
            p_ba: s_ba.re,
            q_ba: s_ba.im,
        }
    }

    /// Series losses `S_ab + S_ba`.
    pub fn losses(&self) -> Complex64 {
        Complex64::new(self.p_ab + self.p_ba, self.q_ab + self.q_ba)
    }
}
