//! Analytic power-flow Jacobian.
//!
//! Per bus pair the partials of `(P_i, Q_i)` with respect to `(θ_k, V_k)`
//! form a 2x2 block `[H N; K L]`. Off the diagonal:
//!
//! ```text
//! H_ik = V_i V_k (G_ik sin θ_ik + B_ik cos θ_ik)
//! N_ik = V_i (G_ik cos θ_ik − B_ik sin θ_ik)
//! K_ik = −N_ik V_k
//! L_ik = H_ik / V_k
//! ```
//!
//! On the diagonal, with `S1 = Σ V_k (G sin + B cos)` and
//! `S2 = Σ V_k (G cos − B sin)` over the neighbours:
//!
//! ```text
//! H_ii = −V_i S1         N_ii = S2 + 2 G_ii V_i
//! K_ii =  V_i S2         L_ii = S1 + 2 B_ii V_i
//! ```
//!
//! minus the model's own injection sensitivities, if it reports any.

use nalgebra_sparse::{CooMatrix, CsrMatrix};
use ps_core::{Admittance, VoltagePolar};
use ps_models::{BusContext, PowerSensitivities};
use rayon::prelude::*;

use crate::error::NetworkResult;
use crate::mismatch::NetworkView;

/// One `[H N; K L]` block.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JacobianBlock {
    pub h: f64,
    pub n: f64,
    pub k: f64,
    pub l: f64,
}

/// Partials of bus `i`'s injection with respect to neighbour `k`'s voltage.
pub fn off_diagonal_block(vi: VoltagePolar, vk: VoltagePolar, y_ik: Admittance) -> JacobianBlock {
    let (sin, cos) = (vi.angle - vk.angle).sin_cos();
    let (g, b) = (y_ik.conductance, y_ik.susceptance);
    let h = vi.magnitude * vk.magnitude * (g * sin + b * cos);
    let n = vi.magnitude * (g * cos - b * sin);
    JacobianBlock {
        h,
        n,
        k: -n * vk.magnitude,
        l: h / vk.magnitude,
    }
}

/// Partials of bus `i`'s mismatch with respect to its own voltage.
pub fn diagonal_block(ctx: &BusContext<'_>, model: Option<PowerSensitivities>) -> JacobianBlock {
    let vi = ctx.voltage.magnitude;
    let (s1, s2) = ctx.neighbors.iter().fold((0.0, 0.0), |(s1, s2), nb| {
        let (sin, cos) = (ctx.voltage.angle - nb.voltage.angle).sin_cos();
        let (g, b) = (nb.admittance.conductance, nb.admittance.susceptance);
        let vk = nb.voltage.magnitude;
        (s1 + vk * (g * sin + b * cos), s2 + vk * (g * cos - b * sin))
    });
    let gii = ctx.self_admittance.conductance;
    let bii = ctx.self_admittance.susceptance;

    let mut block = JacobianBlock {
        h: -vi * s1,
        n: s2 + 2.0 * gii * vi,
        k: vi * s2,
        l: s1 + 2.0 * bii * vi,
    };
    if let Some(s) = model {
        block.h -= s.dp_dtheta;
        block.n -= s.dp_dv;
        block.k -= s.dq_dtheta;
        block.l -= s.dq_dv;
    }
    block
}

type Triplet = (usize, usize, f64);

fn push_block(
    out: &mut Vec<Triplet>,
    rows: (Option<usize>, Option<usize>),
    cols: (Option<usize>, Option<usize>),
    block: JacobianBlock,
) {
    let entries = [
        (rows.0, cols.0, block.h),
        (rows.0, cols.1, block.n),
        (rows.1, cols.0, block.k),
        (rows.1, cols.1, block.l),
    ];
    for (row, col, value) in entries {
        if let (Some(r), Some(c)) = (row, col) {
            out.push((r, c, value));
        }
    }
}

/// Triplets for the rows owned by the bus at `index`.
fn bus_triplets(view: &NetworkView<'_>, index: usize) -> NetworkResult<Vec<Triplet>> {
    let layout = view.layout;
    let rows = (layout.angle_row(index), layout.magnitude_row(index));
    if rows == (None, None) {
        return Ok(Vec::new());
    }

    let mut scratch = Vec::new();
    let ctx = view.context(index, &mut scratch);
    let sensitivities = view.models[index].power_sensitivities(&ctx);

    let mut out = Vec::with_capacity(4 * (ctx.neighbors.len() + 1));
    push_block(&mut out, rows, rows, diagonal_block(&ctx, sensitivities));

    for (col, g, b) in view.y.row(index) {
        if col == index {
            continue;
        }
        let cols = (layout.angle_row(col), layout.magnitude_row(col));
        if cols == (None, None) {
            continue;
        }
        let block = off_diagonal_block(
            view.voltages[index],
            view.voltages[col],
            Admittance::new(g, b),
        );
        push_block(&mut out, rows, cols, block);
    }
    Ok(out)
}

/// Assemble the sparse Jacobian at the voltages held in `view`.
///
/// Row layout is fixed before the sweep, so buses are independent and can
/// be evaluated on the rayon pool.
pub fn assemble(view: &NetworkView<'_>, parallel: bool) -> NetworkResult<CsrMatrix<f64>> {
    let per_bus: Vec<Vec<Triplet>> = if parallel {
        (0..view.len())
            .into_par_iter()
            .map(|index| bus_triplets(view, index))
            .collect::<NetworkResult<_>>()?
    } else {
        (0..view.len())
            .map(|index| bus_triplets(view, index))
            .collect::<NetworkResult<_>>()?
    };

    let dim = view.layout.dim();
    let mut coo = CooMatrix::new(dim, dim);
    for (r, c, v) in per_bus.into_iter().flatten() {
        coo.push(r, c, v);
    }
    Ok(CsrMatrix::from(&coo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_models::Neighbor;

    fn injection(ctx: &BusContext<'_>, v: VoltagePolar) -> (f64, f64) {
        let s = ctx.network_injection_at(v);
        (s.re, s.im)
    }

    #[test]
    fn diagonal_matches_finite_differences() {
        let neighbors = [
            Neighbor {
                admittance: Admittance::new(-1.2, -8.0),
                voltage: VoltagePolar::new(1.01, -0.04),
            },
            Neighbor {
                admittance: Admittance::new(-0.4, -5.5),
                voltage: VoltagePolar::new(0.97, 0.08),
            },
        ];
        let v = VoltagePolar::new(1.03, 0.02);
        let ctx = BusContext::new(v, Admittance::new(1.6, 13.2), &neighbors);
        let block = diagonal_block(&ctx, None);

        let h = 1e-6;
        let (p_tp, q_tp) = injection(&ctx, VoltagePolar::new(v.magnitude, v.angle + h));
        let (p_tm, q_tm) = injection(&ctx, VoltagePolar::new(v.magnitude, v.angle - h));
        let (p_vp, q_vp) = injection(&ctx, VoltagePolar::new(v.magnitude + h, v.angle));
        let (p_vm, q_vm) = injection(&ctx, VoltagePolar::new(v.magnitude - h, v.angle));

        assert!((block.h - (p_tp - p_tm) / (2.0 * h)).abs() < 1e-6);
        assert!((block.k - (q_tp - q_tm) / (2.0 * h)).abs() < 1e-6);
        assert!((block.n - (p_vp - p_vm) / (2.0 * h)).abs() < 1e-6);
        assert!((block.l - (q_vp - q_vm) / (2.0 * h)).abs() < 1e-6);
    }

    #[test]
    fn model_sensitivities_are_subtracted() {
        let ctx = BusContext::new(VoltagePolar::FLAT, Admittance::new(0.0, 10.0), &[]);
        let plain = diagonal_block(&ctx, None);
        let sens = PowerSensitivities {
            dp_dtheta: 1.0,
            dp_dv: 2.0,
            dq_dtheta: 3.0,
            dq_dv: 4.0,
        };
        let with = diagonal_block(&ctx, Some(sens));
        assert_eq!(with.h, plain.h - 1.0);
        assert_eq!(with.n, plain.n - 2.0);
        assert_eq!(with.k, plain.k - 3.0);
        assert_eq!(with.l, plain.l - 4.0);
    }
}
