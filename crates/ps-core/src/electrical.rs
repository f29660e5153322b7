//! Per-unit electrical quantities shared by every layer.

use num_complex::Complex64;

use crate::numeric::{Real, Tolerances, nearly_equal};
use crate::{PsError, PsResult};

fn expect_pair(values: &[Real], what: &'static str) -> PsResult<(Real, Real)> {
    match values {
        [a, b] => Ok((*a, *b)),
        _ => Err(PsError::Arity {
            what,
            expected: 2,
            actual: values.len(),
        }),
    }
}

/// Bus voltage in polar form (per unit magnitude, angle in radians).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoltagePolar {
    pub magnitude: Real,
    pub angle: Real,
}

impl VoltagePolar {
    pub const FLAT: VoltagePolar = VoltagePolar {
        magnitude: 1.0,
        angle: 0.0,
    };

    pub fn new(magnitude: Real, angle: Real) -> Self {
        Self { magnitude, angle }
    }

    /// Build from a magnitude and an angle given in degrees.
    pub fn from_degrees(magnitude: Real, angle_deg: Real) -> Self {
        Self::new(magnitude, angle_deg.to_radians())
    }

    pub fn phasor(&self) -> Complex64 {
        Complex64::from_polar(self.magnitude, self.angle)
    }

    pub fn from_phasor(v: Complex64) -> Self {
        let (magnitude, angle) = v.to_polar();
        Self { magnitude, angle }
    }
}

impl TryFrom<&[Real]> for VoltagePolar {
    type Error = PsError;

    fn try_from(values: &[Real]) -> PsResult<Self> {
        let (magnitude, angle) = expect_pair(values, "voltage (magnitude, angle)")?;
        Ok(Self { magnitude, angle })
    }
}

/// Series impedance `z = r + jx`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Impedance {
    pub resistance: Real,
    pub reactance: Real,
}

impl Impedance {
    pub fn new(resistance: Real, reactance: Real) -> Self {
        Self {
            resistance,
            reactance,
        }
    }

    pub fn complex(&self) -> Complex64 {
        Complex64::new(self.resistance, self.reactance)
    }

    /// `y = conj(z) / |z|^2`.
    pub fn to_admittance(&self) -> PsResult<Admittance> {
        let z = self.complex();
        let mag_sq = z.norm_sqr();
        if mag_sq == 0.0 || !mag_sq.is_finite() {
            return Err(PsError::InvalidArg {
                what: "impedance must be finite and non-zero",
            });
        }
        let y = z.conj() / mag_sq;
        Ok(Admittance::new(y.re, y.im))
    }
}

impl TryFrom<&[Real]> for Impedance {
    type Error = PsError;

    fn try_from(values: &[Real]) -> PsResult<Self> {
        let (r, x) = expect_pair(values, "impedance (resistance, reactance)")?;
        Ok(Self::new(r, x))
    }
}

/// Admittance `y = g + jb`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Admittance {
    pub conductance: Real,
    pub susceptance: Real,
}

impl Admittance {
    pub const ZERO: Admittance = Admittance {
        conductance: 0.0,
        susceptance: 0.0,
    };

    pub fn new(conductance: Real, susceptance: Real) -> Self {
        Self {
            conductance,
            susceptance,
        }
    }

    pub fn complex(&self) -> Complex64 {
        Complex64::new(self.conductance, self.susceptance)
    }

    pub fn nearly_equal(&self, other: &Admittance, tol: Tolerances) -> bool {
        nearly_equal(self.conductance, other.conductance, tol)
            && nearly_equal(self.susceptance, other.susceptance, tol)
    }
}

impl core::ops::Add for Admittance {
    type Output = Admittance;

    fn add(self, rhs: Admittance) -> Admittance {
        Admittance::new(
            self.conductance + rhs.conductance,
            self.susceptance + rhs.susceptance,
        )
    }
}

impl core::ops::Sub for Admittance {
    type Output = Admittance;

    fn sub(self, rhs: Admittance) -> Admittance {
        Admittance::new(
            self.conductance - rhs.conductance,
            self.susceptance - rhs.susceptance,
        )
    }
}

impl TryFrom<&[Real]> for Admittance {
    type Error = PsError;

    fn try_from(values: &[Real]) -> PsResult<Self> {
        let (g, b) = expect_pair(values, "admittance (conductance, susceptance)")?;
        Ok(Self::new(g, b))
    }
}

/// Series element parameters as entered by the user.
///
/// At least one of impedance or admittance must be present.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesParameters {
    pub impedance: Option<Impedance>,
    pub admittance: Option<Admittance>,
}

impl SeriesParameters {
    pub fn from_impedance(resistance: Real, reactance: Real) -> Self {
        Self {
            impedance: Some(Impedance::new(resistance, reactance)),
            admittance: None,
        }
    }

    pub fn from_admittance(conductance: Real, susceptance: Real) -> Self {
        Self {
            impedance: None,
            admittance: Some(Admittance::new(conductance, susceptance)),
        }
    }

    /// Resolve to a single series admittance.
    ///
    /// When both forms are present and disagree beyond rounding, the
    /// admittance is kept and the disagreement is logged.
    pub fn resolve(&self) -> PsResult<Admittance> {
        match (self.impedance, self.admittance) {
            (None, None) => Err(PsError::InvalidArg {
                what: "line needs an impedance or an admittance",
            }),
            (Some(z), None) => z.to_admittance(),
            (None, Some(y)) => Ok(y),
            (Some(z), Some(y)) => {
                let from_z = z.to_admittance()?;
                if !from_z.nearly_equal(&y, Tolerances::ROUNDING) {
                    tracing::warn!(
                        given = ?y,
                        from_impedance = ?from_z,
                        "impedance and admittance disagree; keeping admittance"
                    );
                }
                Ok(y)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impedance_to_admittance() {
        let y = Impedance::new(0.0, 0.1).to_admittance().unwrap();
        assert!(y.conductance.abs() < 1e-12);
        assert!((y.susceptance + 10.0).abs() < 1e-12);

        let y = Impedance::new(3.0, 4.0).to_admittance().unwrap();
        assert!((y.conductance - 0.12).abs() < 1e-12);
        assert!((y.susceptance + 0.16).abs() < 1e-12);
    }

    #[test]
    fn zero_impedance_is_rejected() {
        assert!(Impedance::new(0.0, 0.0).to_admittance().is_err());
    }

    #[test]
    fn series_parameters_need_one_form() {
        assert!(SeriesParameters::default().resolve().is_err());
    }

    #[test]
    fn admittance_wins_on_disagreement() {
        let params = SeriesParameters {
            impedance: Some(Impedance::new(0.0, 0.1)),
            admittance: Some(Admittance::new(0.0, -5.0)),
        };
        assert_eq!(params.resolve().unwrap(), Admittance::new(0.0, -5.0));
    }

    #[test]
    fn slices_with_wrong_arity_fail() {
        let err = VoltagePolar::try_from(&[1.0][..]).unwrap_err();
        assert!(matches!(
            err,
            PsError::Arity {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(Impedance::try_from(&[0.1, 0.2, 0.3][..]).is_err());
        assert!(Admittance::try_from(&[1.0, -2.0][..]).is_ok());
    }

    #[test]
    fn phasor_round_trip() {
        let v = VoltagePolar::from_degrees(1.02, 30.0);
        let back = VoltagePolar::from_phasor(v.phasor());
        assert!((back.magnitude - 1.02).abs() < 1e-12);
        assert!((back.angle - v.angle).abs() < 1e-12);
    }
}
