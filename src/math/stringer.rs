//! Nonlinear axial law and flexibility-based stiffness of stringers
//!
//! A stringer carries a linearly varying normal force between its end
//! nodes. Its stiffness follows from integrating the secant compliance
//! ε(N)/N of the two halves and inverting the 2x2 flexibility matrix.

use crate::analysis::StringerLaw;
use crate::elements::{Concrete, Steel};
use crate::error::{FEAError, FEAResult};
use crate::math::{Mat2, Mat23, Mat3};

/// Concrete and steel areas of a stringer cross-section in mm²
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxialSection {
    pub concrete_area: f64,
    pub steel_area: f64,
}

impl AxialSection {
    pub fn new(concrete_area: f64, steel_area: f64) -> Self {
        Self {
            concrete_area,
            steel_area,
        }
    }

    /// Reinforcement ratio ρs = As / Ac
    pub fn ratio(&self) -> f64 {
        self.steel_area / self.concrete_area
    }

    /// Stiffness ratio ξ = ρs·Es/Eci
    pub fn stiffness_ratio(&self, concrete: &Concrete, steel: &Steel) -> f64 {
        self.ratio() * steel.es / concrete.eci
    }

    /// Cracking force Ncr = fctm·Ac·(1 + ξ)
    pub fn cracking_force(&self, concrete: &Concrete, steel: &Steel) -> f64 {
        concrete.fctm * self.concrete_area * (1.0 + self.stiffness_ratio(concrete, steel))
    }

    /// Uncracked axial stiffness Eci·Ac·(1 + ξ)
    pub fn uncracked_stiffness(&self, concrete: &Concrete, steel: &Steel) -> f64 {
        concrete.eci * self.concrete_area * (1.0 + self.stiffness_ratio(concrete, steel))
    }

    fn validate(&self) -> FEAResult<()> {
        if !(self.concrete_area.is_finite() && self.concrete_area > 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "stringer concrete area must be positive, got {}",
                self.concrete_area
            )));
        }
        if !(self.steel_area.is_finite() && self.steel_area >= 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "stringer steel area must be non-negative, got {}",
                self.steel_area
            )));
        }
        Ok(())
    }
}

/// Axial stress-strain law of a reinforced concrete stringer.
///
/// Implementors supply the cracked tension branch and the strain scale of
/// the compressive parabola; the rest of the law is shared.
pub trait AxialLaw {
    /// Strain at peak compressive concrete stress (negative)
    fn compression_peak_strain(&self, concrete: &Concrete) -> f64;

    /// Strain for a tensile force above the cracking force
    fn cracked_strain(
        &self,
        force: f64,
        section: &AxialSection,
        concrete: &Concrete,
        steel: &Steel,
    ) -> f64;

    /// Strain for an axial force, positive in tension
    fn axial_strain(
        &self,
        force: f64,
        section: &AxialSection,
        concrete: &Concrete,
        steel: &Steel,
    ) -> FEAResult<f64> {
        section.validate()?;
        if force == 0.0 {
            return Ok(0.0);
        }
        if force > 0.0 {
            tension_strain(self, force, section, concrete, steel)
        } else {
            compression_strain(self, force, section, concrete, steel)
        }
    }
}

/// Tension stiffening with 0.6·σsr; compression peaks at ec1
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLaw;

/// Hyperbolic tension stiffening; compression peaks at -2·fcm/Eci
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicLaw;

impl AxialLaw for DefaultLaw {
    fn compression_peak_strain(&self, concrete: &Concrete) -> f64 {
        concrete.ec1
    }

    fn cracked_strain(
        &self,
        force: f64,
        section: &AxialSection,
        concrete: &Concrete,
        steel: &Steel,
    ) -> f64 {
        let rho = section.ratio();
        let xi = section.stiffness_ratio(concrete, steel);
        let sigma_sr = concrete.fctm / rho * (1.0 + xi);
        (force / section.steel_area - 0.6 * sigma_sr) / steel.es
    }
}

impl AxialLaw for ClassicLaw {
    fn compression_peak_strain(&self, concrete: &Concrete) -> f64 {
        -2.0 * concrete.fcm / concrete.eci
    }

    fn cracked_strain(
        &self,
        force: f64,
        section: &AxialSection,
        concrete: &Concrete,
        steel: &Steel,
    ) -> f64 {
        let xi = section.stiffness_ratio(concrete, steel);
        let nr = section.cracking_force(concrete, steel) / (1.0 + xi).sqrt();
        (force * force - nr * nr) / (steel.es * section.steel_area * force)
    }
}

impl StringerLaw {
    /// The law implementing this variant
    pub fn law(&self) -> &'static dyn AxialLaw {
        match self {
            StringerLaw::Default => &DefaultLaw,
            StringerLaw::Classic => &ClassicLaw,
        }
    }
}

fn tension_strain<L: AxialLaw + ?Sized>(
    law: &L,
    force: f64,
    section: &AxialSection,
    concrete: &Concrete,
    steel: &Steel,
) -> FEAResult<f64> {
    let ncr = section.cracking_force(concrete, steel);
    if force <= ncr {
        return Ok(force / section.uncracked_stiffness(concrete, steel));
    }
    let capacity = section.steel_area * steel.fy;
    if force > capacity {
        return Err(FEAError::CapacityExceeded { force, capacity });
    }
    Ok(law.cracked_strain(force, section, concrete, steel))
}

/// Compression: parabolic concrete N_c = -fcm·Ac·(2η - η²), η = ε/ε0, plus
/// elastic-plastic steel. Solved in closed form on the ascending branch.
fn compression_strain<L: AxialLaw + ?Sized>(
    law: &L,
    force: f64,
    section: &AxialSection,
    concrete: &Concrete,
    steel: &Steel,
) -> FEAResult<f64> {
    let eps0 = law.compression_peak_strain(concrete);
    let fcm_ac = concrete.fcm * section.concrete_area;
    let ey = steel.yield_strain();
    let a = fcm_ac / (eps0 * eps0);
    let b_concrete = -2.0 * fcm_ac / eps0;

    let concrete_force = |strain: f64| {
        let eta = strain / eps0;
        -fcm_ac * (2.0 * eta - eta * eta)
    };

    if ey < eps0.abs() {
        // steel yields before the concrete reaches its peak
        let yield_force = concrete_force(-ey) - section.steel_area * steel.fy;
        if force >= yield_force {
            return solve_branch(a, b_concrete + section.steel_area * steel.es, -force, force, yield_force);
        }
        let capacity = -fcm_ac - section.steel_area * steel.fy;
        if force < capacity {
            return Err(FEAError::CapacityExceeded { force, capacity });
        }
        solve_branch(a, b_concrete, -force - section.steel_area * steel.fy, force, capacity)
    } else {
        let capacity = -fcm_ac + section.steel_area * steel.es * eps0;
        if force < capacity {
            return Err(FEAError::CapacityExceeded { force, capacity });
        }
        solve_branch(a, b_concrete + section.steel_area * steel.es, -force, force, capacity)
    }
}

/// Smaller-magnitude root of a·ε² + b·ε + c = 0 with a, b > 0 and c ≥ 0
fn solve_branch(a: f64, b: f64, c: f64, force: f64, capacity: f64) -> FEAResult<f64> {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Err(FEAError::CapacityExceeded { force, capacity });
    }
    Ok(2.0 * c / (-b - discriminant.sqrt()))
}

/// Static equilibrium matrix mapping the three nodal forces to the two
/// segment forces
pub fn equilibrium_matrix() -> Mat23 {
    Mat23::new(-1.0, 1.0, 0.0, 0.0, -1.0, 1.0)
}

/// Flexibility matrix from compliances sampled at N1, ⅔N1+⅓N3, ⅓N1+⅔N3
/// and N3
pub fn flexibility_from_compliance(compliance: [f64; 4], length: f64) -> Mat2 {
    let [c1, c2, c3, c4] = compliance;
    let f11 = length / 24.0 * (3.0 * c1 + 4.0 * c2 + c3);
    let f12 = length / 12.0 * (c2 + c3);
    let f22 = length / 24.0 * (c2 + 4.0 * c3 + 3.0 * c4);
    Mat2::new(f11, f12, f12, f22)
}

/// Secant flexibility matrix of a stringer with end forces N1 and N3.
///
/// A sample point with zero force takes the uncracked compliance, the
/// limit of ε(N)/N as N approaches zero. With all four forces zero the
/// matrix is zero and the stiffness cannot be derived.
pub fn flexibility_matrix(
    n1: f64,
    n3: f64,
    length: f64,
    law: &dyn AxialLaw,
    section: &AxialSection,
    concrete: &Concrete,
    steel: &Steel,
) -> FEAResult<Mat2> {
    let forces = [
        n1,
        2.0 / 3.0 * n1 + 1.0 / 3.0 * n3,
        1.0 / 3.0 * n1 + 2.0 / 3.0 * n3,
        n3,
    ];
    let mut compliance = [0.0; 4];
    if forces.iter().all(|&force| force == 0.0) {
        return Ok(flexibility_from_compliance(compliance, length));
    }
    section.validate()?;
    let uncracked = 1.0 / section.uncracked_stiffness(concrete, steel);
    for (sample, &force) in compliance.iter_mut().zip(forces.iter()) {
        *sample = if force == 0.0 {
            uncracked
        } else {
            law.axial_strain(force, section, concrete, steel)? / force
        };
    }
    Ok(flexibility_from_compliance(compliance, length))
}

/// 3x3 stiffness Kl = Bᵗ·F⁻¹·B from a flexibility matrix
pub fn stiffness_from_flexibility(flexibility: &Mat2) -> FEAResult<Mat3> {
    let det = flexibility.determinant();
    let scale = flexibility.norm_squared();
    if !det.is_finite() || det.abs() <= f64::EPSILON * scale {
        log::warn!("singular stringer flexibility matrix: {flexibility:?}");
        return Err(FEAError::SingularFlexibility(format!(
            "determinant {det:e} of flexibility matrix {:?}",
            flexibility.as_slice()
        )));
    }
    let reduced = flexibility
        .try_inverse()
        .ok_or_else(|| FEAError::SingularFlexibility("flexibility matrix not invertible".to_string()))?;
    let b = equilibrium_matrix();
    Ok(b.transpose() * reduced * b)
}

/// Secant stiffness of a 3-node stringer for end forces N1 and N3
pub fn stringer_local_stiffness(
    n1: f64,
    n3: f64,
    length: f64,
    law: StringerLaw,
    section: &AxialSection,
    concrete: &Concrete,
    steel: &Steel,
) -> FEAResult<Mat3> {
    let flexibility = flexibility_matrix(n1, n3, length, law.law(), section, concrete, steel)?;
    stiffness_from_flexibility(&flexibility)
}

/// Uncracked stiffness of a 3-node stringer, used before any force is known
pub fn stringer_elastic_stiffness(
    length: f64,
    section: &AxialSection,
    concrete: &Concrete,
    steel: &Steel,
) -> FEAResult<Mat3> {
    section.validate()?;
    let compliance = 1.0 / section.uncracked_stiffness(concrete, steel);
    stiffness_from_flexibility(&flexibility_from_compliance([compliance; 4], length))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::SymmetricEigen;

    fn materials() -> (Concrete, Steel) {
        (Concrete::from_fcm(30.0, 16.0), Steel::b500())
    }

    fn section() -> AxialSection {
        // 200 x 200 mm with 4 bars of 12 mm
        AxialSection::new(40_000.0, 4.0 * std::f64::consts::PI * 36.0)
    }

    #[test]
    fn test_zero_force_zero_strain() {
        let (c, s) = materials();
        for law in [StringerLaw::Default, StringerLaw::Classic] {
            assert_eq!(law.law().axial_strain(0.0, &section(), &c, &s).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_uncracked_tension_linear() {
        let (c, s) = materials();
        let sec = section();
        let n = 0.5 * sec.cracking_force(&c, &s);
        let expected = n / (c.eci * sec.concrete_area * (1.0 + sec.stiffness_ratio(&c, &s)));
        for law in [StringerLaw::Default, StringerLaw::Classic] {
            let e = law.law().axial_strain(n, &sec, &c, &s).unwrap();
            assert_relative_eq!(e, expected, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_classic_continuous_at_cracking() {
        let (c, s) = materials();
        let sec = section();
        let ncr = sec.cracking_force(&c, &s);
        let uncracked = ncr / sec.uncracked_stiffness(&c, &s);
        let cracked = ClassicLaw.cracked_strain(ncr, &sec, &c, &s);
        assert_relative_eq!(cracked, uncracked, max_relative = 1e-9);
        assert_relative_eq!(uncracked, c.cracking_strain(), max_relative = 1e-9);
    }

    #[test]
    fn test_default_cracked_branch() {
        let (c, s) = materials();
        let sec = section();
        let n = 150_000.0;
        let rho = sec.ratio();
        let sigma_sr = c.fctm / rho * (1.0 + sec.stiffness_ratio(&c, &s));
        let expected = (n / sec.steel_area - 0.6 * sigma_sr) / s.es;
        let e = DefaultLaw.axial_strain(n, &sec, &c, &s).unwrap();
        assert_relative_eq!(e, expected, epsilon = 1e-15);
        assert!(e > c.cracking_strain());
    }

    #[test]
    fn test_tension_beyond_yield_rejected() {
        let (c, s) = materials();
        let sec = section();
        let n = sec.steel_area * s.fy * 1.01;
        assert!(matches!(
            DefaultLaw.axial_strain(n, &sec, &c, &s),
            Err(FEAError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_compression_satisfies_equilibrium() {
        let (c, s) = materials();
        let sec = section();
        for law in [StringerLaw::Default, StringerLaw::Classic] {
            let eps0 = law.law().compression_peak_strain(&c);
            for n in [-10_000.0, -400_000.0, -1_000_000.0] {
                let e = law.law().axial_strain(n, &sec, &c, &s).unwrap();
                assert!(e < 0.0 && e >= eps0);
                let eta = e / eps0;
                let resisted =
                    -c.fcm * sec.concrete_area * (2.0 * eta - eta * eta) + sec.steel_area * s.stress(e);
                assert_relative_eq!(resisted, n, max_relative = 1e-8);
            }
        }
    }

    #[test]
    fn test_compression_beyond_capacity_rejected() {
        let (c, s) = materials();
        let sec = section();
        let n = -(c.fcm * sec.concrete_area + s.fy * sec.steel_area) * 1.1;
        assert!(matches!(
            DefaultLaw.axial_strain(n, &sec, &c, &s),
            Err(FEAError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_small_compression_matches_tension_slope() {
        let (c, s) = materials();
        let sec = section();
        let n = 1.0;
        let tension = ClassicLaw.axial_strain(n, &sec, &c, &s).unwrap();
        let compression = ClassicLaw.axial_strain(-n, &sec, &c, &s).unwrap();
        assert_relative_eq!(compression, -tension, max_relative = 1e-6);
    }

    #[test]
    fn test_zero_forces_singular() {
        let (c, s) = materials();
        let result = stringer_local_stiffness(0.0, 0.0, 1000.0, StringerLaw::Default, &section(), &c, &s);
        assert!(matches!(result, Err(FEAError::SingularFlexibility(_))));
    }

    #[test]
    fn test_zero_end_force_matches_limit() {
        let (c, s) = materials();
        let sec = section();
        let length = 1000.0;
        for law in [StringerLaw::Default, StringerLaw::Classic] {
            // below and above the cracking force at the loaded end
            for n3 in [1000.0, 150_000.0] {
                let at_zero = stringer_local_stiffness(0.0, n3, length, law, &sec, &c, &s).unwrap();
                let near_zero = stringer_local_stiffness(1e-6, n3, length, law, &sec, &c, &s).unwrap();
                let mirrored = stringer_local_stiffness(n3, 0.0, length, law, &sec, &c, &s).unwrap();
                let scale = near_zero.abs().max();
                for i in 0..3 {
                    for j in 0..3 {
                        assert_relative_eq!(at_zero[(i, j)], near_zero[(i, j)], epsilon = 1e-6 * scale);
                        assert_relative_eq!(mirrored[(i, j)], at_zero[(2 - i, 2 - j)], epsilon = 1e-9 * scale);
                    }
                }
            }

            // uncracked everywhere, so no jump away from the elastic stiffness
            let k = stringer_local_stiffness(0.0, 1000.0, length, law, &sec, &c, &s).unwrap();
            let elastic = stringer_elastic_stiffness(length, &sec, &c, &s).unwrap();
            for i in 0..3 {
                for j in 0..3 {
                    assert_relative_eq!(k[(i, j)], elastic[(i, j)], max_relative = 1e-9, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_uniform_flexibility_entries() {
        let f = flexibility_from_compliance([2.0; 4], 12.0);
        assert_relative_eq!(f[(0, 0)], 8.0);
        assert_relative_eq!(f[(0, 1)], 4.0);
        assert_relative_eq!(f[(1, 0)], 4.0);
        assert_relative_eq!(f[(1, 1)], 8.0);
    }

    #[test]
    fn test_elastic_stiffness_closed_form() {
        let (c, s) = materials();
        let sec = section();
        let length = 2000.0;
        let k = stringer_elastic_stiffness(length, &sec, &c, &s).unwrap();
        let ea = sec.uncracked_stiffness(&c, &s);
        let expected = Mat3::new(2.0, -3.0, 1.0, -3.0, 6.0, -3.0, 1.0, -3.0, 2.0) * (2.0 * ea / length);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(k[(i, j)], expected[(i, j)], max_relative = 1e-9, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_stiffness_symmetric_positive_semidefinite() {
        let (c, s) = materials();
        let sec = section();
        for law in [StringerLaw::Default, StringerLaw::Classic] {
            for (n1, n3) in [(50_000.0, 120_000.0), (-300_000.0, -100_000.0), (-50_000.0, 80_000.0)] {
                let k = stringer_local_stiffness(n1, n3, 1500.0, law, &sec, &c, &s).unwrap();
                let scale = k.abs().max();
                for i in 0..3 {
                    for j in 0..3 {
                        assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-9 * scale);
                    }
                    // rigid-body translation carries no force
                    let row_sum: f64 = (0..3).map(|j| k[(i, j)]).sum();
                    assert!(row_sum.abs() < 1e-9 * scale);
                }
                let eigen = SymmetricEigen::new(k);
                for value in eigen.eigenvalues.iter() {
                    assert!(*value >= -1e-9 * scale, "{law:?} ({n1}, {n3}): {value}");
                }
            }
        }
    }
}
