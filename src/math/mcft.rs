//! Modified Compression Field Theory membrane solver
//!
//! Fixed-point iteration on the combined secant stiffness of a cracked
//! reinforced concrete membrane:
//!
//! 1. ε = D⁻¹·σ with the current stiffness
//! 2. principal strains and angle from Mohr's circle
//! 3. average reinforcement and concrete stresses, crack check when cracked
//! 4. new concrete and steel secant matrices, D = Dc + Ds
//!
//! The iteration stops when no entry of D changes by more than the
//! tolerance. Units are N, mm and MPa.

use std::f64::consts::FRAC_PI_2;

use crate::analysis::SolverOptions;
use crate::elements::{CrackState, Dominance, Membrane};
use crate::math::{
    direction_cosines, max_abs_diff, principal_direction, principal_strains, strain_angle,
    strain_transformation, tangent, Mat3, Vec3,
};

/// Strain magnitude at which a membrane is considered to have failed
pub const MAX_STRAIN: f64 = 0.1;

/// Relative slack when comparing a crack stress against the yield strength
const YIELD_SLACK: f64 = 1e-9;

/// Stresses and stiffness of one iteration
#[derive(Debug, Clone)]
struct IterationState {
    strain: Vec3,
    e1: f64,
    e2: f64,
    theta: f64,
    fc1: f64,
    fc2: f64,
    fsx: f64,
    fsy: f64,
    crack: Option<CrackState>,
    concrete_stiffness: Mat3,
    steel_stiffness: Mat3,
}

impl IterationState {
    fn stiffness(&self) -> Mat3 {
        self.concrete_stiffness + self.steel_stiffness
    }
}

/// Solve one membrane for an applied stress [σx, σy, τxy].
///
/// Starts from the membrane's current combined stiffness and returns the
/// converged membrane. Non-convergence is reported through `stop` and
/// `stop_message`, never as a panic; callers must check the result
/// (see [`Membrane::check`]).
pub fn solve(mut membrane: Membrane, stress: Vec3, load_step: usize, options: &SolverOptions) -> Membrane {
    membrane.stress = stress;
    membrane.stop = false;
    membrane.stop_message = None;

    for iteration in 1..=options.max_iterations {
        let Some(flexibility) = membrane.stiffness.try_inverse() else {
            membrane.halt(iteration, "secant stiffness matrix is singular".to_string());
            return membrane;
        };
        let strain = flexibility * stress;
        if strain.iter().any(|e| !e.is_finite() || e.abs() > MAX_STRAIN) {
            membrane.halt(
                iteration,
                format!("strain {strain:?} exceeds {MAX_STRAIN}, applied stress cannot be carried"),
            );
            return membrane;
        }

        let state = evaluate(&membrane, strain);
        let new_stiffness = state.stiffness();
        let change = max_abs_diff(&new_stiffness, &membrane.stiffness);
        if options.log {
            log::trace!("iteration {iteration}: max stiffness change {change:e}");
        }
        apply(&mut membrane, state);

        if change < options.tolerance {
            membrane.iterations = iteration;
            record_limit_states(&mut membrane, load_step);
            log::debug!(
                "membrane converged in {iteration} iterations: e1 = {:e}, e2 = {:e}, theta = {:.4}",
                membrane.e1,
                membrane.e2,
                membrane.theta
            );
            return membrane;
        }
    }

    let iterations = options.max_iterations;
    membrane.halt(
        iterations,
        format!(
            "no convergence within {iterations} iterations for stress [{}, {}, {}]",
            stress[0], stress[1], stress[2]
        ),
    );
    membrane
}

fn apply(membrane: &mut Membrane, state: IterationState) {
    membrane.strain = state.strain;
    membrane.e1 = state.e1;
    membrane.e2 = state.e2;
    membrane.theta = state.theta;
    membrane.theta_x = state.theta;
    membrane.theta_y = state.theta - FRAC_PI_2;
    membrane.fc1 = state.fc1;
    membrane.fc2 = state.fc2;
    membrane.fsx = state.fsx;
    membrane.fsy = state.fsy;
    membrane.crack = state.crack;
    membrane.stiffness = state.stiffness();
    membrane.concrete_stiffness = state.concrete_stiffness;
    membrane.steel_stiffness = state.steel_stiffness;
}

fn record_limit_states(membrane: &mut Membrane, load_step: usize) {
    let concrete = membrane.concrete;
    let steel = membrane.steel;
    let marks = &mut membrane.limit_states;

    if membrane.e1 >= concrete.cracking_strain() && marks.crack.record(load_step) {
        log::info!("cracking at load step {load_step}");
    }
    if membrane.e2 <= concrete.ec1 && marks.peak.record(load_step) {
        log::info!("peak compressive strain at load step {load_step}");
    }
    if let Some(crack) = membrane.crack {
        let limit = steel.fy * (1.0 - YIELD_SLACK);
        if membrane.rho_x > 0.0 && crack.fsx_crack >= limit && marks.yield_x.record(load_step) {
            log::info!("x reinforcement yields at a crack at load step {load_step}");
        }
        if membrane.rho_y > 0.0 && crack.fsy_crack >= limit && marks.yield_y.record(load_step) {
            log::info!("y reinforcement yields at a crack at load step {load_step}");
        }
    }
}

/// Stresses and secant stiffness for a strain estimate
fn evaluate(membrane: &Membrane, strain: Vec3) -> IterationState {
    let concrete = &membrane.concrete;
    let steel = &membrane.steel;
    let (ex, ey, gxy) = (strain[0], strain[1], strain[2]);

    let (e1, e2) = principal_strains(ex, ey, gxy);
    let theta = strain_angle(ex, ey, gxy);

    let fsx = steel.stress(ex);
    let fsy = steel.stress(ey);

    let fc2 = compressive_stress(membrane, e1, e2);
    let (fc1, crack) = if e1 <= concrete.cracking_strain() {
        (e1 * concrete.eci, None)
    } else {
        let crack = crack_check(membrane, e1, theta, fsx, fsy);
        (crack.f1, Some(crack))
    };

    let ec1 = secant(fc1, e1, concrete.eci);
    let ec2 = secant(fc2, e2, concrete.eci);
    let gc = if ec1 + ec2 == 0.0 {
        0.0
    } else {
        ec1 * ec2 / (ec1 + ec2)
    };
    let t = strain_transformation(principal_direction(ex, ey, gxy));
    let principal = Mat3::from_diagonal(&Vec3::new(ec1, ec2, gc));
    let concrete_stiffness = t.transpose() * principal * t;

    let esx = secant(fsx, ex, steel.es).min(steel.es);
    let esy = secant(fsy, ey, steel.es).min(steel.es);
    let steel_stiffness =
        Mat3::from_diagonal(&Vec3::new(membrane.rho_x * esx, membrane.rho_y * esy, 0.0));

    IterationState {
        strain,
        e1,
        e2,
        theta,
        fc1,
        fc2,
        fsx,
        fsy,
        crack,
        concrete_stiffness,
        steel_stiffness,
    }
}

/// stress / strain when both are nonzero, otherwise the initial modulus
fn secant(stress: f64, strain: f64, initial: f64) -> f64 {
    if stress != 0.0 && strain != 0.0 {
        stress / strain
    } else {
        initial
    }
}

/// Average tensile stress of cracked concrete
fn tension_softening(fctm: f64, strain: f64) -> f64 {
    fctm / (1.0 + (500.0 * strain).sqrt())
}

/// Softened parabolic compressive stress (negative)
fn compressive_stress(membrane: &Membrane, e1: f64, e2: f64) -> f64 {
    let concrete = &membrane.concrete;
    let eps0 = concrete.ec1;

    if e2 >= 0.0 {
        // biaxial tension: the minor principal direction follows the tensile law
        return if e2 <= concrete.cracking_strain() {
            e2 * concrete.eci
        } else {
            tension_softening(concrete.fctm, e2)
        };
    }

    let f2max = if e1 > 0.0 {
        (-concrete.fcm / (0.8 - 0.34 * e1 / eps0)).max(-concrete.fcm)
    } else {
        -concrete.fcm
    };
    let n = (e2 / eps0).min(2.0);
    f2max * (2.0 * n - n * n)
}

/// v / tanθ where a zero numerator stays zero at θ = 0
fn over_tan(value: f64, tan: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value / tan
    }
}

/// Governing tensile stress of cracked concrete and the reinforcement
/// stresses at the crack.
///
/// f1 is the smallest of the average softening stress (f1a), the biaxial
/// yield limit (f1b) and the two single-direction limits with interface
/// shear (f1c, f1d). Ties keep the earlier candidate.
pub fn crack_check(membrane: &Membrane, e1: f64, theta: f64, fsx: f64, fsy: f64) -> CrackState {
    let concrete = &membrane.concrete;
    let fy = membrane.steel.fy;
    let (rho_x, rho_y) = (membrane.rho_x, membrane.rho_y);

    let f1a = tension_softening(concrete.fctm, e1);

    let (cos, sin) = direction_cosines(theta);
    let inverse_spacing = sin / membrane.sm_x + cos / membrane.sm_y;
    let spacing = if inverse_spacing > 0.0 {
        1.0 / inverse_spacing
    } else {
        f64::INFINITY
    };
    let width = spacing * e1;

    let f1cx = rho_x * (fy - fsx);
    let f1cy = rho_y * (fy - fsy);

    let vci_a = concrete.fcm.abs().sqrt()
        / (0.31 + 24.0 * width / (concrete.aggregate_diameter + 16.0));
    let vci_b = (f1cx - f1cy).abs() * sin * cos;
    let vci_max = vci_a.min(vci_b);

    let tan = tangent(theta);
    let f1b = f1cx * cos * cos + f1cy * sin * sin;
    let f1c = f1cx + over_tan(vci_max, tan);
    let f1d = f1cy + vci_max * tan;

    let mut governing = 0;
    let candidates = [f1a, f1b, f1c, f1d];
    for (i, &f) in candidates.iter().enumerate() {
        if f < candidates[governing] {
            governing = i;
        }
    }
    let f1 = candidates[governing].max(0.0);

    let dominance = match governing {
        2 => Dominance::X,
        3 => Dominance::Y,
        _ if f1cx <= f1cy => Dominance::X,
        _ => Dominance::Y,
    };

    // interface shear relieves the dominant direction and loads the other
    let (vci, relief_x, relief_y) = match dominance {
        Dominance::X => {
            let vci = ((f1 - f1cx) * tan).clamp(0.0, vci_max);
            (vci, -over_tan(vci, tan), vci * tan)
        }
        Dominance::Y => {
            let demand = if tan == 0.0 { 0.0 } else { (f1 - f1cy) / tan };
            let vci = demand.clamp(0.0, vci_max);
            (vci, over_tan(vci, tan), -vci * tan)
        }
    };
    let fsx_crack = if rho_x > 0.0 {
        fsx + (f1 + relief_x) / rho_x
    } else {
        fsx
    };
    let fsy_crack = if rho_y > 0.0 {
        fsy + (f1 + relief_y) / rho_y
    } else {
        fsy
    };

    CrackState {
        f1a,
        f1b,
        f1c,
        f1d,
        f1,
        spacing,
        width,
        vci_max,
        vci,
        dominance,
        fsx_crack,
        fsy_crack,
    }
}
