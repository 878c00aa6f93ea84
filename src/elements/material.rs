//! Material properties
//!
//! All values in N and mm, stresses in MPa. Compressive strains are
//! negative; `fcm` is stored as a positive strength.

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Concrete properties for the membrane and stringer laws
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Concrete {
    /// Mean compressive strength in MPa
    pub fcm: f64,
    /// Mean tensile strength in MPa
    pub fctm: f64,
    /// Initial tangent modulus in MPa
    pub eci: f64,
    /// Strain at peak compressive stress (negative)
    pub ec1: f64,
    /// Maximum aggregate diameter in mm
    pub aggregate_diameter: f64,
}

impl Concrete {
    /// Create concrete from explicit properties
    pub fn new(fcm: f64, fctm: f64, eci: f64, ec1: f64, aggregate_diameter: f64) -> Self {
        Self {
            fcm,
            fctm,
            eci,
            ec1,
            aggregate_diameter,
        }
    }

    /// Derive the remaining properties from the mean compressive strength
    pub fn from_fcm(fcm: f64, aggregate_diameter: f64) -> Self {
        let fctm = if fcm <= 50.0 {
            0.3 * fcm.powf(0.667)
        } else {
            2.12 * (1.0 + fcm / 10.0).ln()
        };
        let eci = 21500.0 * (fcm / 10.0).powf(1.0 / 3.0);
        let ec1 = -0.7 * fcm.powf(0.31) / 1000.0;

        Self::new(fcm, fctm, eci, ec1, aggregate_diameter)
    }

    /// Strain at first cracking
    pub fn cracking_strain(&self) -> f64 {
        self.fctm / self.eci
    }

    /// Reject unset or non-physical values before a solve
    pub fn validate(&self) -> FEAResult<()> {
        let positive = [
            ("fcm", self.fcm),
            ("fctm", self.fctm),
            ("Eci", self.eci),
            ("aggregate diameter", self.aggregate_diameter),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FEAError::MissingMaterialParameters(format!(
                    "concrete {name} must be positive, got {value}"
                )));
            }
        }
        if !(self.ec1.is_finite() && self.ec1 < 0.0) {
            return Err(FEAError::MissingMaterialParameters(format!(
                "concrete ec1 must be a negative strain, got {}",
                self.ec1
            )));
        }
        Ok(())
    }
}

/// Reinforcing steel properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Steel {
    /// Yield strength in MPa
    pub fy: f64,
    /// Modulus of elasticity in MPa
    pub es: f64,
}

impl Steel {
    /// Create steel from yield strength and modulus
    pub fn new(fy: f64, es: f64) -> Self {
        Self { fy, es }
    }

    /// B500 reinforcing bars
    pub fn b500() -> Self {
        Self::new(500.0, 200_000.0)
    }

    /// Yield strain
    pub fn yield_strain(&self) -> f64 {
        self.fy / self.es
    }

    /// Elastic-perfectly-plastic stress for a strain
    pub fn stress(&self, strain: f64) -> f64 {
        (self.es * strain).clamp(-self.fy, self.fy)
    }

    pub fn validate(&self) -> FEAResult<()> {
        for (name, value) in [("fy", self.fy), ("Es", self.es)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(FEAError::MissingMaterialParameters(format!(
                    "steel {name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Steel {
    fn default() -> Self {
        Self::b500()
    }
}
