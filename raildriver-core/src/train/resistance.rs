use crate::imports::*;

use super::train_state::TrainState;

/// Aerodynamic drag, the speed-squared Davis term.  The factor of 0.5
/// from the drag equation is lumped into `drag_area` as is conventional
/// for the Davis formulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Aerodynamic {
    /// Drag coefficient times frontal area
    pub drag_area: si::Area,
}

impl Aerodynamic {
    pub fn calc_res(&self, state: &TrainState) -> si::Force {
        self.drag_area * uc::rho_air() * state.speed * state.speed
    }
}

/// Rolling resistance, proportional to static weight and independent of
/// speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rolling {
    pub coeff: si::Ratio,
}

impl Rolling {
    pub fn calc_res(&self, mass: si::Mass) -> si::Force {
        self.coeff * mass * uc::ACC_GRAV
    }
}

/// Net resistive force opposing motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainRes {
    pub aero: Aerodynamic,
    pub rolling: Rolling,
}

impl TrainRes {
    pub fn calc_res(&self, state: &TrainState, mass: si::Mass) -> si::Force {
        self.aero.calc_res(state) + self.rolling.calc_res(mass)
    }
}

impl Init for TrainRes {
    fn init(&mut self) -> Result<(), Error> {
        if self.aero.drag_area < si::Area::ZERO || self.rolling.coeff < si::Ratio::ZERO {
            return Err(Error::Init("resistance terms must be non-negative".into()));
        }
        Ok(())
    }
}
impl SerdeAPI for TrainRes {}

impl Valid for TrainRes {
    fn valid() -> Self {
        Self {
            aero: Aerodynamic {
                drag_area: 10.0 * uc::M2,
            },
            rolling: Rolling {
                coeff: 0.002 * uc::R,
            },
        }
    }
}
