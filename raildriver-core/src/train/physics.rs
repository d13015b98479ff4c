use crate::imports::*;

use crate::control::{BrakeIntent, ControlInputs, ThrottleIntent};
use super::resistance::TrainRes;
use super::train_state::TrainState;

/// Fixed physical characteristics of the train plus control ramp rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    pub mass: si::Mass,
    /// Maximum tractive effort at full throttle
    pub force_max: si::Force,
    /// Adhesion derating applied to tractive effort
    pub traction_coeff: si::Ratio,
    /// Brake force at full application
    pub brake_force_max: si::Force,
    pub speed_max: si::Velocity,
    /// Bounded correction rate applied when integrated speed exceeds the
    /// enforced limit
    pub limit_bleed_rate: si::Acceleration,
    /// Full-scale throttle travel per second of held input
    pub throttle_ramp: si::Frequency,
    /// Full-scale brake travel per second of held input
    pub brake_ramp: si::Frequency,
    /// Brake travel rate while the emergency latch is engaged
    pub brake_ramp_emergency: si::Frequency,
    pub capacity: u32,
    pub passengers_init: u32,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            mass: 400.0 * uc::TONNE,
            force_max: 300.0 * uc::KN,
            traction_coeff: 1.0 * uc::R,
            brake_force_max: 480.0 * uc::KN,
            speed_max: 160.0 * uc::KPH,
            limit_bleed_rate: 220.0 * uc::KPH_PER_S,
            throttle_ramp: 0.5 * uc::HZ,
            brake_ramp: 0.8 * uc::HZ,
            brake_ramp_emergency: 2.5 * uc::HZ,
            capacity: 900,
            passengers_init: 120,
        }
    }
}

impl Init for TrainParams {
    fn init(&mut self) -> Result<(), Error> {
        if self.mass <= si::Mass::ZERO
            || self.force_max <= si::Force::ZERO
            || self.brake_force_max <= si::Force::ZERO
            || self.speed_max <= si::Velocity::ZERO
            || self.limit_bleed_rate <= si::Acceleration::ZERO
        {
            return Err(Error::Init(
                "train mass, forces, speed ceiling, and bleed rate must be positive".into(),
            ));
        }
        if self.traction_coeff <= si::Ratio::ZERO || self.traction_coeff > 1.0 * uc::R {
            return Err(Error::Init("traction coefficient must lie in (0, 1]".into()));
        }
        if self.passengers_init > self.capacity {
            return Err(Error::Init(format!(
                "initial passengers {} exceed capacity {}",
                self.passengers_init, self.capacity
            )));
        }
        Ok(())
    }
}
impl SerdeAPI for TrainParams {}

impl Valid for TrainParams {
    fn valid() -> Self {
        Self::default()
    }
}

/// Integrates operator intents into throttle/brake lever positions.
///
/// While the emergency latch is engaged the brake rises at the emergency
/// ramp rate toward full application regardless of the handle, and power
/// is cut; the force constant itself is unchanged.
pub fn apply_controls(
    state: &mut TrainState,
    inputs: &ControlInputs,
    params: &TrainParams,
    dt: si::Time,
) {
    let full = 1.0 * uc::R;

    match inputs.throttle {
        ThrottleIntent::Increase => state.throttle += params.throttle_ramp * dt,
        ThrottleIntent::Decrease => state.throttle -= params.throttle_ramp * dt,
        ThrottleIntent::Hold => {}
        ThrottleIntent::Axis(v) => state.throttle += v * (params.throttle_ramp * dt),
    }
    state.throttle = state.throttle.max(si::Ratio::ZERO).min(full);

    if let Some(engage) = inputs.emergency_brake {
        state.emergency_brake = engage;
    }
    if state.emergency_brake {
        state.brake = (state.brake + params.brake_ramp_emergency * dt).min(full);
        state.throttle = si::Ratio::ZERO;
    } else {
        match inputs.brake {
            BrakeIntent::Held => state.brake += params.brake_ramp * dt,
            BrakeIntent::Released => state.brake -= params.brake_ramp * dt,
            BrakeIntent::Axis(v) => {
                let target = v * uc::R;
                let step = params.brake_ramp * dt;
                state.brake = if state.brake < target {
                    (state.brake + step).min(target)
                } else {
                    (state.brake - step).max(target)
                };
            }
        }
        state.brake = state.brake.max(si::Ratio::ZERO).min(full);
    }
}

/// Advances speed and position by one step under `enforced_limit`.
///
/// Position uses the trapezoidal rule on the endpoint speeds.  Speed in
/// excess of the limit bleeds down at `limit_bleed_rate` rather than
/// snapping, and the corrected value never undershoots the limit (nor
/// zero) within the step.  Returns whether the limiter was active.
pub fn advance(
    state: &mut TrainState,
    res: &TrainRes,
    params: &TrainParams,
    enforced_limit: si::Velocity,
    route_len: si::Length,
    dt: si::Time,
) -> bool {
    if dt <= si::Time::ZERO {
        return false;
    }

    let f_trac = state.throttle * params.force_max * params.traction_coeff;
    let f_brake = state.brake * params.brake_force_max;
    let f_res = res.calc_res(state, params.mass);
    let accel = (f_trac - f_brake - f_res) / params.mass;

    let speed_old = state.speed;
    let mut speed_new = (speed_old + accel * dt).max(si::Velocity::ZERO);

    let mut limited = false;
    if speed_new > enforced_limit {
        let bled = (speed_new - params.limit_bleed_rate * dt).max(enforced_limit);
        if bled < speed_new {
            limited = true;
            speed_new = bled;
        }
    }
    speed_new = speed_new.min(params.speed_max).max(si::Velocity::ZERO);

    state.accel = (speed_new - speed_old) / dt;
    state.offset = (state.offset + 0.5 * (speed_old + speed_new) * dt)
        .max(si::Length::ZERO)
        .min(route_len);
    state.speed = speed_new;
    limited
}
