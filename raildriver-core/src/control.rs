use crate::imports::*;

/// Throttle lever intent for one tick.  `Axis` generalizes the discrete
/// intents: the value in [-1, 1] scales the ramp rate (negative reduces).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ThrottleIntent {
    Increase,
    Decrease,
    #[default]
    Hold,
    Axis(f64),
}

/// Brake handle intent.  `Held` ramps the brake toward full application,
/// `Released` ramps it off; `Axis` names a target level in [0, 1] that the
/// brake ramps toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum BrakeIntent {
    Held,
    #[default]
    Released,
    Axis(f64),
}

/// Operator inputs polled once per tick by the driver.  This is the only
/// writable surface exposed to external collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInputs {
    pub throttle: ThrottleIntent,
    pub brake: BrakeIntent,
    /// Edge-triggered; forwarded to the audio collaborator, no physics
    /// effect.
    pub horn: bool,
    /// `Some(true)` engages the operator emergency-brake latch,
    /// `Some(false)` releases it.
    pub emergency_brake: Option<bool>,
    pub pause_toggle: bool,
    pub restart: bool,
}

impl ControlInputs {
    /// Clamps analog axes into their legal ranges.  Out-of-range values
    /// are corrected silently (recorded at debug level), never fatal;
    /// non-finite values are zeroed.
    pub fn sanitized(mut self) -> Self {
        if let ThrottleIntent::Axis(v) = &mut self.throttle {
            let clamped = if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
            if clamped != *v {
                log::debug!(
                    "{}",
                    Error::ControlInputOutOfRange(format!("throttle axis {v}"))
                );
                *v = clamped;
            }
        }
        if let BrakeIntent::Axis(v) = &mut self.brake {
            let clamped = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
            if clamped != *v {
                log::debug!(
                    "{}",
                    Error::ControlInputOutOfRange(format!("brake axis {v}"))
                );
                *v = clamped;
            }
        }
        self
    }
}
