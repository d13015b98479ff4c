//! Unit constants for multiplication syntax (e.g. `0.5 * uc::KM`).
//! Values are stored in uom base units, so each constant is the base-unit
//! magnitude of the named unit.

use crate::si;
use std::marker::PhantomData;

macro_rules! unit_const {
    ($(#[$attr:meta])* $name:ident, $quantity:ty, $value:expr) => {
        $(#[$attr])*
        pub const $name: $quantity = uom::si::Quantity {
            dimension: PhantomData,
            units: PhantomData,
            value: $value,
        };
    };
}

unit_const!(M, si::Length, 1.0);
unit_const!(KM, si::Length, 1.0e3);
unit_const!(M2, si::Area, 1.0);
unit_const!(S, si::Time, 1.0);
unit_const!(MIN, si::Time, 60.0);
unit_const!(HR, si::Time, 3600.0);
unit_const!(MS, si::Time, 1.0e-3);
unit_const!(MPS, si::Velocity, 1.0);
unit_const!(KPH, si::Velocity, 1.0 / 3.6);
unit_const!(MPS2, si::Acceleration, 1.0);
unit_const!(KPH_PER_S, si::Acceleration, 1.0 / 3.6);
unit_const!(KG, si::Mass, 1.0);
unit_const!(TONNE, si::Mass, 1.0e3);
unit_const!(N, si::Force, 1.0);
unit_const!(KN, si::Force, 1.0e3);
unit_const!(KGPM3, si::MassDensity, 1.0);
unit_const!(R, si::Ratio, 1.0);
unit_const!(HZ, si::Frequency, 1.0);

unit_const!(
    /// Standard gravitational acceleration
    ACC_GRAV,
    si::Acceleration,
    9.80665
);

/// Sea-level air density used by the aerodynamic resistance term
pub fn rho_air() -> si::MassDensity {
    1.225 * KGPM3
}
