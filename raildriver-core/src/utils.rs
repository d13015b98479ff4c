#[macro_export]
macro_rules! format_dbg {
    ($dbg_expr:expr) => {
        format!(
            "[{}:{}] {}: {:?}",
            file!(),
            line!(),
            stringify!($dbg_expr),
            $dbg_expr
        )
    };
    () => {
        format!("[{}:{}]", file!(), line!())
    };
}

/// Floating-point comparison with relative tolerance, falling back to
/// absolute tolerance near zero.
pub fn almost_eq(val: f64, truth: f64, epsilon: Option<f64>) -> bool {
    let epsilon = epsilon.unwrap_or(1e-8);
    ((val - truth) / (truth + f64::EPSILON)).abs() < epsilon || (val - truth).abs() < epsilon
}

pub fn almost_eq_uom<D, U>(
    val: &uom::si::Quantity<D, U, f64>,
    truth: &uom::si::Quantity<D, U, f64>,
    epsilon: Option<f64>,
) -> bool
where
    D: uom::si::Dimension + ?Sized,
    U: uom::si::Units<f64> + ?Sized,
{
    almost_eq(val.value, truth.value, epsilon)
}

pub fn almost_le_uom<D, U>(
    val: &uom::si::Quantity<D, U, f64>,
    truth: &uom::si::Quantity<D, U, f64>,
    epsilon: Option<f64>,
) -> bool
where
    D: uom::si::Dimension + ?Sized,
    U: uom::si::Units<f64> + ?Sized,
{
    val.value < truth.value || almost_eq(val.value, truth.value, epsilon)
}

/// Whether `slice` is sorted in non-decreasing order.
pub fn is_sorted<T: PartialOrd>(slice: &[T]) -> bool {
    slice.windows(2).all(|w| w[0] <= w[1])
}

/// Whether `slice` is sorted with no repeated elements.
pub fn is_strictly_sorted<T: PartialOrd>(slice: &[T]) -> bool {
    slice.windows(2).all(|w| w[0] < w[1])
}
