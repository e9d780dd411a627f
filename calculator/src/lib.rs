//! Калькулятор смет.
//!
//! Чистые функции без состояния и ввода-вывода: на вход запрос и
//! прайс-лист (каталог оборудования), на выход результат расчёта или
//! [`QuoteError::InvalidInput`]. Получение прайс-листа, кэширование и
//! резервные значения остаются на стороне вызывающего кода.
//!
//! - [`construction`]: смета строительства по площади и коэффициентам
//! - [`solar`]: подбор солнечной станции, быстрая оценка
//!
//! [`QuoteError::InvalidInput`]: commons::errors::QuoteError::InvalidInput

pub mod catalog;
pub mod construction;
pub mod duration;
pub mod prices;
pub mod settings;
pub mod solar;

pub use catalog::Catalog;
pub use construction::{ConstructionCalculator, compute_construction_breakdown};
pub use prices::PriceTable;
pub use settings::{ConstructionSettings, SolarSettings};
pub use solar::{SolarCalculator, estimate_solar_system, quick_estimate};

/// Допуск на погрешность вещественной арифметики при округлении вверх.
const CEIL_EPSILON: f64 = 1e-9;

/// Округлить вверх до целого количества единиц (не меньше одной).
///
/// `100.0 * 0.3` даёт `30.000000000000004`, поэтому хвост меньше
/// [`CEIL_EPSILON`] отбрасывается.
pub(crate) fn ceil_units(value: f64) -> u32 {
    (value - CEIL_EPSILON).ceil().max(1.0) as u32
}

/// Проверить, что значение конечно и строго положительно.
pub(crate) fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
