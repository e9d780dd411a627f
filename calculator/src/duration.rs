//! Оценка срока строительства.

use crate::ceil_units;
use commons::models::{ConstructionDuration, DurationBand};

/// Дней в "месяце" для перевода срока.
const DAYS_PER_MONTH: u32 = 30;
/// Дней в "годе" для перевода срока.
const DAYS_PER_YEAR: u32 = 365;

/// Срок строительства: `ceil(area × days_per_m2)` дней, представленный
/// в днях (< 30), месяцах (< 365) или годах. Месяцы и годы округляются
/// вверх.
pub fn estimate_duration(area_m2: f64, days_per_m2: f64) -> ConstructionDuration {
    from_days(ceil_units(area_m2 * days_per_m2))
}

/// Представить количество дней в подходящей единице.
pub fn from_days(total_days: u32) -> ConstructionDuration {
    let (band, value) = if total_days < DAYS_PER_MONTH {
        (DurationBand::Days, total_days)
    } else if total_days < DAYS_PER_YEAR {
        (DurationBand::Months, total_days.div_ceil(DAYS_PER_MONTH))
    } else {
        (DurationBand::Years, total_days.div_ceil(DAYS_PER_YEAR))
    };

    ConstructionDuration {
        total_days,
        band,
        value,
    }
}
