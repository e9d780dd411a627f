//! Смета строительства.
//!
//! Цена за м² = базовая ставка × коэффициент назначения × коэффициент
//! отделки × коэффициент провинции; итог = площадь × цена за м². Итог
//! делится на категории фиксированными долями.

use crate::duration::estimate_duration;
use crate::settings::{ConstructionSettings, normalize_province};
use crate::{PriceTable, is_positive};
use commons::errors::QuoteError;
use commons::models::{
    ConstructionQuoteRequest, ConstructionQuoteResult, ConstructionSystem, CostBreakdown,
    FinishLevel,
};
use log::debug;

/// Доля материалов в итоге.
pub const MATERIALS_SHARE: f64 = 0.40;
/// Доля работ в итоге.
pub const LABOR_SHARE: f64 = 0.30;
/// Доля отделки в итоге.
pub const FINISHES_SHARE: f64 = 0.15;
/// Доля инженерных систем в итоге.
pub const INSTALLATIONS_SHARE: f64 = 0.10;
/// Доля транспорта в итоге.
pub const TRANSPORT_SHARE: f64 = 0.03;
/// Доля налогов в итоге.
pub const TAXES_SHARE: f64 = 0.02;

/// Провинции, относящиеся к столичной агломерации.
const METROPOLITAN: [&str; 2] = ["buenos_aires", "caba"];

/// Разделить итог на категории.
pub fn split_total(total: f64) -> CostBreakdown {
    CostBreakdown {
        materials: total * MATERIALS_SHARE,
        labor: total * LABOR_SHARE,
        finishes: total * FINISHES_SHARE,
        installations: total * INSTALLATIONS_SHARE,
        transport: total * TRANSPORT_SHARE,
        taxes: total * TAXES_SHARE,
    }
}

/// Калькулятор смет строительства с заданными параметрами.
///
/// ## Пример
///
/// ```
/// use calculator::{ConstructionCalculator, PriceTable};
/// use commons::models::*;
///
/// let request = ConstructionQuoteRequest {
///     system: ConstructionSystem::SteelFrame,
///     usage: UsageType::Residential,
///     finish: FinishLevel::Basic,
///     area_m2: 100.0,
///     province: "buenos_aires".to_string(),
///     floors: 1,
///     has_terrace: false,
///     has_basement: false,
///     utilities_included: true,
///     customer: None,
/// };
///
/// let result = ConstructionCalculator::default()
///     .compute(&request, &PriceTable::fallback())
///     .unwrap();
/// assert_eq!(result.total, 10_500.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstructionCalculator {
    settings: ConstructionSettings,
}

impl ConstructionCalculator {
    pub fn new(settings: ConstructionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConstructionSettings {
        &self.settings
    }

    /// Рассчитать смету.
    ///
    /// ## Ошибки
    ///
    /// [`QuoteError::InvalidInput`], если площадь не больше 0 или больше
    /// максимальной, количество этажей вне допустимого диапазона, ставка
    /// прайс-листа или применяемый коэффициент не положительны.
    pub fn compute(
        &self,
        request: &ConstructionQuoteRequest,
        prices: &PriceTable,
    ) -> Result<ConstructionQuoteResult, QuoteError> {
        self.validate(request)?;
        prices.validate()?;

        let base_rate = prices.base_rate(request.system);
        let usage_multiplier = self.settings.usage_multiplier(request.usage);
        let finish_multiplier = self.settings.finish_multiplier(request.finish);
        let region_multiplier = self.settings.region_multiplier(&request.province);

        for (name, value) in [
            ("usage", usage_multiplier),
            ("finish", finish_multiplier),
            ("region", region_multiplier),
        ] {
            if !is_positive(value) {
                return Err(QuoteError::invalid_input(format!(
                    "коэффициент {name} должен быть больше 0, получено {value}"
                )));
            }
        }

        let price_per_m2 = base_rate * usage_multiplier * finish_multiplier * region_multiplier;
        let total = request.area_m2 * price_per_m2;

        let days_per_m2 = self.settings.days_per_m2(request.system)
            * self.settings.duration_factor(
                request.floors,
                request.has_terrace,
                request.has_basement,
            );
        if !is_positive(days_per_m2) {
            return Err(QuoteError::invalid_input(format!(
                "срок на м² для {} должен быть больше 0",
                request.system
            )));
        }
        let duration = estimate_duration(request.area_m2, days_per_m2);

        debug!(
            "Смета {} {}м²: ставка {} × {} × {} × {} = {}/м², итог {}",
            request.system,
            request.area_m2,
            base_rate,
            usage_multiplier,
            finish_multiplier,
            region_multiplier,
            price_per_m2,
            total
        );

        Ok(ConstructionQuoteResult {
            request: request.clone(),
            base_rate,
            usage_multiplier,
            finish_multiplier,
            region_multiplier,
            price_per_m2,
            total,
            currency: prices.currency.clone(),
            breakdown: split_total(total),
            duration,
            notes: self.notes(request),
            validity_days: self.settings.validity_days,
            price_source: prices.source.clone(),
        })
    }

    /// Проверить входные данные запроса.
    fn validate(&self, request: &ConstructionQuoteRequest) -> Result<(), QuoteError> {
        if !is_positive(request.area_m2) {
            return Err(QuoteError::invalid_input(format!(
                "площадь должна быть больше 0, получено {}",
                request.area_m2
            )));
        }

        if request.area_m2 > self.settings.max_area_m2 {
            return Err(QuoteError::invalid_input(format!(
                "площадь {} м² превышает максимум {} м²",
                request.area_m2, self.settings.max_area_m2
            )));
        }

        if !self.settings.floors.contains(&request.floors) {
            return Err(QuoteError::invalid_input(format!(
                "количество этажей должно быть от {} до {}, получено {}",
                self.settings.floors.start(),
                self.settings.floors.end(),
                request.floors
            )));
        }

        Ok(())
    }

    /// Пояснения к смете для клиента.
    fn notes(&self, request: &ConstructionQuoteRequest) -> Vec<String> {
        let mut notes: Vec<String> = match request.system {
            ConstructionSystem::SteelFrame => vec![
                "Dry construction with galvanized steel profiles".into(),
                "Thermal and acoustic insulation included".into(),
            ],
            ConstructionSystem::Industrial => vec![
                "Industrial structure with structural steel".into(),
                "Galvanized corrugated sheet roofing".into(),
            ],
            ConstructionSystem::Container => vec![
                "Conversion of a standard shipping container".into(),
                "Reinforced thermal insulation".into(),
            ],
            ConstructionSystem::Mixed => {
                vec!["Steel frame combined with an industrial structure".into()]
            }
        };

        if request.finish == FinishLevel::Premium {
            notes.push("Premium finishes with high-quality materials".into());
        }

        if METROPOLITAN.contains(&normalize_province(&request.province).as_str()) {
            notes.push("Prices adjusted for the metropolitan region".into());
        }

        if !request.utilities_included {
            notes.push("Utility installations are not included".into());
        }

        notes.push(format!(
            "Quote valid for {} days",
            self.settings.validity_days
        ));
        notes.push("Includes materials, labor and installations".into());
        notes.push("Does not include foundations or utility connections".into());
        notes
    }
}

/// Рассчитать смету строительства с параметрами по умолчанию.
pub fn compute_construction_breakdown(
    request: &ConstructionQuoteRequest,
    prices: &PriceTable,
) -> Result<ConstructionQuoteResult, QuoteError> {
    ConstructionCalculator::default().compute(request, prices)
}
