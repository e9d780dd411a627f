//! Настраиваемые параметры расчёта.
//!
//! Значения по умолчанию соответствуют действующим таблицам сайта.
//! Вызывающий код может подставить свои таблицы целиком или поменять
//! отдельные поля.

use commons::models::{ConstructionSystem, FinishLevel, TariffCategory, UsageType};
use std::collections::HashMap;

/// Максимальная площадь объекта по умолчанию, м².
pub const DEFAULT_MAX_AREA_M2: f64 = 10_000.0;

/// Коэффициент для провинций, отсутствующих в таблице.
pub const DEFAULT_REGION_MULTIPLIER: f64 = 0.90;

/// Срок строительства по умолчанию, дней на м².
pub const DEFAULT_DAYS_PER_M2: f64 = 0.4;

/// Принятый срок службы солнечной станции для расчёта ROI, лет.
pub const ASSUMED_LIFETIME_YEARS: u32 = 25;

/// Параметры сметы строительства.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionSettings {
    /// Коэффициенты по назначению здания. Для отсутствующего ключа 1.0.
    pub usage_multipliers: HashMap<UsageType, f64>,
    /// Коэффициенты по уровню отделки. Для отсутствующего ключа 1.0.
    pub finish_multipliers: HashMap<FinishLevel, f64>,
    /// Коэффициенты по провинциям (ключи нормализованы, см.
    /// [`normalize_province`]).
    pub region_multipliers: HashMap<String, f64>,
    /// Коэффициент для неизвестной провинции.
    pub default_region_multiplier: f64,
    /// Максимальная площадь, м².
    pub max_area_m2: f64,
    /// Допустимое количество этажей.
    pub floors: std::ops::RangeInclusive<u32>,
    /// Дней строительства на м² по конструктивной системе.
    pub days_per_m2: HashMap<ConstructionSystem, f64>,
    /// Дней на м² для системы, отсутствующей в таблице.
    pub default_days_per_m2: f64,
    /// Поправка срока для здания больше одного этажа.
    pub multi_floor_duration_factor: f64,
    /// Поправка срока при наличии террасы.
    pub terrace_duration_factor: f64,
    /// Поправка срока при наличии подвала.
    pub basement_duration_factor: f64,
    /// Срок действия сметы, дней.
    pub validity_days: u32,
}

impl Default for ConstructionSettings {
    fn default() -> Self {
        let usage_multipliers = HashMap::from([
            (UsageType::Residential, 1.0),
            (UsageType::Commercial, 1.3),
            (UsageType::Industrial, 1.4),
        ]);

        let finish_multipliers = HashMap::from([
            (FinishLevel::Basic, 1.0),
            (FinishLevel::Standard, 1.2),
            (FinishLevel::Premium, 1.5),
        ]);

        let region_multipliers = [
            ("mendoza", 0.88),
            ("buenos_aires", 1.0),
            ("cordoba", 0.95),
            ("santa_fe", 0.92),
            ("tucuman", 0.85),
            ("entre_rios", 0.90),
            ("chaco", 0.83),
            ("corrientes", 0.87),
            ("misiones", 0.89),
            ("formosa", 0.82),
            ("chubut", 0.93),
            ("rio_negro", 0.91),
            ("neuquen", 0.94),
            ("la_pampa", 0.86),
            ("san_luis", 0.84),
            ("la_rioja", 0.81),
            ("catamarca", 0.83),
            ("santiago", 0.80),
            ("salta", 0.86),
            ("jujuy", 0.85),
            ("san_juan", 0.87),
            ("tierra_fuego", 1.15),
            ("otras", 0.90),
        ]
        .into_iter()
        .map(|(code, m)| (code.to_string(), m))
        .collect();

        let days_per_m2 = HashMap::from([
            (ConstructionSystem::SteelFrame, 0.5),
            (ConstructionSystem::Industrial, 0.3),
            (ConstructionSystem::Container, 0.2),
            (ConstructionSystem::Mixed, 0.4),
        ]);

        Self {
            usage_multipliers,
            finish_multipliers,
            region_multipliers,
            default_region_multiplier: DEFAULT_REGION_MULTIPLIER,
            max_area_m2: DEFAULT_MAX_AREA_M2,
            floors: 1..=10,
            days_per_m2,
            default_days_per_m2: DEFAULT_DAYS_PER_M2,
            multi_floor_duration_factor: 1.3,
            terrace_duration_factor: 1.1,
            basement_duration_factor: 1.2,
            validity_days: 30,
        }
    }
}

impl ConstructionSettings {
    /// Задать максимальную площадь.
    pub fn with_max_area(mut self, max_area_m2: f64) -> Self {
        self.max_area_m2 = max_area_m2;
        self
    }

    pub fn usage_multiplier(&self, usage: UsageType) -> f64 {
        self.usage_multipliers.get(&usage).copied().unwrap_or(1.0)
    }

    pub fn finish_multiplier(&self, finish: FinishLevel) -> f64 {
        self.finish_multipliers.get(&finish).copied().unwrap_or(1.0)
    }

    /// Коэффициент провинции; неизвестный код не является ошибкой.
    pub fn region_multiplier(&self, province: &str) -> f64 {
        self.region_multipliers
            .get(&normalize_province(province))
            .copied()
            .unwrap_or(self.default_region_multiplier)
    }

    pub fn days_per_m2(&self, system: ConstructionSystem) -> f64 {
        self.days_per_m2
            .get(&system)
            .copied()
            .unwrap_or(self.default_days_per_m2)
    }

    /// Совокупная поправка срока за этажность, террасу и подвал.
    pub fn duration_factor(&self, floors: u32, has_terrace: bool, has_basement: bool) -> f64 {
        let mut factor = 1.0;
        if floors > 1 {
            factor *= self.multi_floor_duration_factor;
        }
        if has_terrace {
            factor *= self.terrace_duration_factor;
        }
        if has_basement {
            factor *= self.basement_duration_factor;
        }
        factor
    }
}

/// Нормализовать код провинции: `" Buenos Aires "` → `"buenos_aires"`.
pub fn normalize_province(province: &str) -> String {
    province
        .trim()
        .to_lowercase()
        .split([' ', '-', '_'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Параметры подбора солнечной станции.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarSettings {
    /// Эффективные солнечные часы в сутки для неизвестного или
    /// не указанного места установки.
    pub sun_hours_per_day: f64,
    /// Солнечные часы по месту установки (ключи нормализованы, см.
    /// [`normalize_province`]).
    pub sun_hours_by_location: HashMap<String, f64>,
    /// КПД системы с учётом потерь (0..=1).
    pub system_efficiency: f64,
    /// Запас мощности инверторов.
    pub inverter_margin: f64,
    /// Ставки тарифа за кВт·ч по категориям.
    pub tariff_rates: HashMap<TariffCategory, f64>,
    /// Ставка для категории, отсутствующей в таблице.
    pub default_tariff_rate: f64,
    /// Срок службы станции для ROI, лет.
    pub lifetime_years: u32,
    /// Автономность АКБ, если клиент её не указал, часов.
    pub default_autonomy_hours: u32,
    /// Площадь, занимаемая одной панелью, м².
    pub panel_footprint_m2: f64,
    /// Годовое обслуживание, доля от инвестиций.
    pub maintenance_rate: f64,
    /// Монтажная производительность, кВт·п в день.
    pub kwp_installed_per_day: f64,
    /// Мощность панели для быстрой оценки, кВт·п.
    pub quick_panel_kwp: f64,
    /// Удельная стоимость станции для быстрой оценки, за кВт·п.
    pub quick_cost_per_kwp: f64,
}

impl Default for SolarSettings {
    fn default() -> Self {
        let sun_hours_by_location = [
            ("buenos_aires", 5.5),
            ("cordoba", 6.0),
            ("santa_fe", 5.8),
            ("mendoza", 6.2),
            ("tucuman", 5.7),
        ]
        .into_iter()
        .map(|(code, hours)| (code.to_string(), hours))
        .collect();

        Self {
            sun_hours_per_day: 5.5,
            sun_hours_by_location,
            system_efficiency: 0.85,
            inverter_margin: 1.2,
            tariff_rates: HashMap::from([
                (TariffCategory::Residential, 45.0),
                (TariffCategory::Commercial, 38.0),
                (TariffCategory::Industrial, 32.0),
            ]),
            default_tariff_rate: 45.0,
            lifetime_years: ASSUMED_LIFETIME_YEARS,
            default_autonomy_hours: 8,
            panel_footprint_m2: 2.0,
            maintenance_rate: 0.01,
            kwp_installed_per_day: 2.0,
            quick_panel_kwp: 0.4,
            quick_cost_per_kwp: 800_000.0,
        }
    }
}

impl SolarSettings {
    /// Солнечные часы для места установки; неизвестное место не является
    /// ошибкой.
    pub fn sun_hours(&self, location: Option<&str>) -> f64 {
        location
            .and_then(|l| self.sun_hours_by_location.get(&normalize_province(l)))
            .copied()
            .unwrap_or(self.sun_hours_per_day)
    }

    pub fn tariff_rate(&self, tariff: TariffCategory) -> f64 {
        self.tariff_rates
            .get(&tariff)
            .copied()
            .unwrap_or(self.default_tariff_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn province_normalization() {
        assert_eq!(normalize_province(" Buenos Aires "), "buenos_aires");
        assert_eq!(normalize_province("rio-negro"), "rio_negro");
        assert_eq!(normalize_province("SANTA__FE"), "santa_fe");
        assert_eq!(normalize_province(""), "");
    }

    #[test]
    fn unknown_province_uses_default() {
        let settings = ConstructionSettings::default();
        assert_eq!(settings.region_multiplier("atlantis"), DEFAULT_REGION_MULTIPLIER);
        assert_eq!(settings.region_multiplier("Tierra Fuego"), 1.15);
    }

    #[test]
    fn missing_table_entries_are_neutral() {
        let mut settings = ConstructionSettings::default();
        settings.usage_multipliers.clear();
        settings.finish_multipliers.clear();

        assert_eq!(settings.usage_multiplier(UsageType::Industrial), 1.0);
        assert_eq!(settings.finish_multiplier(FinishLevel::Premium), 1.0);
    }

    #[test]
    fn default_multipliers_are_positive() {
        let settings = ConstructionSettings::default();
        assert!(settings.usage_multipliers.values().all(|m| *m > 0.0));
        assert!(settings.finish_multipliers.values().all(|m| *m > 0.0));
        assert!(settings.region_multipliers.values().all(|m| *m > 0.0));
    }

    #[test]
    fn duration_factor_combines_features() {
        let settings = ConstructionSettings::default();
        assert_eq!(settings.duration_factor(1, false, false), 1.0);
        assert_eq!(settings.duration_factor(3, false, false), 1.3);
        assert!((settings.duration_factor(2, true, true) - 1.3 * 1.1 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn sun_hours_by_location() {
        let settings = SolarSettings::default();
        assert_eq!(settings.sun_hours(Some("Mendoza")), 6.2);
        assert_eq!(settings.sun_hours(Some("santa-fe")), 5.8);
        assert_eq!(settings.sun_hours(Some("atlantis")), 5.5);
        assert_eq!(settings.sun_hours(None), 5.5);
    }

    #[test]
    fn tariff_fallback() {
        let mut settings = SolarSettings::default();
        assert_eq!(settings.tariff_rate(TariffCategory::Commercial), 38.0);

        settings.tariff_rates.remove(&TariffCategory::Commercial);
        assert_eq!(settings.tariff_rate(TariffCategory::Commercial), 45.0);
    }
}
