//! Модели данных для приложений: запросы на расчёт, результаты расчёта
//! и обёртка выданной сметы.
//!
//! Все типы передаются по сети в JSON. Значения перечислений записываются
//! в `snake_case`; испанские синонимы из старых форм сайта также принимаются.

use crate::errors::QuoteError;
use macros::QuoteEnumDisplay;
use serde::{Deserialize, Serialize};

/// Конструктивная система здания.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QuoteEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionSystem {
    /// Лёгкий стальной каркас.
    #[str("steel_frame")]
    SteelFrame,
    /// Промышленный каркас.
    #[str("industrial")]
    Industrial,
    /// Морской контейнер.
    #[str("container", "contenedor")]
    #[serde(alias = "contenedor")]
    Container,
    /// Смешанная система (каркас + промышленная).
    #[str("mixed", "mixto")]
    #[serde(alias = "mixto")]
    Mixed,
}

/// Назначение здания.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QuoteEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    /// Жилое.
    #[str("residential", "residencial")]
    #[serde(alias = "residencial")]
    Residential,
    /// Коммерческое.
    #[str("commercial", "comercial")]
    #[serde(alias = "comercial")]
    Commercial,
    /// Промышленное.
    #[str("industrial")]
    Industrial,
}

/// Уровень отделки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QuoteEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishLevel {
    /// Базовая.
    #[str("basic", "basico")]
    #[serde(alias = "basico")]
    Basic,
    /// Стандартная.
    #[str("standard", "estandar")]
    #[serde(alias = "estandar")]
    Standard,
    /// Премиум.
    #[str("premium")]
    Premium,
}

/// Тарифная категория потребителя электроэнергии.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QuoteEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffCategory {
    #[str("residential", "residencial")]
    #[serde(alias = "residencial")]
    Residential,
    #[str("commercial", "comercial")]
    #[serde(alias = "comercial")]
    Commercial,
    #[str("industrial")]
    Industrial,
}

/// Тип монтажа солнечной станции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QuoteEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallationType {
    #[str("roof_residential", "techo_residencial")]
    #[serde(alias = "techo_residencial")]
    RoofResidential,
    #[str("roof_commercial", "techo_comercial")]
    #[serde(alias = "techo_comercial")]
    RoofCommercial,
    #[str("ground_residential", "suelo_residencial")]
    #[serde(alias = "suelo_residencial")]
    GroundResidential,
    #[str("ground_commercial", "suelo_comercial")]
    #[serde(alias = "suelo_comercial")]
    GroundCommercial,
    #[str("carport")]
    Carport,
    #[str("facade", "fachada")]
    #[serde(alias = "fachada")]
    Facade,
}

/// Технология солнечных панелей.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QuoteEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelType {
    #[str("monocrystalline", "monocristalino")]
    #[serde(alias = "monocristalino")]
    Monocrystalline,
    #[str("polycrystalline", "policristalino")]
    #[serde(alias = "policristalino")]
    Polycrystalline,
    #[str("thin_film")]
    ThinFilm,
    #[str("bifacial")]
    Bifacial,
}

/// Тип инвертора.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, QuoteEnumDisplay, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InverterType {
    /// Сетевой (string) инвертор.
    #[str("string")]
    #[serde(rename = "string")]
    StringInverter,
    #[str("micro")]
    Micro,
    #[str("central")]
    Central,
    #[str("hybrid", "hibrido")]
    #[serde(alias = "hibrido")]
    Hybrid,
}

/// Контактные данные клиента. В расчёте не участвуют, нужны только для
/// заявки и уведомлений.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerContact {
    /// Имя клиента.
    pub name: String,
    /// Электронная почта для копии сметы.
    #[serde(default)]
    pub email: Option<String>,
    /// Телефон или WhatsApp.
    #[serde(default)]
    pub phone: Option<String>,
}

fn default_floors() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Запрос на расчёт сметы строительства.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionQuoteRequest {
    /// Конструктивная система.
    pub system: ConstructionSystem,
    /// Назначение здания.
    pub usage: UsageType,
    /// Уровень отделки.
    pub finish: FinishLevel,
    /// Площадь застройки, м².
    pub area_m2: f64,
    /// Код провинции (региона), например `buenos_aires`.
    pub province: String,
    /// Количество этажей.
    #[serde(default = "default_floors")]
    pub floors: u32,
    /// Наличие террасы.
    #[serde(default)]
    pub has_terrace: bool,
    /// Наличие подвала.
    #[serde(default)]
    pub has_basement: bool,
    /// Инженерные сети включены в смету.
    #[serde(default = "default_true")]
    pub utilities_included: bool,
    /// Контакты клиента.
    #[serde(default)]
    pub customer: Option<CustomerContact>,
}

/// Разбивка итоговой стоимости по категориям.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub materials: f64,
    pub labor: f64,
    pub finishes: f64,
    pub installations: f64,
    pub transport: f64,
    pub taxes: f64,
}

impl CostBreakdown {
    /// Сумма всех категорий.
    pub fn sum(&self) -> f64 {
        self.materials
            + self.labor
            + self.finishes
            + self.installations
            + self.transport
            + self.taxes
    }
}

/// Единица, в которой выражен срок строительства.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationBand {
    Days,
    Months,
    Years,
}

/// Оценка срока строительства.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionDuration {
    /// Полное количество рабочих дней (округлено вверх).
    pub total_days: u32,
    /// Единица представления.
    pub band: DurationBand,
    /// Значение в выбранной единице.
    pub value: u32,
}

impl std::fmt::Display for ConstructionDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match (self.band, self.value) {
            (DurationBand::Days, 1) => "day",
            (DurationBand::Days, _) => "days",
            (DurationBand::Months, 1) => "month",
            (DurationBand::Months, _) => "months",
            (DurationBand::Years, 1) => "year",
            (DurationBand::Years, _) => "years",
        };
        write!(f, "{} {}", self.value, unit)
    }
}

/// Результат расчёта сметы строительства.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionQuoteResult {
    /// Исходный запрос.
    pub request: ConstructionQuoteRequest,
    /// Базовая ставка за м² до применения коэффициентов.
    pub base_rate: f64,
    pub usage_multiplier: f64,
    pub finish_multiplier: f64,
    pub region_multiplier: f64,
    /// Итоговая цена за м².
    pub price_per_m2: f64,
    /// Итоговая стоимость.
    pub total: f64,
    /// Валюта ставок прайс-листа.
    pub currency: String,
    /// Разбивка по категориям (фиксированные доли от `total`).
    pub breakdown: CostBreakdown,
    /// Срок строительства.
    pub duration: ConstructionDuration,
    /// Пояснения для клиента.
    pub notes: Vec<String>,
    /// Срок действия сметы, дней.
    pub validity_days: u32,
    /// Источник прайс-листа, по которому выполнен расчёт.
    pub price_source: String,
}

/// Запрос на подбор и расчёт солнечной станции.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarQuoteRequest {
    /// Месячное потребление, кВт·ч.
    pub monthly_consumption_kwh: f64,
    /// Доступная площадь для панелей, м².
    pub available_area_m2: f64,
    /// Тарифная категория.
    pub tariff: TariffCategory,
    /// Тип монтажа.
    pub installation: InstallationType,
    /// Населённый пункт (для заявки).
    #[serde(default)]
    pub location: Option<String>,
    /// Требуется резервирование аккумуляторами.
    #[serde(default)]
    pub battery_backup: bool,
    /// Требуемая автономность, часов.
    #[serde(default)]
    pub battery_autonomy_hours: Option<u32>,
    /// Предпочтительная технология панелей.
    #[serde(default)]
    pub panel_preference: Option<PanelType>,
    /// Предпочтительный тип инвертора.
    #[serde(default)]
    pub inverter_preference: Option<InverterType>,
    /// Контакты клиента.
    #[serde(default)]
    pub customer: Option<CustomerContact>,
}

/// Выбранная позиция каталога и её количество.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedEquipment {
    pub brand: String,
    pub model: String,
    /// Номинал единицы: кВт·п для панели, кВт для инвертора, кВт·ч для АКБ.
    pub unit_rating: f64,
    pub unit_price: f64,
    pub count: u32,
    pub warranty_years: u32,
}

/// Оценка выработки.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyGeneration {
    pub daily_kwh: f64,
    pub monthly_kwh: f64,
    pub annual_kwh: f64,
}

/// Разбивка стоимости станции по категориям оборудования.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarCostBreakdown {
    pub panels: f64,
    pub inverters: f64,
    /// Монтажная система и работы.
    pub installation: f64,
    pub batteries: f64,
    pub total: f64,
}

/// Экономические показатели станции.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarEconomics {
    /// Применённая ставка тарифа за кВт·ч.
    pub tariff_rate: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub payback_years: f64,
    /// ROI за весь принятый срок службы, %.
    pub roi_percentage: f64,
    /// Принятый срок службы станции, лет.
    pub lifetime_years: u32,
    pub maintenance_cost_annual: f64,
}

/// Подбор аккумуляторов.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterySizing {
    pub autonomy_hours: u32,
    /// Средняя часовая нагрузка, кВт·ч/ч.
    pub hourly_load_kwh: f64,
    pub required_capacity_kwh: f64,
    pub battery: SelectedEquipment,
    pub cost: f64,
}

/// Проект солнечной станции с расчётом стоимости и окупаемости.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarSystemDesign {
    /// Требуемая мощность, кВт·п.
    pub required_power_kwp: f64,
    pub panel_count: u32,
    pub panel: SelectedEquipment,
    pub inverter_count: u32,
    /// Мощность инверторной части с запасом, кВт.
    pub inverter_size_kw: u32,
    pub inverter: SelectedEquipment,
    /// Фактически установленная мощность, кВт·п.
    pub system_power_kwp: f64,
    /// Солнечные часы в сутки, принятые для места установки.
    #[serde(default)]
    pub sun_hours_per_day: f64,
    pub system_efficiency: f64,
    pub generation: EnergyGeneration,
    pub costs: SolarCostBreakdown,
    pub economics: SolarEconomics,
    pub battery: Option<BatterySizing>,
    pub required_area_m2: f64,
    pub fits_available_area: bool,
    pub installation_time_days: u32,
    pub warranty_years: u32,
}

/// Быстрая предварительная оценка солнечной станции.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarQuickEstimate {
    pub daily_consumption_kwh: f64,
    pub required_power_kwp: f64,
    pub estimated_panels: u32,
    pub estimated_area_m2: f64,
    pub fits_available_area: bool,
    pub estimated_cost: f64,
    pub annual_savings: f64,
    pub payback_years: f64,
    pub generation: EnergyGeneration,
}

/// Выданная клиенту смета: результат расчёта с идентификатором и сроком
/// действия.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedQuote<T> {
    pub quote_id: String,
    /// Момент выдачи, секунды UNIX.
    pub issued_at: u64,
    /// Действительна до, секунды UNIX.
    pub valid_until: u64,
    pub result: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_display_uses_canonical_name() {
        assert_eq!(ConstructionSystem::SteelFrame.to_string(), "steel_frame");
        assert_eq!(FinishLevel::Standard.to_string(), "standard");
        assert_eq!(InverterType::StringInverter.to_string(), "string");
    }

    #[test]
    fn enum_from_str_accepts_aliases() {
        assert_eq!(
            "mixto".parse::<ConstructionSystem>().unwrap(),
            ConstructionSystem::Mixed
        );
        assert_eq!(" Basico ".parse::<FinishLevel>().unwrap(), FinishLevel::Basic);
        assert_eq!(
            "comercial".parse::<UsageType>().unwrap(),
            UsageType::Commercial
        );
        assert!("wood".parse::<ConstructionSystem>().is_err());
    }

    #[test]
    fn construction_request_defaults() {
        let json = r#"{
            "system": "steel_frame",
            "usage": "residencial",
            "finish": "basico",
            "area_m2": 100.0,
            "province": "buenos_aires"
        }"#;
        let request: ConstructionQuoteRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.system, ConstructionSystem::SteelFrame);
        assert_eq!(request.usage, UsageType::Residential);
        assert_eq!(request.finish, FinishLevel::Basic);
        assert_eq!(request.floors, 1);
        assert!(request.utilities_included);
        assert!(!request.has_terrace);
        assert!(request.customer.is_none());
    }

    #[test]
    fn inverter_type_wire_name() {
        let json = serde_json::to_string(&InverterType::StringInverter).unwrap();
        assert_eq!(json, "\"string\"");
    }

    #[test]
    fn breakdown_sum() {
        let breakdown = CostBreakdown {
            materials: 40.0,
            labor: 30.0,
            finishes: 15.0,
            installations: 10.0,
            transport: 3.0,
            taxes: 2.0,
        };
        assert_eq!(breakdown.sum(), 100.0);
    }

    #[test]
    fn duration_display() {
        let d = ConstructionDuration {
            total_days: 50,
            band: DurationBand::Months,
            value: 2,
        };
        assert_eq!(d.to_string(), "2 months");

        let d = ConstructionDuration {
            total_days: 1,
            band: DurationBand::Days,
            value: 1,
        };
        assert_eq!(d.to_string(), "1 day");
    }
}
