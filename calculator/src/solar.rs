//! Подбор солнечной станции и расчёт окупаемости.
//!
//! Суточное потребление = месячное / 30; требуемая мощность = суточное
//! потребление / (солнечные часы × КПД системы). Солнечные часы берутся по
//! месту установки из [`SolarSettings::sun_hours_by_location`].
//!
//! Количество панелей и мощность инверторов округляются вверх, стоимость
//! складывается из панелей, инверторов (по стоимости кВт), монтажа
//! (по стоимости кВт·п) и, при необходимости, аккумуляторов.

use crate::catalog::Catalog;
use crate::settings::SolarSettings;
use crate::{ceil_units, is_positive};
use commons::errors::QuoteError;
use commons::models::{
    BatterySizing, EnergyGeneration, SolarCostBreakdown, SolarEconomics, SolarQuickEstimate,
    SolarQuoteRequest, SolarSystemDesign,
};
use log::debug;

/// Дней в расчётном месяце.
const DAYS_PER_MONTH: f64 = 30.0;
/// Дней в году.
const DAYS_PER_YEAR: f64 = 365.0;
/// Месяцев в году.
const MONTHS_PER_YEAR: f64 = 12.0;
/// Часов в сутках.
const HOURS_PER_DAY: f64 = 24.0;

/// Калькулятор солнечных станций с заданными параметрами.
#[derive(Debug, Clone, Default)]
pub struct SolarCalculator {
    settings: SolarSettings,
}

impl SolarCalculator {
    pub fn new(settings: SolarSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolarSettings {
        &self.settings
    }

    /// Подобрать станцию по каталогу и рассчитать её экономику.
    ///
    /// ## Ошибки
    ///
    /// [`QuoteError::InvalidInput`], если потребление или площадь не больше 0,
    /// автономность указана нулевой, в каталоге нет пригодных панелей,
    /// инверторов, монтажных систем (или батарей при запросе резерва).
    pub fn design(
        &self,
        request: &SolarQuoteRequest,
        catalog: &Catalog,
    ) -> Result<SolarSystemDesign, QuoteError> {
        self.validate(request)?;
        let s = &self.settings;

        let sun_hours = s.sun_hours(request.location.as_deref());
        let daily_consumption = request.monthly_consumption_kwh / DAYS_PER_MONTH;
        let required_power_kwp = self.required_power_kwp(daily_consumption, sun_hours);

        let panel = catalog
            .pick_panel(request.panel_preference)
            .ok_or_else(|| QuoteError::invalid_input("в каталоге нет пригодных панелей"))?;
        let panel_count = ceil_units(required_power_kwp / panel.power_kwp());
        let system_power_kwp = f64::from(panel_count) * panel.power_kwp();

        let inverter_size_kw = ceil_units(required_power_kwp * s.inverter_margin);
        let inverter = catalog
            .pick_inverter(request.inverter_preference, f64::from(inverter_size_kw))
            .ok_or_else(|| QuoteError::invalid_input("в каталоге нет пригодных инверторов"))?;
        let inverter_count = ceil_units(f64::from(inverter_size_kw) / inverter.power_kw);

        let mounting = catalog
            .pick_mounting()
            .ok_or_else(|| QuoteError::invalid_input("в каталоге нет монтажных систем"))?;

        let battery = if request.battery_backup {
            Some(self.size_battery(request, daily_consumption, catalog)?)
        } else {
            None
        };

        let panels_cost = f64::from(panel_count) * panel.unit_price;
        let inverters_cost = f64::from(inverter_size_kw) * inverter.cost_per_kw();
        let installation_cost = system_power_kwp * mounting.installed_cost_per_kwp();
        let batteries_cost = battery.as_ref().map(|b| b.cost).unwrap_or(0.0);
        let total = panels_cost + inverters_cost + installation_cost + batteries_cost;

        let costs = SolarCostBreakdown {
            panels: panels_cost,
            inverters: inverters_cost,
            installation: installation_cost,
            batteries: batteries_cost,
            total,
        };

        let economics = self.economics(request, total);
        let generation = self.generation(system_power_kwp, sun_hours);

        let required_area_m2 = f64::from(panel_count) * s.panel_footprint_m2;
        let installation_time_days =
            ((system_power_kwp / s.kwp_installed_per_day).floor() as u32).max(1);

        let warranty_years = [
            Some(panel.warranty_years),
            Some(inverter.warranty_years),
            Some(mounting.warranty_years),
            battery.as_ref().map(|b| b.battery.warranty_years),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or_default();

        debug!(
            "Станция {} кВт·ч/мес, {} ч солнца: требуется {:.3} кВт·п, {} панелей по {} кВт·п, инверторы {} кВт, итог {}",
            request.monthly_consumption_kwh,
            sun_hours,
            required_power_kwp,
            panel_count,
            panel.power_kwp(),
            inverter_size_kw,
            total
        );

        Ok(SolarSystemDesign {
            required_power_kwp,
            panel_count,
            panel: panel.selected(panel_count),
            inverter_count,
            inverter_size_kw,
            inverter: inverter.selected(inverter_count),
            system_power_kwp,
            sun_hours_per_day: sun_hours,
            system_efficiency: s.system_efficiency,
            generation,
            costs,
            economics,
            battery,
            required_area_m2,
            fits_available_area: required_area_m2 <= request.available_area_m2,
            installation_time_days,
            warranty_years,
        })
    }

    /// Быстрая оценка без каталога: мощность, число панелей типовой
    /// мощности, площадь и удельная стоимость.
    pub fn quick_estimate(
        &self,
        request: &SolarQuoteRequest,
    ) -> Result<SolarQuickEstimate, QuoteError> {
        self.validate(request)?;
        let s = &self.settings;

        if !is_positive(s.quick_panel_kwp) {
            return Err(QuoteError::invalid_input(
                "мощность типовой панели должна быть больше 0",
            ));
        }

        let sun_hours = s.sun_hours(request.location.as_deref());
        let daily_consumption_kwh = request.monthly_consumption_kwh / DAYS_PER_MONTH;
        let required_power_kwp = self.required_power_kwp(daily_consumption_kwh, sun_hours);
        let estimated_panels = ceil_units(required_power_kwp / s.quick_panel_kwp);
        let estimated_area_m2 = f64::from(estimated_panels) * s.panel_footprint_m2;
        let estimated_cost = required_power_kwp * s.quick_cost_per_kwp;
        let annual_savings =
            request.monthly_consumption_kwh * s.tariff_rate(request.tariff) * MONTHS_PER_YEAR;

        Ok(SolarQuickEstimate {
            daily_consumption_kwh,
            required_power_kwp,
            estimated_panels,
            estimated_area_m2,
            fits_available_area: estimated_area_m2 <= request.available_area_m2,
            estimated_cost,
            annual_savings,
            payback_years: estimated_cost / annual_savings,
            generation: self.generation(required_power_kwp, sun_hours),
        })
    }

    fn validate(&self, request: &SolarQuoteRequest) -> Result<(), QuoteError> {
        if !is_positive(request.monthly_consumption_kwh) {
            return Err(QuoteError::invalid_input(format!(
                "месячное потребление должно быть больше 0, получено {}",
                request.monthly_consumption_kwh
            )));
        }

        if !is_positive(request.available_area_m2) {
            return Err(QuoteError::invalid_input(format!(
                "доступная площадь должна быть больше 0, получено {}",
                request.available_area_m2
            )));
        }

        if request.battery_backup && request.battery_autonomy_hours == Some(0) {
            return Err(QuoteError::invalid_input(
                "автономность аккумуляторов должна быть больше 0 часов",
            ));
        }

        let s = &self.settings;
        if !is_positive(s.sun_hours(request.location.as_deref()))
            || !is_positive(s.system_efficiency)
            || s.system_efficiency > 1.0
        {
            return Err(QuoteError::invalid_input(
                "солнечные часы и КПД системы должны быть больше 0, КПД не больше 1",
            ));
        }

        if !is_positive(s.kwp_installed_per_day) || !is_positive(s.inverter_margin) {
            return Err(QuoteError::invalid_input(
                "темп монтажа и запас мощности инверторов должны быть больше 0",
            ));
        }

        if !is_positive(s.tariff_rate(request.tariff)) {
            return Err(QuoteError::invalid_input(format!(
                "ставка тарифа {} должна быть больше 0",
                request.tariff
            )));
        }

        Ok(())
    }

    fn required_power_kwp(&self, daily_consumption_kwh: f64, sun_hours: f64) -> f64 {
        daily_consumption_kwh / (sun_hours * self.settings.system_efficiency)
    }

    fn generation(&self, power_kwp: f64, sun_hours: f64) -> EnergyGeneration {
        let daily_kwh = power_kwp * sun_hours * self.settings.system_efficiency;
        EnergyGeneration {
            daily_kwh,
            monthly_kwh: daily_kwh * DAYS_PER_MONTH,
            annual_kwh: daily_kwh * DAYS_PER_YEAR,
        }
    }

    /// Экономия считается при полном самопотреблении выработки.
    fn economics(&self, request: &SolarQuoteRequest, total_investment: f64) -> SolarEconomics {
        let s = &self.settings;
        let tariff_rate = s.tariff_rate(request.tariff);
        let monthly_savings = request.monthly_consumption_kwh * tariff_rate;
        let annual_savings = monthly_savings * MONTHS_PER_YEAR;
        let lifetime_savings = annual_savings * f64::from(s.lifetime_years);

        SolarEconomics {
            tariff_rate,
            monthly_savings,
            annual_savings,
            payback_years: total_investment / annual_savings,
            roi_percentage: (lifetime_savings - total_investment) / total_investment * 100.0,
            lifetime_years: s.lifetime_years,
            maintenance_cost_annual: total_investment * s.maintenance_rate,
        }
    }

    /// Ёмкость = средняя часовая нагрузка × часы автономности.
    fn size_battery(
        &self,
        request: &SolarQuoteRequest,
        daily_consumption_kwh: f64,
        catalog: &Catalog,
    ) -> Result<BatterySizing, QuoteError> {
        let autonomy_hours = request
            .battery_autonomy_hours
            .unwrap_or(self.settings.default_autonomy_hours);
        let hourly_load_kwh = daily_consumption_kwh / HOURS_PER_DAY;
        let required_capacity_kwh = hourly_load_kwh * f64::from(autonomy_hours);

        let record = catalog
            .pick_battery(required_capacity_kwh)
            .ok_or_else(|| QuoteError::invalid_input("в каталоге нет пригодных аккумуляторов"))?;
        let count = ceil_units(required_capacity_kwh / record.capacity_kwh);

        Ok(BatterySizing {
            autonomy_hours,
            hourly_load_kwh,
            required_capacity_kwh,
            battery: record.selected(count),
            cost: f64::from(count) * record.unit_price,
        })
    }
}

/// Подобрать станцию с параметрами по умолчанию.
pub fn estimate_solar_system(
    request: &SolarQuoteRequest,
    catalog: &Catalog,
) -> Result<SolarSystemDesign, QuoteError> {
    SolarCalculator::default().design(request, catalog)
}

/// Быстрая оценка с параметрами по умолчанию.
pub fn quick_estimate(request: &SolarQuoteRequest) -> Result<SolarQuickEstimate, QuoteError> {
    SolarCalculator::default().quick_estimate(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PanelRecord;
    use commons::models::{InstallationType, PanelType, TariffCategory};

    fn request(monthly_consumption_kwh: f64) -> SolarQuoteRequest {
        SolarQuoteRequest {
            monthly_consumption_kwh,
            available_area_m2: 40.0,
            tariff: TariffCategory::Residential,
            installation: InstallationType::RoofResidential,
            location: None,
            battery_backup: false,
            battery_autonomy_hours: None,
            panel_preference: None,
            inverter_preference: None,
            customer: None,
        }
    }

    /// Каталог с одной панелью 500 Вт.
    fn catalog_500w() -> Catalog {
        let mut catalog = Catalog::fallback();
        catalog.panels = vec![PanelRecord {
            id: "p500".into(),
            brand: "Canadian Solar".into(),
            model: "HiKu7 500".into(),
            kind: PanelType::Monocrystalline,
            power_watts: 500.0,
            unit_price: 200_000.0,
            warranty_years: 25,
        }];
        catalog
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0), "{a} != {b}");
    }

    #[test]
    fn sizing_for_300_kwh() {
        let design = estimate_solar_system(&request(300.0), &catalog_500w()).unwrap();

        assert_close(design.required_power_kwp, 10.0 / (5.5 * 0.85));
        assert!((design.required_power_kwp - 2.1390).abs() < 1e-4);
        assert_eq!(design.panel_count, 5);
        assert_close(design.system_power_kwp, 2.5);
        assert_eq!(design.inverter_size_kw, 3);
        assert_eq!(design.inverter_count, 1);
        assert!(design.system_power_kwp >= design.required_power_kwp);
    }

    #[test]
    fn cost_formula() {
        let design = estimate_solar_system(&request(300.0), &catalog_500w()).unwrap();

        // Fronius 750 000 / 5 кВт = 150 000 за кВт; монтаж 200 000 за кВт·п.
        assert_close(design.costs.panels, 5.0 * 200_000.0);
        assert_close(design.costs.inverters, 3.0 * 150_000.0);
        assert_close(design.costs.installation, 2.5 * 200_000.0);
        assert_eq!(design.costs.batteries, 0.0);
        assert_close(design.costs.total, 1_000_000.0 + 450_000.0 + 500_000.0);
        assert!(design.battery.is_none());
    }

    #[test]
    fn economics_use_configured_lifetime() {
        let design = estimate_solar_system(&request(300.0), &catalog_500w()).unwrap();
        let e = design.economics;

        assert_eq!(e.tariff_rate, 45.0);
        assert_close(e.monthly_savings, 13_500.0);
        assert_close(e.annual_savings, 162_000.0);
        assert_close(e.payback_years, 1_950_000.0 / 162_000.0);
        assert_eq!(e.lifetime_years, 25);
        assert_close(
            e.roi_percentage,
            (162_000.0 * 25.0 - 1_950_000.0) / 1_950_000.0 * 100.0,
        );
        assert_close(e.maintenance_cost_annual, 19_500.0);
    }

    #[test]
    fn roi_changes_with_lifetime() {
        let mut settings = SolarSettings::default();
        settings.lifetime_years = 10;
        let short = SolarCalculator::new(settings)
            .design(&request(300.0), &catalog_500w())
            .unwrap();
        let long = estimate_solar_system(&request(300.0), &catalog_500w()).unwrap();

        assert!(short.economics.roi_percentage < long.economics.roi_percentage);
        assert_eq!(short.economics.payback_years, long.economics.payback_years);
    }

    #[test]
    fn generation_estimate() {
        let design = estimate_solar_system(&request(300.0), &catalog_500w()).unwrap();
        let daily = 2.5 * 5.5 * 0.85;

        assert_close(design.generation.daily_kwh, daily);
        assert_close(design.generation.monthly_kwh, daily * 30.0);
        assert_close(design.generation.annual_kwh, daily * 365.0);
        assert_eq!(design.system_efficiency, 0.85);
        assert_eq!(design.sun_hours_per_day, 5.5);
    }

    #[test]
    fn sunnier_location_needs_less_power() {
        let mut mendoza = request(300.0);
        mendoza.location = Some("Mendoza".to_string());
        let mut unknown = request(300.0);
        unknown.location = Some("atlantis".to_string());

        let sunny = estimate_solar_system(&mendoza, &catalog_500w()).unwrap();
        let default = estimate_solar_system(&unknown, &catalog_500w()).unwrap();

        assert_close(sunny.required_power_kwp, 10.0 / (6.2 * 0.85));
        assert!(sunny.required_power_kwp < default.required_power_kwp);
        assert_eq!(sunny.sun_hours_per_day, 6.2);
        assert_close(default.required_power_kwp, 10.0 / (5.5 * 0.85));

        let quick = quick_estimate(&mendoza).unwrap();
        assert_close(quick.required_power_kwp, sunny.required_power_kwp);
    }

    #[test]
    fn zero_sun_hours_for_location_is_rejected() {
        let mut settings = SolarSettings::default();
        settings.sun_hours_by_location.insert("polo_sur".to_string(), 0.0);
        let mut req = request(300.0);
        req.location = Some("Polo Sur".to_string());

        let err = SolarCalculator::new(settings)
            .design(&req, &catalog_500w())
            .unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput(_)));
    }

    #[test]
    fn battery_backup_sizing() {
        let mut req = request(300.0);
        req.battery_backup = true;

        let design = estimate_solar_system(&req, &catalog_500w()).unwrap();
        let battery = design.battery.unwrap();

        assert_eq!(battery.autonomy_hours, 8);
        assert_close(battery.hourly_load_kwh, 10.0 / 24.0);
        assert_close(battery.required_capacity_kwh, 10.0 / 24.0 * 8.0);
        assert_eq!(battery.battery.count, 1);
        assert_close(battery.cost, 4_500_000.0);
        assert_close(design.costs.batteries, 4_500_000.0);
        assert_close(design.costs.total, 1_950_000.0 + 4_500_000.0);
    }

    #[test]
    fn large_autonomy_needs_several_batteries() {
        let mut req = request(3_000.0);
        req.battery_backup = true;
        req.battery_autonomy_hours = Some(24);

        let design = estimate_solar_system(&req, &Catalog::fallback()).unwrap();
        // 100 кВт·ч в сутки / 13.5 кВт·ч → 8 батарей.
        assert_eq!(design.battery.unwrap().battery.count, 8);
    }

    #[test]
    fn zero_autonomy_is_rejected() {
        let mut req = request(300.0);
        req.battery_backup = true;
        req.battery_autonomy_hours = Some(0);
        assert!(estimate_solar_system(&req, &Catalog::fallback()).is_err());
    }

    #[test]
    fn invalid_consumption_and_area() {
        let catalog = Catalog::fallback();

        let err = estimate_solar_system(&request(0.0), &catalog).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput(_)));

        let mut req = request(300.0);
        req.available_area_m2 = 0.0;
        assert!(matches!(
            estimate_solar_system(&req, &catalog),
            Err(QuoteError::InvalidInput(_))
        ));

        req.available_area_m2 = -3.0;
        assert!(quick_estimate(&req).is_err());
    }

    #[test]
    fn empty_catalog_sections() {
        let mut catalog = Catalog::fallback();
        catalog.panels.clear();
        assert!(estimate_solar_system(&request(300.0), &catalog).is_err());

        let mut catalog = Catalog::fallback();
        catalog.mounting.clear();
        assert!(estimate_solar_system(&request(300.0), &catalog).is_err());

        let mut catalog = Catalog::fallback();
        catalog.batteries.clear();
        assert!(estimate_solar_system(&request(300.0), &catalog).is_ok());

        let mut req = request(300.0);
        req.battery_backup = true;
        assert!(estimate_solar_system(&req, &catalog).is_err());
    }

    #[test]
    fn area_fit_and_warranty() {
        let mut req = request(300.0);
        req.available_area_m2 = 9.0;

        let design = estimate_solar_system(&req, &catalog_500w()).unwrap();
        assert_close(design.required_area_m2, 10.0);
        assert!(!design.fits_available_area);
        assert_eq!(design.warranty_years, 10);
        assert_eq!(design.installation_time_days, 1);
    }

    #[test]
    fn tariff_category_affects_savings() {
        let mut req = request(300.0);
        req.tariff = TariffCategory::Industrial;
        let design = estimate_solar_system(&req, &catalog_500w()).unwrap();
        assert_close(design.economics.monthly_savings, 300.0 * 32.0);
    }

    #[test]
    fn quick_estimate_fields() {
        let estimate = quick_estimate(&request(300.0)).unwrap();
        let required = 10.0 / (5.5 * 0.85);

        assert_close(estimate.daily_consumption_kwh, 10.0);
        assert_close(estimate.required_power_kwp, required);
        // 2.139 / 0.4 = 5.35 → 6 панелей, по 2 м².
        assert_eq!(estimate.estimated_panels, 6);
        assert_close(estimate.estimated_area_m2, 12.0);
        assert!(estimate.fits_available_area);
        assert_close(estimate.estimated_cost, required * 800_000.0);
        assert_close(estimate.annual_savings, 300.0 * 45.0 * 12.0);
        assert_close(
            estimate.payback_years,
            required * 800_000.0 / (300.0 * 45.0 * 12.0),
        );
        assert_close(estimate.generation.daily_kwh, 10.0);
    }

    #[test]
    fn design_is_deterministic() {
        let mut req = request(812.0);
        req.battery_backup = true;
        let catalog = Catalog::fallback();

        assert_eq!(
            estimate_solar_system(&req, &catalog).unwrap(),
            estimate_solar_system(&req, &catalog).unwrap()
        );
    }
}
