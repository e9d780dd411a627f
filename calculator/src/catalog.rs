//! Каталог оборудования солнечных станций и правила выбора позиций.

use crate::is_positive;
use commons::errors::QuoteError;
use commons::models::{InverterType, PanelType, SelectedEquipment};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

fn default_currency() -> String {
    "ARS".to_string()
}

/// Солнечная панель.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRecord {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub kind: PanelType,
    /// Номинальная мощность, Вт.
    pub power_watts: f64,
    pub unit_price: f64,
    pub warranty_years: u32,
}

impl PanelRecord {
    /// Мощность в кВт·п.
    pub fn power_kwp(&self) -> f64 {
        self.power_watts / 1000.0
    }

    fn is_usable(&self) -> bool {
        is_positive(self.power_watts) && self.unit_price >= 0.0
    }

    pub fn selected(&self, count: u32) -> SelectedEquipment {
        SelectedEquipment {
            brand: self.brand.clone(),
            model: self.model.clone(),
            unit_rating: self.power_kwp(),
            unit_price: self.unit_price,
            count,
            warranty_years: self.warranty_years,
        }
    }
}

/// Инвертор.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverterRecord {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub kind: InverterType,
    /// Номинальная мощность, кВт.
    pub power_kw: f64,
    pub unit_price: f64,
    pub warranty_years: u32,
}

impl InverterRecord {
    /// Стоимость одного кВт инверторной мощности.
    pub fn cost_per_kw(&self) -> f64 {
        self.unit_price / self.power_kw
    }

    fn is_usable(&self) -> bool {
        is_positive(self.power_kw) && self.unit_price >= 0.0
    }

    pub fn selected(&self, count: u32) -> SelectedEquipment {
        SelectedEquipment {
            brand: self.brand.clone(),
            model: self.model.clone(),
            unit_rating: self.power_kw,
            unit_price: self.unit_price,
            count,
            warranty_years: self.warranty_years,
        }
    }
}

/// Аккумуляторная батарея.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryRecord {
    pub id: String,
    pub brand: String,
    pub model: String,
    /// Ёмкость, кВт·ч.
    pub capacity_kwh: f64,
    pub unit_price: f64,
    pub warranty_years: u32,
}

impl BatteryRecord {
    fn is_usable(&self) -> bool {
        is_positive(self.capacity_kwh) && self.unit_price >= 0.0
    }

    pub fn selected(&self, count: u32) -> SelectedEquipment {
        SelectedEquipment {
            brand: self.brand.clone(),
            model: self.model.clone(),
            unit_rating: self.capacity_kwh,
            unit_price: self.unit_price,
            count,
            warranty_years: self.warranty_years,
        }
    }
}

/// Монтажная система.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountingRecord {
    pub id: String,
    pub brand: String,
    pub model: String,
    /// Стоимость конструкции на кВт·п.
    pub price_per_kwp: f64,
    /// Стоимость работ на кВт·п.
    pub installation_cost_per_kwp: f64,
    pub warranty_years: u32,
}

impl MountingRecord {
    /// Полная стоимость монтажа на кВт·п: конструкция и работы.
    pub fn installed_cost_per_kwp(&self) -> f64 {
        self.price_per_kwp + self.installation_cost_per_kwp
    }

    fn is_usable(&self) -> bool {
        self.price_per_kwp >= 0.0 && self.installation_cost_per_kwp >= 0.0
    }
}

/// Каталог оборудования.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub panels: Vec<PanelRecord>,
    #[serde(default)]
    pub inverters: Vec<InverterRecord>,
    #[serde(default)]
    pub batteries: Vec<BatteryRecord>,
    #[serde(default)]
    pub mounting: Vec<MountingRecord>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub source: String,
    #[serde(default)]
    pub last_updated: u64,
}

impl Catalog {
    /// Встроенный каталог на случай недоступности источника.
    pub fn fallback() -> Self {
        Self {
            panels: vec![
                PanelRecord {
                    id: "panel_default_1".into(),
                    brand: "JinkoSolar".into(),
                    model: "JKM400M-54HL4-B".into(),
                    kind: PanelType::Monocrystalline,
                    power_watts: 400.0,
                    unit_price: 180_000.0,
                    warranty_years: 25,
                },
                PanelRecord {
                    id: "panel_default_2".into(),
                    brand: "Trina Solar".into(),
                    model: "TSM-400DE14A(II)".into(),
                    kind: PanelType::Monocrystalline,
                    power_watts: 400.0,
                    unit_price: 175_000.0,
                    warranty_years: 25,
                },
            ],
            inverters: vec![
                InverterRecord {
                    id: "inverter_default_1".into(),
                    brand: "SMA".into(),
                    model: "STP 5000TL-20".into(),
                    kind: InverterType::StringInverter,
                    power_kw: 5.0,
                    unit_price: 800_000.0,
                    warranty_years: 10,
                },
                InverterRecord {
                    id: "inverter_default_2".into(),
                    brand: "Fronius".into(),
                    model: "Primo 5.0-1".into(),
                    kind: InverterType::StringInverter,
                    power_kw: 5.0,
                    unit_price: 750_000.0,
                    warranty_years: 10,
                },
            ],
            batteries: vec![BatteryRecord {
                id: "battery_default_1".into(),
                brand: "Tesla".into(),
                model: "Powerwall 2".into(),
                capacity_kwh: 13.5,
                unit_price: 4_500_000.0,
                warranty_years: 10,
            }],
            mounting: vec![MountingRecord {
                id: "mounting_default_1".into(),
                brand: "Schletter".into(),
                model: "FS-R".into(),
                price_per_kwp: 150_000.0,
                installation_cost_per_kwp: 50_000.0,
                warranty_years: 10,
            }],
            currency: default_currency(),
            source: "built-in defaults".to_string(),
            last_updated: 0,
        }
    }

    /// Панель предпочтительной технологии (иначе любой) с наибольшей
    /// мощностью; при равной мощности берётся более дешёвая.
    pub fn pick_panel(&self, preference: Option<PanelType>) -> Option<&PanelRecord> {
        let usable = || self.panels.iter().filter(|p| p.is_usable());
        let preferred = preference.and_then(|kind| {
            usable()
                .filter(|p| p.kind == kind)
                .max_by(|a, b| compare_panels(a, b))
        });
        preferred.or_else(|| usable().max_by(|a, b| compare_panels(a, b)))
    }

    /// Инвертор предпочтительного типа (иначе любой): наименьший,
    /// покрывающий `size_kw`, а если такого нет, наибольший.
    pub fn pick_inverter(
        &self,
        preference: Option<InverterType>,
        size_kw: f64,
    ) -> Option<&InverterRecord> {
        let usable: Vec<&InverterRecord> =
            self.inverters.iter().filter(|i| i.is_usable()).collect();
        let preferred: Vec<&InverterRecord> = match preference {
            Some(kind) => usable.iter().copied().filter(|i| i.kind == kind).collect(),
            None => Vec::new(),
        };
        let candidates = if preferred.is_empty() { usable } else { preferred };

        smallest_covering(candidates, size_kw, |i| i.power_kw, |i| i.unit_price)
    }

    /// Батарея: наименьшая, покрывающая `capacity_kwh`, иначе наибольшая.
    pub fn pick_battery(&self, capacity_kwh: f64) -> Option<&BatteryRecord> {
        let usable: Vec<&BatteryRecord> =
            self.batteries.iter().filter(|b| b.is_usable()).collect();
        smallest_covering(usable, capacity_kwh, |b| b.capacity_kwh, |b| b.unit_price)
    }

    /// Проверить, что по каталогу можно подобрать станцию: нужна хотя бы
    /// одна пригодная панель, инвертор и монтажная система. Батареи
    /// необязательны.
    pub fn validate(&self) -> Result<(), QuoteError> {
        let missing = if !self.panels.iter().any(PanelRecord::is_usable) {
            Some("панелей")
        } else if !self.inverters.iter().any(InverterRecord::is_usable) {
            Some("инверторов")
        } else if !self.mounting.iter().any(MountingRecord::is_usable) {
            Some("монтажных систем")
        } else {
            None
        };

        match missing {
            Some(section) => Err(QuoteError::invalid_input(format!(
                "в каталоге {} нет пригодных {section}",
                self.source
            ))),
            None => Ok(()),
        }
    }

    /// Первая пригодная монтажная система.
    pub fn pick_mounting(&self) -> Option<&MountingRecord> {
        self.mounting.iter().find(|m| m.is_usable())
    }
}

fn compare_panels(a: &PanelRecord, b: &PanelRecord) -> Ordering {
    a.power_watts
        .total_cmp(&b.power_watts)
        .then_with(|| b.unit_price.total_cmp(&a.unit_price))
}

/// Наименьшая позиция с номиналом не ниже `required` (при равенстве
/// более дешёвая), иначе позиция с наибольшим номиналом.
fn smallest_covering<'a, T>(
    candidates: Vec<&'a T>,
    required: f64,
    rating: impl Fn(&T) -> f64,
    price: impl Fn(&T) -> f64,
) -> Option<&'a T> {
    let covering = candidates
        .iter()
        .copied()
        .filter(|c| rating(c) >= required)
        .min_by(|a, b| {
            rating(a)
                .total_cmp(&rating(b))
                .then_with(|| price(a).total_cmp(&price(b)))
        });

    covering.or_else(|| {
        candidates.iter().copied().max_by(|a, b| {
            rating(a)
                .total_cmp(&rating(b))
                .then_with(|| price(b).total_cmp(&price(a)))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_picks_cheaper_of_equal_panels() {
        let catalog = Catalog::fallback();
        let panel = catalog.pick_panel(None).unwrap();
        assert_eq!(panel.brand, "Trina Solar");
        assert_eq!(panel.power_kwp(), 0.4);
    }

    #[test]
    fn preferred_panel_type_with_fallback() {
        let mut catalog = Catalog::fallback();
        catalog.panels.push(PanelRecord {
            id: "bifacial".into(),
            brand: "LONGi".into(),
            model: "Hi-MO 5".into(),
            kind: PanelType::Bifacial,
            power_watts: 350.0,
            unit_price: 200_000.0,
            warranty_years: 30,
        });

        let bifacial = catalog.pick_panel(Some(PanelType::Bifacial)).unwrap();
        assert_eq!(bifacial.brand, "LONGi");

        // Нет поликристаллических, выбирается лучшая из любых.
        let any = catalog.pick_panel(Some(PanelType::Polycrystalline)).unwrap();
        assert_eq!(any.power_watts, 400.0);
    }

    #[test]
    fn inverter_smallest_covering_then_largest() {
        let mut catalog = Catalog::fallback();
        catalog.inverters.push(InverterRecord {
            id: "big".into(),
            brand: "Huawei".into(),
            model: "SUN2000-10KTL".into(),
            kind: InverterType::StringInverter,
            power_kw: 10.0,
            unit_price: 1_400_000.0,
            warranty_years: 10,
        });

        let small = catalog.pick_inverter(None, 3.0).unwrap();
        assert_eq!(small.brand, "Fronius");

        let big = catalog.pick_inverter(None, 7.0).unwrap();
        assert_eq!(big.power_kw, 10.0);

        let oversized = catalog.pick_inverter(None, 25.0).unwrap();
        assert_eq!(oversized.power_kw, 10.0);
    }

    #[test]
    fn inverter_preference_falls_back_to_any() {
        let catalog = Catalog::fallback();
        let inverter = catalog.pick_inverter(Some(InverterType::Micro), 3.0);
        assert!(inverter.is_some());
    }

    #[test]
    fn unusable_records_are_skipped() {
        let mut catalog = Catalog::fallback();
        for panel in catalog.panels.iter_mut() {
            panel.power_watts = 0.0;
        }
        assert!(catalog.pick_panel(None).is_none());
    }

    #[test]
    fn battery_pick() {
        let catalog = Catalog::fallback();
        assert_eq!(catalog.pick_battery(3.3).unwrap().model, "Powerwall 2");
        assert_eq!(catalog.pick_battery(40.0).unwrap().model, "Powerwall 2");
        assert!(Catalog { batteries: vec![], ..Catalog::fallback() }
            .pick_battery(1.0)
            .is_none());
    }

    #[test]
    fn mounting_cost_per_kwp() {
        let catalog = Catalog::fallback();
        assert_eq!(catalog.pick_mounting().unwrap().installed_cost_per_kwp(), 200_000.0);
    }

    #[test]
    fn fallback_is_valid() {
        assert!(Catalog::fallback().validate().is_ok());
    }

    #[test]
    fn incomplete_catalog_is_invalid() {
        let empty: Catalog = serde_json::from_str(r#"{"source": "x"}"#).unwrap();
        assert!(matches!(empty.validate(), Err(QuoteError::InvalidInput(_))));

        let no_mounting = Catalog {
            mounting: vec![],
            ..Catalog::fallback()
        };
        assert!(no_mounting.validate().is_err());

        let no_batteries = Catalog {
            batteries: vec![],
            ..Catalog::fallback()
        };
        assert!(no_batteries.validate().is_ok());
    }

    #[test]
    fn catalog_from_json() {
        let json = r#"{
            "panels": [{"id": "p1", "brand": "B", "model": "M", "kind": "monocristalino",
                        "power_watts": 500.0, "unit_price": 200000.0, "warranty_years": 25}],
            "source": "nocodb"
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();

        assert_eq!(catalog.panels[0].kind, PanelType::Monocrystalline);
        assert!(catalog.inverters.is_empty());
        assert_eq!(catalog.currency, "ARS");
    }
}
