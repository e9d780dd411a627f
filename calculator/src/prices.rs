//! Прайс-лист базовых ставок строительства.

use crate::is_positive;
use commons::errors::QuoteError;
use commons::models::ConstructionSystem;
use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "USD".to_string()
}

/// Базовые ставки за м² и метка источника.
///
/// Передаётся в каждый расчёт по ссылке и не изменяется калькулятором.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Лёгкий стальной каркас, за м².
    pub steel_frame_m2: f64,
    /// Промышленное здание, за м².
    pub industrial_m2: f64,
    /// Контейнер, за м².
    pub container_m2: f64,
    /// Справочно: материалы, за м².
    pub materials_m2: f64,
    /// Справочно: работы, за м².
    pub labor_m2: f64,
    /// Справочно: отделка, за м².
    pub finishes_m2: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Откуда получены ставки.
    pub source: String,
    /// Момент обновления, секунды UNIX (0, если неизвестно).
    #[serde(default)]
    pub last_updated: u64,
}

impl PriceTable {
    /// Встроенные ставки на случай недоступности всех источников.
    pub fn fallback() -> Self {
        Self {
            steel_frame_m2: 105.0,
            industrial_m2: 125.0,
            container_m2: 80.0,
            materials_m2: 45.0,
            labor_m2: 35.0,
            finishes_m2: 25.0,
            currency: default_currency(),
            source: "built-in defaults".to_string(),
            last_updated: 0,
        }
    }

    /// Базовая ставка для конструктивной системы.
    ///
    /// Для смешанной системы берётся среднее арифметическое ставок каркаса
    /// и промышленного здания.
    pub fn base_rate(&self, system: ConstructionSystem) -> f64 {
        match system {
            ConstructionSystem::SteelFrame => self.steel_frame_m2,
            ConstructionSystem::Industrial => self.industrial_m2,
            ConstructionSystem::Container => self.container_m2,
            ConstructionSystem::Mixed => (self.steel_frame_m2 + self.industrial_m2) / 2.0,
        }
    }

    /// Проверить, что все ставки конечны и строго положительны.
    pub fn validate(&self) -> Result<(), QuoteError> {
        let rates = [
            ("steel_frame_m2", self.steel_frame_m2),
            ("industrial_m2", self.industrial_m2),
            ("container_m2", self.container_m2),
            ("materials_m2", self.materials_m2),
            ("labor_m2", self.labor_m2),
            ("finishes_m2", self.finishes_m2),
        ];

        match rates.iter().find(|(_, rate)| !is_positive(*rate)) {
            Some((name, rate)) => Err(QuoteError::invalid_input(format!(
                "ставка {name} прайс-листа должна быть больше 0, получено {rate}"
            ))),
            None => Ok(()),
        }
    }
}
