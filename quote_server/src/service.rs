//! Выполнение команд: расчёт, выдача сметы и постановка её в обработку.

use crate::channels::publish;
use crate::models::QuoteEvent;
use crate::provider::PriceProvider;
use calculator::{Catalog, ConstructionCalculator, PriceTable, SolarCalculator};
use commons::errors::QuoteError;
use commons::models::{ConstructionQuoteRequest, IssuedQuote, SolarQuoteRequest};
use commons::randomizer::random_quote_id;
use commons::utils::{get_timestamp, valid_until};
use crossbeam_channel::Sender;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Текущие прайс-лист и каталог (ответ на `PRICES`).
#[derive(Debug, Serialize)]
struct PricesSnapshot {
    prices: PriceTable,
    catalog: Catalog,
}

/// Всё, что нужно обработчику клиента для выполнения команд.
pub struct QuoteService {
    pub construction: ConstructionCalculator,
    pub solar: SolarCalculator,
    pub prices: PriceProvider<PriceTable>,
    pub catalog: PriceProvider<Catalog>,
    pub events: Sender<QuoteEvent>,
    /// Срок действия солнечной сметы, дней.
    pub validity_days: u32,
}

/// Разобрать JSON-тело команды.
fn parse_payload<T: DeserializeOwned>(payload: &str) -> Result<T, QuoteError> {
    if payload.trim().is_empty() {
        return Err(QuoteError::command_err("отсутствует JSON-тело команды"));
    }
    serde_json::from_str(payload)
        .map_err(|err| QuoteError::invalid_input(format!("некорректный запрос: {err}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, QuoteError> {
    serde_json::to_string(value)
        .map_err(|err| QuoteError::value_err(format!("сериализация ответа: {err}")))
}

/// Обернуть результат в выданную смету.
fn issue<T>(result: T, validity_days: u32) -> IssuedQuote<T> {
    let issued_at = get_timestamp();
    IssuedQuote {
        quote_id: random_quote_id(),
        issued_at,
        valid_until: valid_until(issued_at, validity_days),
        result,
    }
}

impl QuoteService {
    /// Смета строительства. Возвращает JSON выданной сметы.
    pub fn construction(&self, payload: &str) -> Result<String, QuoteError> {
        let request: ConstructionQuoteRequest = parse_payload(payload)?;
        let prices = self.prices.current();
        let result = self.construction.compute(&request, &prices)?;

        let quote = issue(result, self.construction.settings().validity_days);
        let body = to_json(&quote)?;
        publish(&self.events, QuoteEvent::Construction(quote));

        Ok(body)
    }

    /// Проект солнечной станции. Возвращает JSON выданной сметы.
    pub fn solar(&self, payload: &str) -> Result<String, QuoteError> {
        let request: SolarQuoteRequest = parse_payload(payload)?;
        let catalog = self.catalog.current();
        let design = self.solar.design(&request, &catalog)?;

        let quote = issue(design, self.validity_days);
        let body = to_json(&quote)?;
        publish(
            &self.events,
            QuoteEvent::Solar {
                quote,
                request,
                currency: catalog.currency,
                validity_days: self.validity_days,
            },
        );

        Ok(body)
    }

    /// Быстрая оценка солнечной станции. Заявка не создаётся.
    pub fn estimate(&self, payload: &str) -> Result<String, QuoteError> {
        let request: SolarQuoteRequest = parse_payload(payload)?;
        to_json(&self.solar.quick_estimate(&request)?)
    }

    /// Действующие прайс-лист и каталог.
    pub fn prices(&self) -> Result<String, QuoteError> {
        to_json(&PricesSnapshot {
            prices: self.prices.current(),
            catalog: self.catalog.current(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::JsonFileSource;
    use commons::models::{ConstructionQuoteResult, SolarQuickEstimate, SolarSystemDesign};
    use crossbeam_channel::{Receiver, unbounded};
    use std::time::Duration;

    /// Сервис на встроенных данных: источники указывают на несуществующие файлы.
    pub(crate) fn offline_service() -> (QuoteService, Receiver<QuoteEvent>) {
        let (tx, rx) = unbounded();
        let timeout = Duration::from_millis(200);
        let service = QuoteService {
            construction: ConstructionCalculator::default(),
            solar: SolarCalculator::default(),
            prices: PriceProvider::new(
                JsonFileSource::new("/nonexistent/prices.json"),
                Duration::from_secs(60),
                timeout,
            ),
            catalog: PriceProvider::new(
                JsonFileSource::new("/nonexistent/solar_catalog.json"),
                Duration::from_secs(60),
                timeout,
            ),
            events: tx,
            validity_days: 30,
        };
        (service, rx)
    }

    const CONSTRUCTION: &str = r#"{"system":"steel_frame","usage":"residential","finish":"basic","area_m2":100,"province":"buenos_aires"}"#;
    const SOLAR: &str = r#"{"monthly_consumption_kwh":300,"available_area_m2":40,"tariff":"residencial","installation":"roof_residential"}"#;

    #[test]
    fn construction_is_issued_and_published() {
        let (service, rx) = offline_service();

        let body = service.construction(CONSTRUCTION).unwrap();
        let quote: IssuedQuote<ConstructionQuoteResult> = serde_json::from_str(&body).unwrap();

        assert_eq!(quote.result.total, 10_500.0);
        assert_eq!(quote.result.price_source, "built-in defaults");
        assert_eq!(quote.quote_id.len(), 12);
        assert_eq!(quote.valid_until - quote.issued_at, 30 * 86_400);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.quote_id(), quote.quote_id);
    }

    #[test]
    fn solar_is_issued_and_published() {
        let (service, rx) = offline_service();

        let body = service.solar(SOLAR).unwrap();
        let quote: IssuedQuote<SolarSystemDesign> = serde_json::from_str(&body).unwrap();

        // Панели 400 Вт: 2.139 / 0.4 → 6 шт.
        assert_eq!(quote.result.panel_count, 6);
        match rx.try_recv().unwrap() {
            QuoteEvent::Solar { currency, .. } => assert_eq!(currency, "ARS"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn estimate_creates_no_lead() {
        let (service, rx) = offline_service();

        let body = service.estimate(SOLAR).unwrap();
        let estimate: SolarQuickEstimate = serde_json::from_str(&body).unwrap();

        assert_eq!(estimate.estimated_panels, 6);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalid_requests() {
        let (service, rx) = offline_service();

        let err = service.construction("").unwrap_err();
        assert!(matches!(err, QuoteError::CommandError(_)));

        let err = service.construction("{\"system\":\"wood\"}").unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput(_)));

        let zero_area = CONSTRUCTION.replace("\"area_m2\":100", "\"area_m2\":0");
        let err = service.construction(&zero_area).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidInput(_)));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn prices_snapshot() {
        let (service, _rx) = offline_service();

        let body = service.prices().unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(value["prices"]["steel_frame_m2"], 105.0);
        assert_eq!(value["catalog"]["currency"], "ARS");
    }
}
