//! Плоская запись заявки для внешнего хранилища (CRM).
//!
//! Запись сериализуется в одну строку с полями, разделёнными `|`
//! (derive [`QuoteDisplay`]), и читается обратно через `FromStr`.

use crate::errors::QuoteError;
use crate::models::{ConstructionQuoteResult, CustomerContact, SolarSystemDesign};
use macros::{QuoteDisplay, QuoteEnumDisplay};
use serde::{Deserialize, Serialize};

/// Вид сметы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, QuoteEnumDisplay, Serialize, Deserialize)]
pub enum QuoteKind {
    #[str("construction")]
    Construction,
    #[str("solar")]
    Solar,
}

/// Статус заявки в CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, QuoteEnumDisplay, Serialize, Deserialize)]
pub enum LeadStatus {
    /// Новая смета, с клиентом ещё не связывались.
    #[str("new_quote", "nueva_cotizacion")]
    NewQuote,
    #[str("contacted")]
    Contacted,
    #[str("closed")]
    Closed,
}

/// Запись заявки: клиент + краткое содержание сметы.
#[derive(Debug, Clone, PartialEq, QuoteDisplay)]
pub struct LeadRecord {
    pub quote_id: String,
    /// Момент выдачи сметы, секунды UNIX.
    pub issued_at: u64,
    pub kind: QuoteKind,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Провинция или населённый пункт.
    pub location: String,
    /// Краткое описание объекта.
    pub summary: String,
    pub total: f64,
    pub status: LeadStatus,
}

/// Привести текст к виду, безопасному для строкового формата записи.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '|' => '/',
            '\r' | '\n' => ' ',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

impl LeadRecord {
    /// Общая часть конструкторов: контакты клиента.
    fn contact_fields(customer: Option<&CustomerContact>) -> (String, String, String) {
        match customer {
            Some(c) => (
                sanitize(&c.name),
                sanitize(c.email.as_deref().unwrap_or_default()),
                sanitize(c.phone.as_deref().unwrap_or_default()),
            ),
            None => (String::new(), String::new(), String::new()),
        }
    }

    /// Сформировать запись по смете строительства.
    pub fn construction(quote_id: &str, issued_at: u64, result: &ConstructionQuoteResult) -> Self {
        let request = &result.request;
        let (name, email, phone) = Self::contact_fields(request.customer.as_ref());
        let summary = format!(
            "{} {} {} {}m2 {} floor(s)",
            request.system, request.usage, request.finish, request.area_m2, request.floors
        );

        Self {
            quote_id: sanitize(quote_id),
            issued_at,
            kind: QuoteKind::Construction,
            name,
            email,
            phone,
            location: sanitize(&request.province),
            summary: sanitize(&summary),
            total: result.total,
            status: LeadStatus::NewQuote,
        }
    }

    /// Сформировать запись по проекту солнечной станции.
    pub fn solar(
        quote_id: &str,
        issued_at: u64,
        customer: Option<&CustomerContact>,
        location: Option<&str>,
        design: &SolarSystemDesign,
    ) -> Self {
        let (name, email, phone) = Self::contact_fields(customer);
        let summary = format!(
            "{:.2} kWp {} panels {} inverter(s){}",
            design.system_power_kwp,
            design.panel_count,
            design.inverter_count,
            if design.battery.is_some() { " +battery" } else { "" }
        );

        Self {
            quote_id: sanitize(quote_id),
            issued_at,
            kind: QuoteKind::Solar,
            name,
            email,
            phone,
            location: sanitize(location.unwrap_or_default()),
            summary: sanitize(&summary),
            total: design.costs.total,
            status: LeadStatus::NewQuote,
        }
    }
}
