//! События выдачи смет для фоновой обработки.

use crate::notify::{MailMessage, construction_mails, solar_mails};
use commons::errors::QuoteError;
use commons::lead::LeadRecord;
use commons::models::{
    ConstructionQuoteResult, IssuedQuote, SolarQuoteRequest, SolarSystemDesign,
};

/// Выданная клиенту смета, ожидающая сохранения и рассылки.
#[derive(Debug, Clone)]
pub enum QuoteEvent {
    Construction(IssuedQuote<ConstructionQuoteResult>),
    Solar {
        quote: IssuedQuote<SolarSystemDesign>,
        request: SolarQuoteRequest,
        /// Валюта каталога, по которому подобрана станция.
        currency: String,
        validity_days: u32,
    },
}

impl QuoteEvent {
    pub fn quote_id(&self) -> &str {
        match self {
            QuoteEvent::Construction(quote) => &quote.quote_id,
            QuoteEvent::Solar { quote, .. } => &quote.quote_id,
        }
    }

    /// Запись заявки для хранилища.
    pub fn lead(&self) -> LeadRecord {
        match self {
            QuoteEvent::Construction(quote) => {
                LeadRecord::construction(&quote.quote_id, quote.issued_at, &quote.result)
            }
            QuoteEvent::Solar { quote, request, .. } => LeadRecord::solar(
                &quote.quote_id,
                quote.issued_at,
                request.customer.as_ref(),
                request.location.as_deref(),
                &quote.result,
            ),
        }
    }

    /// Письма клиенту и отделу продаж.
    pub fn mails(&self, sales_email: &str) -> Result<Vec<MailMessage>, QuoteError> {
        match self {
            QuoteEvent::Construction(quote) => construction_mails(quote, sales_email),
            QuoteEvent::Solar {
                quote,
                request,
                currency,
                validity_days,
            } => solar_mails(
                quote,
                request.customer.as_ref(),
                currency,
                *validity_days,
                sales_email,
            ),
        }
    }
}
