//! Письма клиенту и отделу продаж.
//!
//! Письма формируются в HTML и передаются [`Notifier`]. К письму
//! прикладывается смета в PDF, отделу продаж также её JSON для CRM.
//! В поставке используется [`OutboxNotifier`], который складывает письма
//! в каталог для последующей отправки почтовым агентом.

use crate::pdf::{DocLine, QuoteDocument};
use commons::errors::QuoteError;
use commons::models::{
    ConstructionQuoteResult, CustomerContact, IssuedQuote, SolarSystemDesign,
};
use commons::utils::round_to;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

/// MIME-тип PDF-вложения.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
/// MIME-тип JSON-вложения.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Вложение письма.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Vec<u8>,
}

/// Подготовленное письмо.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub quote_id: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Отправитель писем.
pub trait Notifier: Send {
    fn send(&mut self, message: &MailMessage) -> Result<(), QuoteError>;
}

/// Каталог исходящих писем: по файлу на письмо.
#[derive(Debug)]
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write(&self, filename: &str, content: &[u8]) -> Result<(), QuoteError> {
        let path = self.dir.join(filename);
        fs::write(&path, content)
            .map_err(|err| QuoteError::notify_err(format!("{}: {err}", path.display())))
    }
}

impl Notifier for OutboxNotifier {
    fn send(&mut self, message: &MailMessage) -> Result<(), QuoteError> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| QuoteError::notify_err(format!("{}: {err}", self.dir.display())))?;

        let stem = format!("{}-{}", message.quote_id, file_slug(&message.to));
        let mut envelope = format!(
            "To: {}\nSubject: {}\nContent-Type: text/html; charset=utf-8\n",
            message.to, message.subject
        );
        for attachment in &message.attachments {
            let name = format!("{stem}-{}", attachment.filename);
            let _ = writeln!(envelope, "X-Attachment: {name}; type={}", attachment.content_type);
            self.write(&name, &attachment.content)?;
        }
        envelope.push('\n');
        envelope.push_str(&message.html);

        self.write(&format!("{stem}.eml"), envelope.as_bytes())
    }
}

/// Адрес в виде, пригодном для имени файла.
fn file_slug(address: &str) -> String {
    address
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Экранирование текста для HTML.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Сумма с разделителями разрядов и двумя знаками: `1,234,567.89`.
fn money(value: f64) -> String {
    let cents = (round_to(value, 2) * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let digits = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}.{:02}", cents % 100)
}

/// Содержимое письма: заголовок, строки таблицы и примечания.
struct MailBody<'a> {
    title: &'a str,
    greeting: String,
    rows: Vec<(&'a str, String)>,
    total: String,
    notes: &'a [String],
    validity_days: u32,
}

impl MailBody<'_> {
    fn render(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<html><body style=\"font-family: Arial, sans-serif; line-height: 1.6\">\
             <h1>{}</h1><p>{}</p><table>",
            escape_html(self.title),
            escape_html(&self.greeting)
        );
        for (label, value) in &self.rows {
            let _ = write!(
                html,
                "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
                escape_html(label),
                escape_html(value)
            );
        }
        let _ = write!(
            html,
            "</table><p><strong>Total: {}</strong></p>",
            escape_html(&self.total)
        );
        if !self.notes.is_empty() {
            html.push_str("<ul>");
            for note in self.notes {
                let _ = write!(html, "<li>{}</li>", escape_html(note));
            }
            html.push_str("</ul>");
        }
        let _ = write!(
            html,
            "<p>This quote is valid for {} days from the issue date.</p></body></html>",
            self.validity_days
        );
        html
    }

    /// PDF-документ с теми же данными, что и письмо.
    fn document(&self, customer: Option<&CustomerContact>, sales_email: &str) -> QuoteDocument {
        let mut lines = vec![DocLine::Heading("Customer".to_string())];
        match customer {
            Some(c) => {
                lines.push(DocLine::Row("Name".to_string(), c.name.clone()));
                lines.push(DocLine::Row(
                    "Email".to_string(),
                    c.email.clone().unwrap_or_else(|| "-".to_string()),
                ));
                lines.push(DocLine::Row(
                    "Phone".to_string(),
                    c.phone.clone().unwrap_or_else(|| "-".to_string()),
                ));
            }
            None => lines.push(DocLine::Text("No contact data".to_string())),
        }

        lines.push(DocLine::Heading("Quote summary".to_string()));
        lines.extend(
            self.rows
                .iter()
                .map(|(label, value)| DocLine::Row(label.to_string(), value.clone())),
        );
        lines.push(DocLine::Total(format!("Total: {}", self.total)));

        if !self.notes.is_empty() {
            lines.push(DocLine::Heading("Notes".to_string()));
            lines.extend(self.notes.iter().map(|n| DocLine::Text(format!("- {n}"))));
        }

        lines.push(DocLine::Heading("Conditions".to_string()));
        lines.push(DocLine::Text(format!(
            "- This quote is valid for {} days from the issue date",
            self.validity_days
        )));
        lines.push(DocLine::Text(
            "- Prices are subject to change without notice".to_string(),
        ));
        lines.push(DocLine::Text(format!("- Contact: {sales_email}")));

        QuoteDocument {
            title: self.title.to_string(),
            lines,
        }
    }
}

/// Копия сметы в JSON для вложения.
fn json_attachment<T: Serialize>(quote: &IssuedQuote<T>) -> Result<Attachment, QuoteError> {
    let content = serde_json::to_string_pretty(quote)
        .map_err(|err| QuoteError::notify_err(format!("сериализация сметы: {err}")))?;
    Ok(Attachment {
        filename: "quote.json".to_string(),
        content_type: JSON_CONTENT_TYPE,
        content: content.into_bytes(),
    })
}

/// Письмо клиенту (если указан email) и письмо в отдел продаж.
fn address_mails(
    quote_id: &str,
    customer: Option<&CustomerContact>,
    sales_email: &str,
    subject: String,
    body: MailBody,
    json: Attachment,
) -> Result<Vec<MailMessage>, QuoteError> {
    let html = body.render();
    let pdf = Attachment {
        filename: "quote.pdf".to_string(),
        content_type: PDF_CONTENT_TYPE,
        content: body.document(customer, sales_email).render()?,
    };
    let mut mails = Vec::with_capacity(2);

    if let Some(email) = customer
        .and_then(|c| c.email.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        mails.push(MailMessage {
            quote_id: quote_id.to_string(),
            to: email.to_string(),
            subject: subject.clone(),
            html: html.clone(),
            attachments: vec![pdf.clone()],
        });
    }

    let contact = customer
        .map(|c| {
            format!(
                "{} / {} / {}",
                c.name,
                c.email.as_deref().unwrap_or("-"),
                c.phone.as_deref().unwrap_or("-")
            )
        })
        .unwrap_or_else(|| "no contact data".to_string());
    mails.push(MailMessage {
        quote_id: quote_id.to_string(),
        to: sales_email.to_string(),
        subject: format!("[lead {quote_id}] {subject}"),
        html: format!("<p>Customer: {}</p>{html}", escape_html(&contact)),
        attachments: vec![pdf, json],
    });

    Ok(mails)
}

fn customer_name(customer: Option<&CustomerContact>) -> String {
    customer
        .map(|c| c.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or("customer")
        .to_string()
}

/// Письма по смете строительства.
pub fn construction_mails(
    quote: &IssuedQuote<ConstructionQuoteResult>,
    sales_email: &str,
) -> Result<Vec<MailMessage>, QuoteError> {
    let result = &quote.result;
    let request = &result.request;
    let customer = request.customer.as_ref();
    let name = customer_name(customer);

    let body = MailBody {
        title: "Construction quote",
        greeting: format!("Dear {name}, here is the quote prepared from your data."),
        rows: vec![
            ("Quote", quote.quote_id.clone()),
            ("Construction system", request.system.to_string()),
            ("Usage", request.usage.to_string()),
            ("Finish", request.finish.to_string()),
            ("Area", format!("{} m²", request.area_m2)),
            ("Province", request.province.clone()),
            ("Price per m²", format!("{} {}", result.currency, money(result.price_per_m2))),
            ("Materials", money(result.breakdown.materials)),
            ("Labor", money(result.breakdown.labor)),
            ("Finishes", money(result.breakdown.finishes)),
            ("Installations", money(result.breakdown.installations)),
            ("Transport", money(result.breakdown.transport)),
            ("Taxes", money(result.breakdown.taxes)),
            ("Estimated duration", result.duration.to_string()),
        ],
        total: format!("{} {}", result.currency, money(result.total)),
        notes: &result.notes,
        validity_days: result.validity_days,
    };

    address_mails(
        &quote.quote_id,
        customer,
        sales_email,
        format!("Construction quote - {name}"),
        body,
        json_attachment(quote)?,
    )
}

/// Письма по проекту солнечной станции.
pub fn solar_mails(
    quote: &IssuedQuote<SolarSystemDesign>,
    customer: Option<&CustomerContact>,
    currency: &str,
    validity_days: u32,
    sales_email: &str,
) -> Result<Vec<MailMessage>, QuoteError> {
    let design = &quote.result;
    let name = customer_name(customer);

    let mut rows = vec![
        ("Quote", quote.quote_id.clone()),
        ("System power", format!("{:.2} kWp", design.system_power_kwp)),
        ("Sun hours", format!("{:.1} h/day", design.sun_hours_per_day)),
        (
            "Panels",
            format!("{} x {} {}", design.panel_count, design.panel.brand, design.panel.model),
        ),
        (
            "Inverters",
            format!(
                "{} x {} {} ({} kW)",
                design.inverter_count, design.inverter.brand, design.inverter.model, design.inverter_size_kw
            ),
        ),
        (
            "Annual generation",
            format!("{:.0} kWh", design.generation.annual_kwh),
        ),
        (
            "Annual savings",
            format!("{currency} {}", money(design.economics.annual_savings)),
        ),
        (
            "Payback",
            format!("{:.1} years", design.economics.payback_years),
        ),
        ("Required area", format!("{:.1} m²", design.required_area_m2)),
    ];
    if let Some(battery) = &design.battery {
        rows.push((
            "Batteries",
            format!(
                "{} x {} {} ({} h autonomy)",
                battery.battery.count, battery.battery.brand, battery.battery.model, battery.autonomy_hours
            ),
        ));
    }

    let body = MailBody {
        title: "Solar installation quote",
        greeting: format!("Dear {name}, here is the solar system sized for your consumption."),
        rows,
        total: format!("{currency} {}", money(design.costs.total)),
        notes: &[],
        validity_days,
    };

    address_mails(
        &quote.quote_id,
        customer,
        sales_email,
        format!("Solar installation quote - {name}"),
        body,
        json_attachment(quote)?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use calculator::{Catalog, PriceTable, compute_construction_breakdown, estimate_solar_system};
    use commons::models::{
        ConstructionQuoteRequest, ConstructionSystem, FinishLevel, InstallationType,
        SolarQuoteRequest, TariffCategory, UsageType,
    };

    fn contact(email: Option<&str>) -> CustomerContact {
        CustomerContact {
            name: "Ana <Pérez>".to_string(),
            email: email.map(str::to_string),
            phone: None,
        }
    }

    fn construction_quote(customer: Option<CustomerContact>) -> IssuedQuote<ConstructionQuoteResult> {
        let request = ConstructionQuoteRequest {
            system: ConstructionSystem::SteelFrame,
            usage: UsageType::Residential,
            finish: FinishLevel::Basic,
            area_m2: 100.0,
            province: "buenos_aires".to_string(),
            floors: 1,
            has_terrace: false,
            has_basement: false,
            utilities_included: true,
            customer,
        };
        IssuedQuote {
            quote_id: "0123456789ab".to_string(),
            issued_at: 1_760_000_000,
            valid_until: 1_762_592_000,
            result: compute_construction_breakdown(&request, &PriceTable::fallback()).unwrap(),
        }
    }

    #[test]
    fn money_format() {
        assert_eq!(money(10500.0), "10,500.00");
        assert_eq!(money(1_234_567.891), "1,234,567.89");
        assert_eq!(money(999.5), "999.50");
        assert_eq!(money(0.0), "0.00");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<b>\"x\" & 'y'"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;");
    }

    #[test]
    fn customer_and_sales_copies() {
        let quote = construction_quote(Some(contact(Some("ana@example.com"))));
        let mails = construction_mails(&quote, "ventas@example.com").unwrap();

        assert_eq!(mails.len(), 2);
        assert_eq!(mails[0].to, "ana@example.com");
        assert_eq!(mails[1].to, "ventas@example.com");
        assert!(mails[1].subject.contains("0123456789ab"));
        assert!(mails[0].html.contains("10,500.00"));
        assert!(mails[0].html.contains("Ana &lt;Pérez&gt;"));
        assert!(!mails[0].html.contains("<Pérez>"));
    }

    #[test]
    fn sales_copy_only_without_email() {
        let quote = construction_quote(Some(contact(Some("   "))));
        let mails = construction_mails(&quote, "ventas@example.com").unwrap();
        assert_eq!(mails.len(), 1);

        let quote = construction_quote(None);
        let mails = construction_mails(&quote, "ventas@example.com").unwrap();
        assert_eq!(mails.len(), 1);
        assert!(mails[0].html.contains("no contact data"));
    }

    #[test]
    fn solar_mail_lists_battery() {
        let request = SolarQuoteRequest {
            monthly_consumption_kwh: 300.0,
            available_area_m2: 40.0,
            tariff: TariffCategory::Residential,
            installation: InstallationType::RoofResidential,
            location: Some("Mendoza".to_string()),
            battery_backup: true,
            battery_autonomy_hours: None,
            panel_preference: None,
            inverter_preference: None,
            customer: None,
        };
        let quote = IssuedQuote {
            quote_id: "ba9876543210".to_string(),
            issued_at: 0,
            valid_until: 0,
            result: estimate_solar_system(&request, &Catalog::fallback()).unwrap(),
        };

        let mails = solar_mails(&quote, Some(&contact(Some("ana@example.com"))), "ARS", 30, "ventas@example.com").unwrap();
        assert_eq!(mails.len(), 2);
        assert!(mails[0].html.contains("Batteries"));
        assert!(mails[0].html.contains("ARS"));
        assert!(mails[0].html.contains("6.2 h/day"));

        let customer_files: Vec<&str> =
            mails[0].attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(customer_files, ["quote.pdf"]);
        let sales_files: Vec<&str> =
            mails[1].attachments.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(sales_files, ["quote.pdf", "quote.json"]);
    }

    #[test]
    fn customer_gets_pdf_quote() {
        let quote = construction_quote(Some(contact(Some("ana@example.com"))));
        let mails = construction_mails(&quote, "ventas@example.com").unwrap();

        let pdf = &mails[0].attachments[0];
        assert_eq!(pdf.content_type, PDF_CONTENT_TYPE);
        assert!(!pdf.content.is_empty());
        assert!(pdf.content.starts_with(b"%PDF"));
        assert_eq!(mails[1].attachments[1].content_type, JSON_CONTENT_TYPE);
    }

    #[test]
    fn pdf_document_mirrors_mail() {
        let quote = construction_quote(Some(contact(Some("ana@example.com"))));
        let result = &quote.result;
        let body = MailBody {
            title: "Construction quote",
            greeting: String::new(),
            rows: vec![("Area", "100 m²".to_string())],
            total: format!("{} {}", result.currency, money(result.total)),
            notes: &result.notes,
            validity_days: 30,
        };

        let doc = body.document(Some(&contact(None)), "ventas@example.com");
        assert_eq!(doc.title, "Construction quote");
        assert!(doc.lines.contains(&DocLine::Row("Name".to_string(), "Ana <Pérez>".to_string())));
        assert!(doc.lines.contains(&DocLine::Row("Email".to_string(), "-".to_string())));
        assert!(doc.lines.contains(&DocLine::Row("Area".to_string(), "100 m²".to_string())));
        assert!(doc.lines.contains(&DocLine::Total("Total: USD 10,500.00".to_string())));
        assert!(doc.lines.contains(&DocLine::Text("- Contact: ventas@example.com".to_string())));
    }

    #[test]
    fn outbox_writes_envelope_and_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let mut notifier = OutboxNotifier::new(dir.path().join("outbox"));
        let quote = construction_quote(Some(contact(Some("ana@example.com"))));

        for mail in construction_mails(&quote, "ventas@example.com").unwrap() {
            notifier.send(&mail).unwrap();
        }

        let eml = fs::read_to_string(
            dir.path()
                .join("outbox")
                .join("0123456789ab-ana_example_com.eml"),
        )
        .unwrap();
        assert!(eml.starts_with("To: ana@example.com\n"));
        assert!(eml.contains(
            "X-Attachment: 0123456789ab-ana_example_com-quote.pdf; type=application/pdf"
        ));

        let pdf = fs::read(
            dir.path()
                .join("outbox")
                .join("0123456789ab-ana_example_com-quote.pdf"),
        )
        .unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        // Клиент: письмо и PDF; продажи: письмо, PDF и JSON.
        let count = fs::read_dir(dir.path().join("outbox")).unwrap().count();
        assert_eq!(count, 5);
    }
}
