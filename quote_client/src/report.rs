//! Вывод ответа сервера в читаемом виде.

use crate::cli::RequestKind;
use commons::errors::QuoteError;
use commons::models::{
    ConstructionQuoteResult, IssuedQuote, SolarQuickEstimate, SolarSystemDesign,
};
use commons::utils::round_to;
use serde::de::DeserializeOwned;
use std::fmt::Write;

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, QuoteError> {
    serde_json::from_str(body)
        .map_err(|err| QuoteError::value_err(format!("некорректный ответ сервера: {err}")))
}

/// Отчёт по телу успешного ответа.
pub fn render(kind: RequestKind, body: &str) -> Result<String, QuoteError> {
    match kind {
        RequestKind::Construction => Ok(construction(&parse(body)?)),
        RequestKind::Solar => Ok(solar(&parse(body)?)),
        RequestKind::Estimate => Ok(estimate(&parse(body)?)),
        RequestKind::Prices => {
            let value: serde_json::Value = parse(body)?;
            serde_json::to_string_pretty(&value)
                .map_err(|err| QuoteError::value_err(err.to_string()))
        }
    }
}

fn construction(quote: &IssuedQuote<ConstructionQuoteResult>) -> String {
    let r = &quote.result;
    let b = &r.breakdown;
    let mut out = String::new();

    let _ = writeln!(out, "Quote {} ({} m², {})", quote.quote_id, r.request.area_m2, r.request.system);
    let _ = writeln!(
        out,
        "Price per m²: {} {} (base {} x usage {} x finish {} x region {})",
        r.currency,
        round_to(r.price_per_m2, 2),
        r.base_rate,
        r.usage_multiplier,
        r.finish_multiplier,
        r.region_multiplier
    );
    for (label, value) in [
        ("Materials", b.materials),
        ("Labor", b.labor),
        ("Finishes", b.finishes),
        ("Installations", b.installations),
        ("Transport", b.transport),
        ("Taxes", b.taxes),
    ] {
        let _ = writeln!(out, "  {label:<14}{:>14.2}", value);
    }
    let _ = writeln!(out, "Total: {} {:.2}", r.currency, r.total);
    let _ = writeln!(out, "Estimated duration: {}", r.duration);
    for note in &r.notes {
        let _ = writeln!(out, "- {note}");
    }
    let _ = write!(out, "Valid for {} days. Prices: {}", r.validity_days, r.price_source);
    out
}

fn solar(quote: &IssuedQuote<SolarSystemDesign>) -> String {
    let d = &quote.result;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Quote {}: {:.2} kWp (required {:.2} kWp)",
        quote.quote_id, d.system_power_kwp, d.required_power_kwp
    );
    let _ = writeln!(
        out,
        "Panels: {} x {} {} | Inverters: {} x {} {} ({} kW)",
        d.panel_count,
        d.panel.brand,
        d.panel.model,
        d.inverter_count,
        d.inverter.brand,
        d.inverter.model,
        d.inverter_size_kw
    );
    if let Some(battery) = &d.battery {
        let _ = writeln!(
            out,
            "Batteries: {} x {} {} for {} h ({:.1} kWh)",
            battery.battery.count,
            battery.battery.brand,
            battery.battery.model,
            battery.autonomy_hours,
            battery.required_capacity_kwh
        );
    }
    let _ = writeln!(
        out,
        "Generation: {:.1} kWh/day, {:.0} kWh/month, {:.0} kWh/year",
        d.generation.daily_kwh, d.generation.monthly_kwh, d.generation.annual_kwh
    );
    let _ = writeln!(
        out,
        "Cost: panels {:.0}, inverters {:.0}, installation {:.0}, batteries {:.0}, total {:.0}",
        d.costs.panels, d.costs.inverters, d.costs.installation, d.costs.batteries, d.costs.total
    );
    let _ = writeln!(
        out,
        "Savings: {:.0}/month, {:.0}/year | payback {:.1} years | ROI {:.0}% over {} years",
        d.economics.monthly_savings,
        d.economics.annual_savings,
        d.economics.payback_years,
        d.economics.roi_percentage,
        d.economics.lifetime_years
    );
    let fits = if d.fits_available_area { "fits" } else { "does NOT fit" };
    let _ = write!(
        out,
        "Area: {:.1} m² ({fits} the available area) | installation {} day(s) | warranty {} years",
        d.required_area_m2, d.installation_time_days, d.warranty_years
    );
    out
}

fn estimate(e: &SolarQuickEstimate) -> String {
    let fits = if e.fits_available_area { "fits" } else { "does NOT fit" };
    format!(
        "Required power: {:.2} kWp, about {} panels on {:.1} m² ({fits} the available area)\n\
         Estimated cost: {:.0} | annual savings {:.0} | payback {:.1} years\n\
         Generation: {:.1} kWh/day, {:.0} kWh/year",
        e.required_power_kwp,
        e.estimated_panels,
        e.estimated_area_m2,
        e.estimated_cost,
        e.annual_savings,
        e.payback_years,
        e.generation.daily_kwh,
        e.generation.annual_kwh
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons::models::EnergyGeneration;

    #[test]
    fn estimate_report() {
        let e = SolarQuickEstimate {
            daily_consumption_kwh: 10.0,
            required_power_kwp: 2.139,
            estimated_panels: 6,
            estimated_area_m2: 12.0,
            fits_available_area: false,
            estimated_cost: 1_711_230.0,
            annual_savings: 162_000.0,
            payback_years: 10.56,
            generation: EnergyGeneration {
                daily_kwh: 10.0,
                monthly_kwh: 300.0,
                annual_kwh: 3_650.0,
            },
        };
        let body = serde_json::to_string(&e).unwrap();
        let text = render(RequestKind::Estimate, &body).unwrap();

        assert!(text.contains("2.14 kWp"));
        assert!(text.contains("about 6 panels"));
        assert!(text.contains("does NOT fit"));
        assert!(text.contains("payback 10.6 years"));
    }

    #[test]
    fn prices_are_pretty_printed() {
        let text = render(RequestKind::Prices, "{\"prices\":{\"steel_frame_m2\":105}}").unwrap();
        assert!(text.contains("\n"));
        assert!(text.contains("\"steel_frame_m2\": 105"));
    }

    #[test]
    fn malformed_body() {
        let err = render(RequestKind::Construction, "{}").unwrap_err();
        assert!(matches!(err, QuoteError::ValueError(_)));
    }
}
