use std::fmt::Write;

use flightwatch_core::{extract_flights, FlightOffer, SearchCriteria, TrackerView};
use serde_json::Value;

const BAR_WIDTH: usize = 30;
const MISSING: &str = "N/A";

/// One-line loading screen: bar, percentage, connection dot and status.
pub(crate) fn progress_line(view: &TrackerView) -> String {
    let filled = usize::from(view.progress.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% ({}) {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        view.progress,
        view.connection_label(),
        view.status_message
    )
}

pub(crate) fn search_summary(criteria: &SearchCriteria) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "From:      {}", criteria.origin);
    let _ = writeln!(out, "To:        {}", criteria.destination);
    let _ = writeln!(out, "Dates:     {}", criteria.dates_label());
    let _ = writeln!(out, "Travelers: {}", criteria.adults);
    let _ = writeln!(out, "Currency:  {}", criteria.currency);
    out
}

/// Renders the success payload as a list of offers.
pub(crate) fn render_results(payload: &Value, criteria: &SearchCriteria) -> String {
    let mut out = String::from("Flight Search Complete!\n\n");
    out.push_str(&search_summary(criteria));
    out.push('\n');

    if payload.is_null() {
        out.push_str("No results available.\n");
        return out;
    }

    let flights = extract_flights(payload);
    if flights.is_empty() {
        out.push_str(
            "No flights found for your search criteria. Please try a different search.\n",
        );
        return out;
    }

    let fallback_currency = criteria.currency.code();
    for (index, flight) in flights.iter().enumerate() {
        out.push_str(&render_offer(index + 1, flight, fallback_currency));
    }
    out
}

fn render_offer(position: usize, flight: &FlightOffer, fallback_currency: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{position}. {}", flight.headline());
    let _ = writeln!(
        out,
        "   {} {} -> {} {}  ({})",
        flight.departure.clock(),
        or_missing(flight.departure.airport.as_deref()),
        flight.arrival.clock(),
        or_missing(flight.arrival.airport.as_deref()),
        or_missing(flight.duration.as_deref())
    );
    let _ = writeln!(
        out,
        "   Price: {} {}",
        or_missing(flight.price.as_deref()),
        flight.currency_or(fallback_currency)
    );
    if let Some(terminal) = &flight.departure.terminal {
        let _ = writeln!(out, "   Terminal: {terminal}");
    }
    out
}

fn or_missing(value: Option<&str>) -> &str {
    value.unwrap_or(MISSING)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use flightwatch_core::{ConnectionState, Currency, SearchCriteria, TrackerView};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::{progress_line, render_results};

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            origin: "AMS".to_string(),
            destination: "LIS".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2027, 5, 2).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2027, 5, 9),
            adults: 2,
            currency: Currency::Eur,
        }
    }

    #[test]
    fn progress_line_shows_bar_and_connection() {
        let view = TrackerView {
            progress: 50,
            connection: ConnectionState::Connected,
            status_message: "Search in progress...".to_string(),
            ..TrackerView::default()
        };
        assert_eq!(
            progress_line(&view),
            format!(
                "[{}{}]  50% (connected) Search in progress...",
                "#".repeat(15),
                "-".repeat(15)
            )
        );
    }

    #[test]
    fn offers_fall_back_for_missing_fields() {
        let payload = json!({
            "data": {
                "flights": [
                    {
                        "airline": "TP",
                        "flight_number": "671",
                        "departure": { "time": "2027-05-02T07:25:00", "airport": "AMS", "terminal": "2" },
                        "arrival": { "time": "2027-05-02T09:40:00", "airport": "LIS" },
                        "duration": "3h 15m",
                        "price": { "total": "142.10" }
                    },
                    { "price": 99 }
                ]
            }
        });

        let rendered = render_results(&payload, &criteria());
        assert!(rendered.contains("Dates:     2027-05-02 to 2027-05-09"), "{rendered}");
        assert!(rendered.contains("1. TP 671\n"), "{rendered}");
        assert!(rendered.contains("   07:25 AMS -> 09:40 LIS  (3h 15m)\n"));
        assert!(rendered.contains("   Price: 142.10 EUR\n"));
        assert!(rendered.contains("   Terminal: 2\n"));
        assert!(rendered.contains("2. Flight\n"));
        assert!(rendered.contains("   --:-- N/A -> --:-- N/A  (N/A)\n"));
        assert!(rendered.contains("   Price: 99 EUR\n"));
    }

    #[test]
    fn empty_and_missing_results_have_their_own_messages() {
        let empty = render_results(&json!({ "flights": [] }), &criteria());
        assert!(empty.ends_with(
            "No flights found for your search criteria. Please try a different search.\n"
        ));

        let missing = render_results(&Value::Null, &criteria());
        assert!(missing.ends_with("No results available.\n"));
    }
}
