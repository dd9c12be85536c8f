use serde_json::Value;

/// One end of a flight leg.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Endpoint {
    pub time: Option<String>,
    pub airport: Option<String>,
    pub terminal: Option<String>,
}

impl Endpoint {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        Self {
            time: text_field(value, "time"),
            airport: text_field(value, "airport"),
            terminal: text_field(value, "terminal"),
        }
    }

    /// `HH:MM` taken from an ISO-8601 timestamp, or `--:--`.
    pub fn clock(&self) -> String {
        self.time
            .as_deref()
            .and_then(|time| time.split_once('T'))
            .and_then(|(_, clock)| clock.get(..5))
            .unwrap_or("--:--")
            .to_string()
    }
}

/// A single offer as the results screen reads it. Every field is optional;
/// servers differ in what they fill in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlightOffer {
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub departure: Endpoint,
    pub arrival: Endpoint,
    pub duration: Option<String>,
    pub price: Option<String>,
    pub currency: Option<String>,
}

impl FlightOffer {
    pub fn from_value(value: &Value) -> Self {
        Self {
            airline: text_field(value, "airline"),
            flight_number: text_field(value, "flight_number"),
            departure: Endpoint::from_value(value.get("departure")),
            arrival: Endpoint::from_value(value.get("arrival")),
            duration: text_field(value, "duration"),
            price: price_text(value.get("price")),
            currency: text_field(value, "currency"),
        }
    }

    pub fn headline(&self) -> String {
        let airline = self.airline.as_deref().unwrap_or("Flight");
        match self.flight_number.as_deref() {
            Some(number) => format!("{airline} {number}"),
            None => airline.to_string(),
        }
    }

    pub fn currency_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.currency.as_deref().unwrap_or(fallback)
    }
}

/// Pulls the list of offers out of a success payload.
///
/// Looks at `flights`, then `data.flights`, then `data` itself, then
/// `offers`; the first array found wins.
pub fn extract_flights(payload: &Value) -> Vec<FlightOffer> {
    let candidates = [
        payload.get("flights"),
        payload.get("data").and_then(|data| data.get("flights")),
        payload.get("data"),
        payload.get("offers"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_array)
        .map(|items| items.iter().map(FlightOffer::from_value).collect())
        .unwrap_or_default()
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    scalar_text(value.get(key)?)
}

fn price_text(price: Option<&Value>) -> Option<String> {
    match price? {
        Value::Object(fields) => scalar_text(fields.get("total")?),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
