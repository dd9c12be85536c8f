use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const MIN_ADULTS: u8 = 1;
pub const MAX_ADULTS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cad,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| CriteriaError::UnknownCurrency(code.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("origin is required")]
    MissingOrigin,
    #[error("destination is required")]
    MissingDestination,
    #[error("origin and destination must differ ({0})")]
    SameEndpoints(String),
    #[error("adults must be between 1 and 10, got {0}")]
    AdultsOutOfRange(u8),
    #[error("return date {returning} is before departure date {departure}")]
    ReturnBeforeDeparture {
        departure: NaiveDate,
        returning: NaiveDate,
    },
    #[error("unknown currency {0:?}")]
    UnknownCurrency(String),
}

/// What the user asked for. Shown on the loading screen; never reinterpreted
/// by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    pub adults: u8,
    #[serde(default)]
    pub currency: Currency,
}

impl SearchCriteria {
    pub fn validate(&self) -> Result<(), CriteriaError> {
        let origin = self.origin.trim();
        let destination = self.destination.trim();
        if origin.is_empty() {
            return Err(CriteriaError::MissingOrigin);
        }
        if destination.is_empty() {
            return Err(CriteriaError::MissingDestination);
        }
        if origin.eq_ignore_ascii_case(destination) {
            return Err(CriteriaError::SameEndpoints(origin.to_string()));
        }
        if !(MIN_ADULTS..=MAX_ADULTS).contains(&self.adults) {
            return Err(CriteriaError::AdultsOutOfRange(self.adults));
        }
        if let Some(returning) = self.return_date {
            if returning < self.departure_date {
                return Err(CriteriaError::ReturnBeforeDeparture {
                    departure: self.departure_date,
                    returning,
                });
            }
        }
        Ok(())
    }

    /// JSON body for the search endpoint.
    pub fn request_body(&self) -> Value {
        json!({ "flight": self })
    }

    pub fn dates_label(&self) -> String {
        match self.return_date {
            Some(returning) => format!("{} to {}", self.departure_date, returning),
            None => format!("{} (one way)", self.departure_date),
        }
    }
}
