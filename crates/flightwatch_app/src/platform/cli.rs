use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use flightwatch_core::{Currency, SearchCriteria};
use log::LevelFilter;

use super::config::CONFIG_FILENAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogTarget {
    File,
    Terminal,
    Both,
}

/// Search for flights and follow the search job until results arrive.
#[derive(Parser, Debug)]
#[command(name = "flightwatch", version, about)]
pub(crate) struct CliArgs {
    #[arg(long, value_name = "IATA", help = "Departure airport code")]
    pub(crate) origin: String,
    #[arg(long, value_name = "IATA", help = "Arrival airport code")]
    pub(crate) destination: String,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Outbound date")]
    pub(crate) departure: NaiveDate,
    #[arg(
        long = "return",
        value_name = "YYYY-MM-DD",
        help = "Return date; omit for one way"
    )]
    pub(crate) return_date: Option<NaiveDate>,
    #[arg(long, default_value_t = 1, help = "Number of adult travelers (1-10)")]
    pub(crate) adults: u8,
    #[arg(
        long,
        default_value = "USD",
        help = "Price currency: USD, EUR, GBP, JPY or CAD"
    )]
    pub(crate) currency: Currency,
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "FLIGHTWATCH_CONFIG",
        default_value = CONFIG_FILENAME,
        help = "Configuration file; a missing file means defaults"
    )]
    pub(crate) config: PathBuf,
    #[arg(long, value_enum, default_value_t = LogTarget::File, help = "Where log output goes")]
    pub(crate) log: LogTarget,
    #[arg(long, value_name = "FILE", default_value = DEFAULT_LOG_FILE)]
    pub(crate) log_file: PathBuf,
    #[arg(short, long, help = "Log at debug level")]
    pub(crate) verbose: bool,
}

impl CliArgs {
    pub(crate) fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            origin: self.origin.trim().to_uppercase(),
            destination: self.destination.trim().to_uppercase(),
            departure_date: self.departure,
            return_date: self.return_date,
            adults: self.adults,
            currency: self.currency,
        }
    }

    pub(crate) fn log_destination(&self) -> LogDestination {
        match self.log {
            LogTarget::File => LogDestination::File(self.log_file.clone()),
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both(self.log_file.clone()),
        }
    }

    pub(crate) fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::NaiveDate;
    use clap::Parser;
    use engine_logging::LogDestination;
    use flightwatch_core::Currency;
    use pretty_assertions::assert_eq;

    use super::CliArgs;

    #[test]
    fn parses_a_round_trip_search() {
        let args = CliArgs::try_parse_from([
            "flightwatch",
            "--origin",
            "lhr",
            "--destination",
            "JFK",
            "--departure",
            "2027-01-10",
            "--return",
            "2027-01-17",
            "--adults",
            "2",
            "--currency",
            "gbp",
            "--log",
            "both",
        ])
        .unwrap();

        let criteria = args.criteria();
        assert_eq!(criteria.origin, "LHR");
        assert_eq!(criteria.destination, "JFK");
        assert_eq!(criteria.return_date, NaiveDate::from_ymd_opt(2027, 1, 17));
        assert_eq!(criteria.adults, 2);
        assert_eq!(criteria.currency, Currency::Gbp);
        assert_eq!(
            args.log_destination(),
            LogDestination::Both(PathBuf::from("./flightwatch.log"))
        );
    }

    #[test]
    fn rejects_unknown_currency_and_bad_dates() {
        let base = ["flightwatch", "--origin", "A", "--destination", "B"];
        let bad_currency = base
            .iter()
            .copied()
            .chain(["--departure", "2027-01-10", "--currency", "XYZ"]);
        assert!(CliArgs::try_parse_from(bad_currency).is_err());

        let bad_date = base.iter().copied().chain(["--departure", "10/01/2027"]);
        assert!(CliArgs::try_parse_from(bad_date).is_err());
    }
}
