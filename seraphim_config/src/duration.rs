use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("Argument {0} is not a valid time duration.")]
    Invalid(String),
    #[error("{0} is not a valid time prefix.")]
    UnknownUnit(String),
}

/// Seconds per unit. Months are 30 days and years are 365.
fn unit_seconds(unit: &str) -> Option<f64> {
    let secs = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        "mo" | "month" | "months" => 2_592_000,
        "y" | "year" | "years" => 31_536_000,
        _ => return None,
    };

    Some(f64::from(secs))
}

/// Parses a YAGPDB-style duration such as `1h30m`, `2 days 4h` or `90`.
///
/// Spaces and case are ignored. A trailing number without a unit is taken as minutes.
pub fn parse_duration(argument: &str) -> Result<Duration, DurationParseError> {
    let invalid = || DurationParseError::Invalid(argument.to_owned());

    let formatted: String = argument
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    let mut values: Vec<f64> = Vec::new();
    let mut units: Vec<String> = Vec::new();

    let mut value_entry = String::new();
    let mut unit_entry = String::new();

    for chara in formatted.chars() {
        if chara.is_ascii_digit() || chara == '.' {
            if !unit_entry.is_empty() {
                units.push(std::mem::take(&mut unit_entry));
            }
            value_entry.push(chara);
        } else {
            if !value_entry.is_empty() {
                values.push(value_entry.parse().map_err(|_| invalid())?);
                value_entry.clear();
            }
            unit_entry.push(chara);
        }
    }

    if !value_entry.is_empty() {
        values.push(value_entry.parse().map_err(|_| invalid())?);
    }
    if !unit_entry.is_empty() {
        units.push(unit_entry);
    }

    if units.len() + 1 == values.len() {
        units.push(String::from("m"));
    }

    if units.is_empty() || values.is_empty() || units.len() != values.len() {
        return Err(invalid());
    }

    let mut total = 0.0;
    for (value, unit) in values.into_iter().zip(units) {
        let Some(secs) = unit_seconds(&unit) else {
            return Err(DurationParseError::UnknownUnit(unit));
        };
        total += value * secs;
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_units() {
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("10m"), Ok(Duration::from_secs(600)));
        assert_eq!(parse_duration("2 hours"), Ok(Duration::from_secs(7200)));
        assert_eq!(parse_duration("1mo"), Ok(Duration::from_secs(2_592_000)));
    }

    #[test]
    fn combined_and_spaced() {
        assert_eq!(parse_duration("1h 30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("1D2H"), Ok(Duration::from_secs(93600)));
    }

    #[test]
    fn bare_number_is_minutes() {
        assert_eq!(parse_duration("5"), Ok(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h5"), Ok(Duration::from_secs(3900)));
    }

    #[test]
    fn decimals() {
        assert_eq!(parse_duration("1.5m"), Ok(Duration::from_secs(90)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_duration(".s"),
            Err(DurationParseError::Invalid(_))
        ));
        assert!(matches!(
            parse_duration("hours"),
            Err(DurationParseError::Invalid(_))
        ));
        assert_eq!(
            parse_duration("5 fortnights"),
            Err(DurationParseError::UnknownUnit(String::from("fortnights")))
        );
    }
}
