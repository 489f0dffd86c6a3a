//! Normalization of raw provider values into display strings
//!
//! Every function either returns a well-formed string or a parse error for
//! the named field; nothing here produces an empty value.

use crate::error::FetchError;

/// mph to km/h
pub const MPH_TO_KMH: f64 = 1.60934;
/// m/s to km/h
pub const MS_TO_KMH: f64 = 3.6;

/// Wind speed units reported by providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindUnit {
    Kmh,
    Mph,
    MetersPerSecond,
}

impl WindUnit {
    fn parse(unit: &str) -> Option<Self> {
        match unit.trim().to_lowercase().as_str() {
            "" | "km/h" | "kmh" | "kph" => Some(Self::Kmh),
            "mph" => Some(Self::Mph),
            "m/s" | "ms" => Some(Self::MetersPerSecond),
            _ => None,
        }
    }

    fn factor(self) -> f64 {
        match self {
            Self::Kmh => 1.0,
            Self::Mph => MPH_TO_KMH,
            Self::MetersPerSecond => MS_TO_KMH,
        }
    }
}

/// Convert a speed to whole km/h, truncating toward zero
#[must_use]
pub fn speed_to_kmh(value: f64, unit: WindUnit) -> i64 {
    (value * unit.factor()).trunc() as i64
}

/// `"23"` / `"23°"` / `"23 °C"` → `"23°C"`
pub fn temperature(raw: &str) -> Result<String, FetchError> {
    let value = raw
        .trim()
        .trim_end_matches(['C', 'c'])
        .trim_end()
        .trim_end_matches('°')
        .trim();
    parse_number(value).ok_or_else(|| FetchError::missing_field("temperature"))?;
    Ok(format!("{value}°C"))
}

/// `"65"` / `"65%"` → `"65%"`
pub fn percent(raw: &str, field: &str) -> Result<String, FetchError> {
    let value = raw.trim().trim_end_matches('%').trim();
    parse_number(value).ok_or_else(|| FetchError::missing_field(field))?;
    Ok(format!("{value}%"))
}

/// `"10 mph"` → `"16 km/h"`, `"3.6 km/h"` → `"3 km/h"`, `"12"` → `"12 km/h"`
pub fn wind_speed(raw: &str) -> Result<String, FetchError> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ',' || c == '-'))
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);

    let value = parse_number(number).ok_or_else(|| FetchError::missing_field("wind_speed"))?;
    let unit = WindUnit::parse(unit)
        .ok_or_else(|| FetchError::parse(format!("unknown wind unit in '{raw}'")))?;
    Ok(format_kmh(speed_to_kmh(value, unit)))
}

#[must_use]
pub fn format_kmh(kmh: i64) -> String {
    format!("{kmh} km/h")
}

/// Non-blank free text
pub fn condition(raw: &str) -> Result<String, FetchError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(FetchError::missing_field("condition"));
    }
    Ok(text.to_string())
}

/// Accepts a decimal comma, as pt-BR pages render numbers that way
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10 mph", "16 km/h")]
    #[case("16 km/h", "16 km/h")]
    #[case("3.6 km/h", "3 km/h")]
    #[case("5 m/s", "18 km/h")]
    #[case("12", "12 km/h")]
    #[case("7,5 km/h", "7 km/h")]
    fn test_wind_speed(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(wind_speed(raw).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("calm")]
    #[case("10 knots")]
    fn test_wind_speed_rejects(#[case] raw: &str) {
        assert!(wind_speed(raw).is_err());
    }

    #[rstest]
    #[case("23", "23°C")]
    #[case(" 23 ", "23°C")]
    #[case("23°", "23°C")]
    #[case("-2°C", "-2°C")]
    #[case("21.5", "21.5°C")]
    fn test_temperature(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(temperature(raw).unwrap(), expected);
    }

    #[test]
    fn test_temperature_rejects_text() {
        assert!(temperature("--").is_err());
        assert!(temperature("").is_err());
    }

    #[rstest]
    #[case("65%", "65%")]
    #[case("65", "65%")]
    #[case(" 0 % ", "0%")]
    fn test_percent(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(percent(raw, "humidity").unwrap(), expected);
    }

    #[test]
    fn test_percent_error_names_field() {
        let err = percent("n/a", "rain_probability").unwrap_err();
        assert!(err.to_string().contains("rain_probability"));
    }

    #[test]
    fn test_speed_truncates() {
        assert_eq!(speed_to_kmh(10.0, WindUnit::Mph), 16);
        assert_eq!(speed_to_kmh(0.9, WindUnit::Kmh), 0);
    }

    #[test]
    fn test_condition_rejects_blank() {
        assert!(condition("  ").is_err());
        assert_eq!(condition(" Nublado ").unwrap(), "Nublado");
    }
}
