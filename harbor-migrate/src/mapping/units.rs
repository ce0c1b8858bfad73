//! Tolerant numeric parsing and unit conversion
//!
//! Canonical units: length in feet, weight in pounds, volume in US gallons.
//!
//! Conversion factors (exact definitions where one exists):
//! - 1 m = 1 / 0.3048 ft, 1 cm = 1 / 30.48 ft, 1 in = 1 / 12 ft
//! - 1 kg = 1 / 0.45359237 lb, 1 t (metric tonne) = 1000 kg
//! - 1 L = 1 / 3.785411784 US gal, 1 imperial gal = 4.54609 / 3.785411784 US gal
//!
//! "t", "ton" and "tons" are read as metric tonnes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Physical dimension of a quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Weight,
    Volume,
}

impl Dimension {
    /// Canonical unit for this dimension
    pub fn canonical_unit(&self) -> Unit {
        match self {
            Dimension::Length => Unit::Feet,
            Dimension::Weight => Unit::Pounds,
            Dimension::Volume => Unit::UsGallons,
        }
    }
}

/// Recognized units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Feet,
    Inches,
    Meters,
    Centimeters,
    Pounds,
    Kilograms,
    Tonnes,
    UsGallons,
    ImperialGallons,
    Liters,
}

const FEET_PER_METER: f64 = 1.0 / 0.3048;
const POUNDS_PER_KILOGRAM: f64 = 1.0 / 0.453_592_37;
const US_GALLONS_PER_LITER: f64 = 1.0 / 3.785_411_784;

impl Unit {
    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Feet | Unit::Inches | Unit::Meters | Unit::Centimeters => Dimension::Length,
            Unit::Pounds | Unit::Kilograms | Unit::Tonnes => Dimension::Weight,
            Unit::UsGallons | Unit::ImperialGallons | Unit::Liters => Dimension::Volume,
        }
    }

    /// Multiplier converting this unit into its dimension's canonical unit
    pub fn to_canonical_factor(&self) -> f64 {
        match self {
            Unit::Feet | Unit::Pounds | Unit::UsGallons => 1.0,
            Unit::Inches => 1.0 / 12.0,
            Unit::Meters => FEET_PER_METER,
            Unit::Centimeters => FEET_PER_METER / 100.0,
            Unit::Kilograms => POUNDS_PER_KILOGRAM,
            Unit::Tonnes => POUNDS_PER_KILOGRAM * 1000.0,
            Unit::Liters => US_GALLONS_PER_LITER,
            Unit::ImperialGallons => 4.546_09 * US_GALLONS_PER_LITER,
        }
    }

    /// Parse a unit token ("m", "ft", "Meters", "lbs", "ltr", ...)
    pub fn parse(token: &str) -> Option<Unit> {
        let token = token.trim().trim_end_matches('.').to_lowercase();
        let unit = match token.as_str() {
            "ft" | "feet" | "foot" | "'" | "’" => Unit::Feet,
            "in" | "inch" | "inches" | "\"" | "”" => Unit::Inches,
            "m" | "mtr" | "mtrs" | "meter" | "meters" | "metre" | "metres" => Unit::Meters,
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => Unit::Centimeters,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pounds,
            "kg" | "kgs" | "kilo" | "kilos" | "kilogram" | "kilograms" => Unit::Kilograms,
            "t" | "ton" | "tons" | "tonne" | "tonnes" => Unit::Tonnes,
            "gal" | "gals" | "gallon" | "gallons" | "us gal" | "usgal" => Unit::UsGallons,
            "imp gal" | "impgal" | "imperial gallons" => Unit::ImperialGallons,
            "l" | "ltr" | "ltrs" | "liter" | "liters" | "litre" | "litres" => Unit::Liters,
            _ => return None,
        };
        Some(unit)
    }
}

/// Quantity conversion failure
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityError {
    /// No number in the text
    NotNumeric,
    /// Unit belongs to another dimension ("15 kg" as a length)
    WrongDimension { expected: Dimension, found: Unit },
    /// Neither the text nor the mapping declares a unit
    MissingUnit,
}

impl std::fmt::Display for QuantityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityError::NotNumeric => write!(f, "no numeric value"),
            QuantityError::WrongDimension { expected, found } => {
                write!(f, "unit {:?} is not a {:?} unit", found, expected)
            }
            QuantityError::MissingUnit => write!(f, "no unit given"),
        }
    }
}

static NUMBER_RUN: Lazy<Regex> = Lazy::new(|| {
    // Digits with optional grouping separators; a plain space only groups
    // when exactly three digits follow it.
    Regex::new(r"[-+]?\d(?:[\d.,'\u{a0}\u{202f}]|\s\d{3}(?:\D|$))*").expect("valid regex")
});

static FEET_INCHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(\d+(?:[.,]\d+)?)\s*(?:ft|feet|foot|'|’)\s*(\d+(?:[.,]\d+)?)\s*(?:in|inch|inches|"|”)"#)
        .expect("valid regex")
});

static UNIT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*(?i)(imp(?:erial)?\s*gal(?:lons?)?|us\s*gal(?:lons?)?|[a-z]+\.?|'|’|"|”)"#)
        .expect("valid regex")
});

/// Parse the first number in a string
///
/// Tolerates currency symbols, thousands separators (`,` `.` `'` and spaces)
/// and decimal commas. A single `.` or `,` followed by exactly three digits
/// groups thousands ("€ 275.000", "250,000"); otherwise it is the decimal
/// separator ("13.85", "13,85").
pub fn parse_number(text: &str) -> Option<f64> {
    let (value, _) = number_with_span(text)?;
    Some(value)
}

fn number_with_span(text: &str) -> Option<(f64, usize)> {
    let m = NUMBER_RUN.find(text)?;
    let raw = m.as_str().trim_end();
    // A trailing non-digit captured by the space-group lookahead
    let raw = raw.trim_end_matches(|c: char| !c.is_ascii_digit());
    let end = m.start() + raw.len();

    let mut digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{a0}' | '\u{202f}') && !c.is_whitespace())
        .collect();

    let negative = digits.starts_with('-');
    digits = digits.trim_start_matches(['-', '+']).to_string();

    let dots = digits.matches('.').count();
    let commas = digits.matches(',').count();

    let normalized = match (dots, commas) {
        (0, 0) => digits,
        (_, 0) if dots > 1 => digits.replace('.', ""),
        (_, 0) => {
            let (before, after) = digits.split_once('.').unwrap_or((digits.as_str(), ""));
            if after.len() == 3 && !before.is_empty() && before != "0" {
                digits.replace('.', "")
            } else {
                digits
            }
        }
        (0, 1) => {
            let after = digits.split(',').nth(1).unwrap_or("");
            if after.len() == 3 {
                digits.replace(',', "")
            } else {
                digits.replace(',', ".")
            }
        }
        (0, _) => digits.replace(',', ""),
        _ => {
            // Both present: the last one is the decimal separator
            let last_dot = digits.rfind('.').unwrap_or(0);
            let last_comma = digits.rfind(',').unwrap_or(0);
            if last_comma > last_dot {
                digits.replace('.', "").replace(',', ".")
            } else {
                digits.replace(',', "")
            }
        }
    };

    let value: f64 = normalized.parse().ok()?;
    Some((if negative { -value } else { value }, end))
}

/// Parse a quantity and convert it to the canonical unit of `dimension`
///
/// # Arguments
/// * `text` - Raw value ("15 m", "49 ft", "45' 6\"", "18 t", "500 l")
/// * `dimension` - Expected dimension
/// * `default_unit` - Unit assumed when the text has none
pub fn convert_quantity(
    text: &str,
    dimension: Dimension,
    default_unit: Option<Unit>,
) -> Result<f64, QuantityError> {
    if dimension == Dimension::Length {
        if let Some(caps) = FEET_INCHES.captures(text) {
            let feet = parse_number(&caps[1]).ok_or(QuantityError::NotNumeric)?;
            let inches = parse_number(&caps[2]).ok_or(QuantityError::NotNumeric)?;
            return Ok(feet + inches / 12.0);
        }
    }

    let (value, end) = number_with_span(text).ok_or(QuantityError::NotNumeric)?;
    let unit = UNIT_TOKEN
        .captures(&text[end..])
        .and_then(|caps| Unit::parse(&caps[1]))
        .or(default_unit)
        .ok_or(QuantityError::MissingUnit)?;

    if unit.dimension() != dimension {
        return Err(QuantityError::WrongDimension {
            expected: dimension,
            found: unit,
        });
    }

    Ok(value * unit.to_canonical_factor())
}

/// Detect an ISO currency code from price text ("€ 250.000", "US$ 349,000")
pub fn detect_currency(text: &str) -> Option<&'static str> {
    let upper = text.to_uppercase();
    const CODES: &[&str] = &["EUR", "USD", "GBP", "CHF", "SEK", "NOK", "DKK", "AUD", "CAD", "NZD"];
    if let Some(code) = CODES.iter().find(|code| {
        upper
            .match_indices(*code)
            .any(|(i, _)| !upper[..i].ends_with(|c: char| c.is_ascii_alphabetic()))
    }) {
        return Some(*code);
    }

    if text.contains('€') {
        Some("EUR")
    } else if text.contains('£') {
        Some("GBP")
    } else if upper.contains("A$") {
        Some("AUD")
    } else if upper.contains("C$") {
        Some("CAD")
    } else if text.contains('$') {
        Some("USD")
    } else {
        None
    }
}
