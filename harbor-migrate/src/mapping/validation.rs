//! Range checks for mapped values
//!
//! A value outside its plausible range is treated as present-but-invalid.

use chrono::{Datelike, Utc};
use harbor_common::yacht::{CanonicalField, CanonicalValue};

/// Earliest accepted build year
pub const MIN_YEAR: i64 = 1900;
/// Upper bound (exclusive) for asking prices
pub const MAX_PRICE: f64 = 100_000_000.0;
/// Upper bound (exclusive) for overall length in feet
pub const MAX_LENGTH_FT: f64 = 1000.0;
/// Upper bound (exclusive) for beam and draft in feet
pub const MAX_BEAM_DRAFT_FT: f64 = 200.0;
/// Upper bound (exclusive) for cabin and berth counts
pub const MAX_ACCOMMODATION: i64 = 100;

/// Check a mapped value against its field's plausible range
///
/// # Returns
/// `Err` with a short reason when the value is out of range.
pub fn validate(field: CanonicalField, value: &CanonicalValue) -> Result<(), String> {
    match field {
        CanonicalField::Year => {
            let max_year = i64::from(Utc::now().year()) + 1;
            match value.as_integer() {
                Some(year) if (MIN_YEAR..=max_year).contains(&year) => Ok(()),
                Some(year) => Err(format!("year {} outside {}..={}", year, MIN_YEAR, max_year)),
                None => Err("year is not an integer".to_string()),
            }
        }
        CanonicalField::Price => positive_below(value, MAX_PRICE, "price"),
        CanonicalField::Length => positive_below(value, MAX_LENGTH_FT, "length"),
        CanonicalField::Beam => positive_below(value, MAX_BEAM_DRAFT_FT, "beam"),
        CanonicalField::Draft => positive_below(value, MAX_BEAM_DRAFT_FT, "draft"),
        CanonicalField::Displacement
        | CanonicalField::FuelCapacity
        | CanonicalField::WaterCapacity => positive_below(value, f64::MAX, field.as_str()),
        CanonicalField::Cabins | CanonicalField::Berths => match value.as_integer() {
            Some(n) if n > 0 && n < MAX_ACCOMMODATION => Ok(()),
            Some(n) => Err(format!("{} count {} out of range", field, n)),
            None => Err(format!("{} is not an integer", field)),
        },
        _ => Ok(()),
    }
}

fn positive_below(value: &CanonicalValue, max: f64, what: &str) -> Result<(), String> {
    match value.as_number() {
        Some(n) if n > 0.0 && n < max && n.is_finite() => Ok(()),
        Some(n) => Err(format!("{} {} out of range", what, n)),
        None => Err(format!("{} is not numeric", what)),
    }
}
