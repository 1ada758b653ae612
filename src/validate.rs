//! Input validation for school records and caller coordinates.
//!
//! Every rule short-circuits: the first failing check determines the error,
//! and its `Display` text is returned to the client as-is.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{Coordinate, NewSchool};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_ADDRESS_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("All fields (name, address, latitude, longitude) are required")]
    Missing,
    #[error("Name and address must be strings")]
    NotText,
    #[error("Latitude and longitude must be valid numbers")]
    NotNumeric,
    #[error("Latitude must be between -90 and 90")]
    LatitudeRange,
    #[error("Longitude must be between -180 and 180")]
    LongitudeRange,
    #[error("School name cannot be empty and must be at most 255 characters")]
    Name,
    #[error("Address cannot be empty and must be at most 500 characters")]
    Address,
    #[error("User latitude and longitude are required as query parameters")]
    MissingLocation,
    #[error("Invalid coordinate values")]
    LocationRange,
    #[error("Invalid school ID")]
    InvalidId,
}

/// Untrusted school payload as it arrives over the wire.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SchoolInput {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub latitude: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub longitude: Option<Value>,
}

// Keeps an explicit `null` as `Some(Value::Null)` so it is distinguishable
// from an absent key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn is_absent_text(value: &Option<Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_text(text: &str) -> Option<f64> {
    let n = text.trim().parse::<f64>().ok()?;
    n.is_finite().then_some(n)
}

fn within(value: f64, bound: f64) -> bool {
    (-bound..=bound).contains(&value)
}

fn trimmed_within(text: &str, max: usize) -> Option<String> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    (1..=max).contains(&len).then(|| trimmed.to_string())
}

pub fn validate_school(input: &SchoolInput) -> Result<NewSchool, ValidationError> {
    if is_absent_text(&input.name)
        || is_absent_text(&input.address)
        || input.latitude.is_none()
        || input.longitude.is_none()
    {
        return Err(ValidationError::Missing);
    }

    let (Some(Value::String(name)), Some(Value::String(address))) = (&input.name, &input.address)
    else {
        return Err(ValidationError::NotText);
    };

    let latitude = input.latitude.as_ref().and_then(parse_number);
    let longitude = input.longitude.as_ref().and_then(parse_number);
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(ValidationError::NotNumeric);
    };

    if !within(latitude, 90.0) {
        return Err(ValidationError::LatitudeRange);
    }
    if !within(longitude, 180.0) {
        return Err(ValidationError::LongitudeRange);
    }

    let name = trimmed_within(name, MAX_NAME_LEN).ok_or(ValidationError::Name)?;
    let address = trimmed_within(address, MAX_ADDRESS_LEN).ok_or(ValidationError::Address)?;

    Ok(NewSchool {
        name,
        address,
        latitude,
        longitude,
    })
}

/// Validates the caller's location taken from the `/listSchools` query string.
pub fn validate_user_location(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Coordinate, ValidationError> {
    let (Some(latitude), Some(longitude)) = (
        latitude.filter(|s| !s.is_empty()),
        longitude.filter(|s| !s.is_empty()),
    ) else {
        return Err(ValidationError::MissingLocation);
    };

    let (Some(latitude), Some(longitude)) = (parse_text(latitude), parse_text(longitude)) else {
        return Err(ValidationError::NotNumeric);
    };

    if !within(latitude, 90.0) || !within(longitude, 180.0) {
        return Err(ValidationError::LocationRange);
    }

    Ok(Coordinate::new(latitude, longitude))
}

/// Accepts any base-10 integer, optionally negative. Ids that are numeric but
/// match no row are left for storage to report as missing.
pub fn parse_school_id(raw: &str) -> Result<i64, ValidationError> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidId);
    }
    raw.parse::<i64>().map_err(|_| ValidationError::InvalidId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> SchoolInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_and_trims_valid_input() {
        let school = validate_school(&input(json!({
            "name": "  Hillside Academy  ",
            "address": "\t12 Ridge Road ",
            "latitude": 12.5,
            "longitude": -45.25,
        })))
        .unwrap();

        assert_eq!(school.name, "Hillside Academy");
        assert_eq!(school.address, "12 Ridge Road");
        assert_eq!(school.latitude, 12.5);
        assert_eq!(school.longitude, -45.25);
    }

    #[test]
    fn zero_coordinates_are_present() {
        let school = validate_school(&input(json!({
            "name": "Equator School",
            "address": "Null Island",
            "latitude": 0,
            "longitude": 0,
        })))
        .unwrap();
        assert_eq!((school.latitude, school.longitude), (0.0, 0.0));
    }

    #[test]
    fn numeric_strings_parse() {
        let school = validate_school(&input(json!({
            "name": "A",
            "address": "B",
            "latitude": "45.5",
            "longitude": " -73.25 ",
        })))
        .unwrap();
        assert_eq!((school.latitude, school.longitude), (45.5, -73.25));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let cases = [
            json!({ "address": "B", "latitude": 1, "longitude": 1 }),
            json!({ "name": null, "address": "B", "latitude": 1, "longitude": 1 }),
            json!({ "name": "", "address": "B", "latitude": 1, "longitude": 1 }),
            json!({ "name": "A", "latitude": 1, "longitude": 1 }),
            json!({ "name": "A", "address": "B", "longitude": 1 }),
            json!({ "name": "A", "address": "B", "latitude": 1 }),
            json!({}),
        ];
        for case in cases {
            assert_eq!(
                validate_school(&input(case.clone())),
                Err(ValidationError::Missing),
                "{case}"
            );
        }
    }

    #[test]
    fn non_text_name_or_address_is_rejected() {
        let err = validate_school(&input(json!({
            "name": 42, "address": "B", "latitude": 1, "longitude": 1,
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::NotText);

        let err = validate_school(&input(json!({
            "name": "A", "address": { "street": "x" }, "latitude": 1, "longitude": 1,
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::NotText);
    }

    #[test]
    fn non_numeric_coordinates_are_rejected() {
        for (lat, lon) in [
            (json!("north"), json!(1)),
            (json!(1), json!("")),
            (json!(null), json!(1)),
            (json!(true), json!(1)),
            (json!("NaN"), json!(1)),
            (json!(1), json!("inf")),
        ] {
            let err = validate_school(&input(json!({
                "name": "A", "address": "B", "latitude": lat, "longitude": lon,
            })))
            .unwrap_err();
            assert_eq!(err, ValidationError::NotNumeric);
            assert_eq!(err.to_string(), "Latitude and longitude must be valid numbers");
        }
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let check = |lat: f64, lon: f64| {
            validate_school(&input(json!({
                "name": "A", "address": "B", "latitude": lat, "longitude": lon,
            })))
        };

        assert_eq!(check(90.5, 0.0), Err(ValidationError::LatitudeRange));
        assert_eq!(check(-90.01, 0.0), Err(ValidationError::LatitudeRange));
        assert_eq!(check(0.0, 180.1), Err(ValidationError::LongitudeRange));
        assert_eq!(check(0.0, -181.0), Err(ValidationError::LongitudeRange));
        assert!(check(90.0, 180.0).is_ok());
        assert!(check(-90.0, -180.0).is_ok());
    }

    #[test]
    fn range_is_checked_before_length() {
        let err = validate_school(&input(json!({
            "name": "   ", "address": "B", "latitude": 95, "longitude": 0,
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::LatitudeRange);
    }

    #[test]
    fn whitespace_only_fails_length_not_presence() {
        let err = validate_school(&input(json!({
            "name": "   ", "address": "B", "latitude": 1, "longitude": 1,
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::Name);

        let err = validate_school(&input(json!({
            "name": "A", "address": "\n\t ", "latitude": 1, "longitude": 1,
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::Address);
    }

    #[test]
    fn length_limits_apply_to_trimmed_text() {
        let long_but_padded = format!("  {}  ", "n".repeat(MAX_NAME_LEN));
        let school = validate_school(&input(json!({
            "name": long_but_padded, "address": "B", "latitude": 1, "longitude": 1,
        })))
        .unwrap();
        assert_eq!(school.name.len(), MAX_NAME_LEN);

        let err = validate_school(&input(json!({
            "name": "n".repeat(MAX_NAME_LEN + 1), "address": "B", "latitude": 1, "longitude": 1,
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::Name);

        let err = validate_school(&input(json!({
            "name": "A", "address": "a".repeat(MAX_ADDRESS_LEN + 1), "latitude": 1, "longitude": 1,
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::Address);

        let school = validate_school(&input(json!({
            "name": "A", "address": "a".repeat(MAX_ADDRESS_LEN), "latitude": 1, "longitude": 1,
        })))
        .unwrap();
        assert_eq!(school.address.chars().count(), MAX_ADDRESS_LEN);

        let padded_address = format!(" \t{}\n ", "a".repeat(MAX_ADDRESS_LEN));
        let school = validate_school(&input(json!({
            "name": "A", "address": padded_address, "latitude": 1, "longitude": 1,
        })))
        .unwrap();
        assert_eq!(school.address, "a".repeat(MAX_ADDRESS_LEN));
    }

    #[test]
    fn user_location() {
        assert_eq!(
            validate_user_location(Some("10.5"), Some("-20")),
            Ok(Coordinate::new(10.5, -20.0))
        );
        assert_eq!(
            validate_user_location(None, Some("1")),
            Err(ValidationError::MissingLocation)
        );
        assert_eq!(
            validate_user_location(Some("1"), Some("")),
            Err(ValidationError::MissingLocation)
        );
        assert_eq!(
            validate_user_location(Some("abc"), Some("1")),
            Err(ValidationError::NotNumeric)
        );
        assert_eq!(
            validate_user_location(Some("91"), Some("1")),
            Err(ValidationError::LocationRange)
        );
        assert_eq!(
            validate_user_location(Some("0"), Some("0")),
            Ok(Coordinate::new(0.0, 0.0))
        );
    }

    #[test]
    fn school_ids() {
        assert_eq!(parse_school_id("17"), Ok(17));
        assert_eq!(parse_school_id("abc"), Err(ValidationError::InvalidId));
        assert_eq!(parse_school_id("0"), Ok(0));
        assert_eq!(parse_school_id("-3"), Ok(-3));
        assert_eq!(parse_school_id("+5"), Err(ValidationError::InvalidId));
        assert_eq!(parse_school_id("-"), Err(ValidationError::InvalidId));
        assert_eq!(parse_school_id(""), Err(ValidationError::InvalidId));
        assert_eq!(parse_school_id("1.5"), Err(ValidationError::InvalidId));
        assert_eq!(
            parse_school_id("99999999999999999999"),
            Err(ValidationError::InvalidId)
        );
    }
}
