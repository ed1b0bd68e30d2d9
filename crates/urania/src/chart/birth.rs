//! Birth data as entered by a user, and its validation.

use crate::ephemeris::GeoLocation;
use crate::error::ValidationError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BirthData {
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`, local to `timezone`
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: Option<GeoLocation>,
    /// `UTC`, `Z` or a fixed offset such as `+05:30`; UTC when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Birth data that passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthMoment {
    pub instant: DateTime<Utc>,
    pub location: GeoLocation,
}

impl BirthData {
    pub fn new(date: &str, time: &str, lat: f64, lng: f64) -> Self {
        Self {
            date: date.to_string(),
            time: time.to_string(),
            location: Some(GeoLocation { lat, lng }),
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = Some(timezone.to_string());
        self
    }

    /// Checks every field and resolves the UTC birth instant.
    ///
    /// The first invalid field is reported; nothing is defaulted except a missing timezone.
    pub fn validate(&self) -> Result<BirthMoment, ValidationError> {
        let date = parse_date(&self.date)?;
        let time = parse_time(&self.time)?;
        let location = validate_location(self.location)?;
        let offset = parse_timezone(self.timezone.as_deref())?;

        let local = NaiveDateTime::new(date, time);
        let instant = offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| ValidationError::new("time", "does not exist in the given timezone"))?
            .with_timezone(&Utc);

        Ok(BirthMoment { instant, location })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new("date", "missing"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ValidationError::new("date", format!("expected YYYY-MM-DD ({})", e)))
}

fn parse_time(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::new("time", "missing"));
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|e| ValidationError::new("time", format!("expected HH:MM[:SS] ({})", e)))
}

fn validate_location(location: Option<GeoLocation>) -> Result<GeoLocation, ValidationError> {
    let location = location.ok_or_else(|| ValidationError::new("location", "missing"))?;
    if !location.lat.is_finite() || !(-90.0..=90.0).contains(&location.lat) {
        return Err(ValidationError::new(
            "location.lat",
            format!("{} is outside [-90, 90]", location.lat),
        ));
    }
    if !location.lng.is_finite() || !(-180.0..=180.0).contains(&location.lng) {
        return Err(ValidationError::new(
            "location.lng",
            format!("{} is outside [-180, 180]", location.lng),
        ));
    }
    Ok(location)
}

fn parse_timezone(raw: Option<&str>) -> Result<FixedOffset, ValidationError> {
    let utc = Utc.fix();
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(utc),
        Some(raw) => raw,
    };
    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("gmt") || raw == "Z" {
        return Ok(utc);
    }

    let invalid = || ValidationError::new("timezone", format!("expected UTC or ±HH:MM, got {:?}", raw));
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_offset_converts_to_utc() {
        let moment = BirthData::new("1990-06-15", "14:30", 40.7, -74.0)
            .with_timezone("-04:00")
            .validate()
            .unwrap();
        assert_eq!(moment.instant.hour(), 18);
        assert_eq!(moment.instant.minute(), 30);
    }

    #[test]
    fn test_seconds_accepted() {
        let moment = BirthData::new("1990-06-15", "14:30:15", 0.0, 0.0)
            .validate()
            .unwrap();
        assert_eq!(moment.instant.second(), 15);
    }

    #[test]
    fn test_each_field_named() {
        let cases = [
            (BirthData::new("1990-13-01", "12:00", 0.0, 0.0), "date"),
            (BirthData::new("", "12:00", 0.0, 0.0), "date"),
            (BirthData::new("1990-01-01", "25:00", 0.0, 0.0), "time"),
            (BirthData::new("1990-01-01", "12:00", 91.0, 0.0), "location.lat"),
            (BirthData::new("1990-01-01", "12:00", f64::NAN, 0.0), "location.lat"),
            (BirthData::new("1990-01-01", "12:00", 0.0, -181.0), "location.lng"),
            (
                BirthData::new("1990-01-01", "12:00", 0.0, 0.0).with_timezone("Mars/Olympus"),
                "timezone",
            ),
            (
                BirthData::new("1990-01-01", "12:00", 0.0, 0.0).with_timezone("+1é2"),
                "timezone",
            ),
            (
                BirthData::new("1990-01-01", "12:00", 0.0, 0.0).with_timezone("-é:30"),
                "timezone",
            ),
        ];
        for (data, field) in cases {
            assert_eq!(data.validate().unwrap_err().field, field, "{:?}", data);
        }
    }

    #[test]
    fn test_missing_location() {
        let data = BirthData {
            date: "1990-01-01".into(),
            time: "12:00".into(),
            ..Default::default()
        };
        assert_eq!(data.validate().unwrap_err().field, "location");
    }

    #[test]
    fn test_deserialize_from_json() {
        let data: BirthData = serde_json::from_str(
            r#"{"date":"1985-03-02","time":"06:05","location":{"lat":51.5,"lng":-0.12},"timezone":"Z"}"#,
        )
        .unwrap();
        assert!(data.validate().is_ok());
    }
}
