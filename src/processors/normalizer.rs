use crate::error::{ProcessingError, Result};
use crate::models::{RawRow, WeatherRecord, YieldRecord};
use crate::utils::constants::{PACKED_DATE_FORMAT, PACKED_DATE_LEN, SENTINEL_MISSING};
use chrono::NaiveDate;

/// Turns parsed rows into validated records. Pure: one row in, one record or
/// one error out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize_weather(&self, row: &RawRow) -> Result<WeatherRecord> {
        let station_id = row.source_id.as_deref().ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("Weather row at line {} has no station", row.line))
        })?;

        let record_date = decode_date(required(row, "record_date")?)?;
        let max_temp = decode_measurement("max_temp", required(row, "max_temp")?)?;
        let min_temp = decode_measurement("min_temp", required(row, "min_temp")?)?;
        let precipitation = decode_measurement("precipitation", required(row, "precipitation")?)?;

        WeatherRecord::new(station_id, record_date, max_temp, min_temp, precipitation)
    }

    pub fn normalize_yield(&self, row: &RawRow) -> Result<YieldRecord> {
        let record_year = decode_integer::<i16>("record_year", required(row, "record_year")?)?;
        let total_yield = decode_integer::<i32>("total_yield", required(row, "total_yield")?)?;

        YieldRecord::new(record_year, total_yield)
    }
}

fn required<'a>(row: &'a RawRow, field: &'static str) -> Result<&'a str> {
    row.field(field).ok_or_else(|| ProcessingError::MalformedValue {
        field,
        value: String::new(),
    })
}

/// Decode a packed `YYYYMMDD` value into a calendar date
pub fn decode_date(value: &str) -> Result<NaiveDate> {
    if value.len() != PACKED_DATE_LEN || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProcessingError::InvalidDate(value.to_string()));
    }

    let year: i32 = value[0..4].parse().map_err(|_| ProcessingError::InvalidDate(value.to_string()))?;
    let month: u32 = value[4..6].parse().map_err(|_| ProcessingError::InvalidDate(value.to_string()))?;
    let day: u32 = value[6..8].parse().map_err(|_| ProcessingError::InvalidDate(value.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ProcessingError::InvalidDate(value.to_string()))
}

/// Encode a date back into its packed `YYYYMMDD` form
pub fn encode_date(date: NaiveDate) -> String {
    date.format(PACKED_DATE_FORMAT).to_string()
}

/// Decode a weather measurement; the sentinel becomes `None`
pub fn decode_measurement(field: &'static str, value: &str) -> Result<Option<i32>> {
    let measurement = decode_integer::<i32>(field, value)?;
    if measurement == SENTINEL_MISSING {
        Ok(None)
    } else {
        Ok(Some(measurement))
    }
}

fn decode_integer<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| ProcessingError::MalformedValue {
        field,
        value: value.to_string(),
    })
}
