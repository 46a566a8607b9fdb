use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;

/// One station-day of observations. Measurements are in tenths of a unit and
/// `None` where the source file carried the missing-value sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WeatherRecord {
    pub record_date: NaiveDate,

    // Tenths of °C
    #[validate(range(min = -900, max = 700))]
    pub max_temp: Option<i32>,

    #[validate(range(min = -900, max = 700))]
    pub min_temp: Option<i32>,

    // Tenths of mm
    #[validate(range(min = 0, max = 20000))]
    pub precipitation: Option<i32>,

    #[validate(length(min = 1, max = 11))]
    pub station_id: String,
}

impl WeatherRecord {
    pub fn new(
        station_id: impl Into<String>,
        record_date: NaiveDate,
        max_temp: Option<i32>,
        min_temp: Option<i32>,
        precipitation: Option<i32>,
    ) -> Result<Self> {
        let record = Self {
            record_date,
            max_temp,
            min_temp,
            precipitation,
            station_id: station_id.into(),
        };
        record.validate()?;
        Ok(record)
    }
}
