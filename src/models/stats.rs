use serde::{Deserialize, Serialize};

/// Per-station, per-year averages derived from `weather_data`.
///
/// An average is `None` when every observation for that station-year was
/// missing; nulls never count as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationYearStats {
    pub station_id: String,
    pub record_year: i16,
    pub avg_min_temp: Option<f64>,
    pub avg_max_temp: Option<f64>,
    pub avg_precipitation: Option<f64>,
}

impl StationYearStats {
    pub fn key(&self) -> (&str, i16) {
        (&self.station_id, self.record_year)
    }
}
