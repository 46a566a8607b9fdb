use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;

/// Total harvested yield for one year. The year is unique across the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct YieldRecord {
    #[validate(range(min = 1800, max = 2200))]
    pub record_year: i16,

    #[validate(range(min = 0))]
    pub total_yield: i32,
}

impl YieldRecord {
    pub fn new(record_year: i16, total_yield: i32) -> Result<Self> {
        let record = Self {
            record_year,
            total_yield,
        };
        record.validate()?;
        Ok(record)
    }
}
