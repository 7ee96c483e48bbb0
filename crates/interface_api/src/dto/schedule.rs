//! Payment schedule DTOs

use serde::Deserialize;

use domain_investment::ScheduleFilter;

use crate::error::ApiError;

/// `?filter=upcoming&days=14`; the filter defaults to `all`
#[derive(Debug, Default, Deserialize)]
pub struct ScheduleQuery {
    pub filter: Option<String>,
    pub days: Option<u32>,
}

impl ScheduleQuery {
    pub fn to_filter(&self) -> Result<ScheduleFilter, ApiError> {
        let name = self.filter.as_deref().unwrap_or("all");
        ScheduleFilter::parse(name, self.days)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown schedule filter '{}'", name)))
    }
}
