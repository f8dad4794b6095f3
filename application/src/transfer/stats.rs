use std::collections::HashMap;

use time::Date;

pub struct GetDailyStatsDto {
    /// Defaults to today (UTC) when absent.
    pub date: Option<Date>,
}

pub struct GetLocationStatsDto {
    pub date: Option<Date>,
}

#[derive(Debug, Clone)]
pub struct DailyStatsDto {
    pub date: Date,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct LocationStatsDto {
    pub date: Date,
    pub totals: HashMap<String, i64>,
}
