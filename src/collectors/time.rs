use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerTime {
    pub current_time: String,
}

pub fn collect_time() -> ServerTime {
    server_time_at(Local::now())
}

pub fn server_time_at<Tz: TimeZone>(now: DateTime<Tz>) -> ServerTime
where
    Tz::Offset: std::fmt::Display,
{
    ServerTime {
        current_time: now.format("%Y-%m-%d %H:%M").to_string(),
    }
}
