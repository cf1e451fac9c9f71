pub mod admin;
pub mod alert;
pub mod alert_rule;
pub mod disaster;
pub mod earthquake_log;
pub mod location;
pub mod setting;
pub mod weather_log;
