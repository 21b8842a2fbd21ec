pub mod attendance;
pub mod column;
pub mod event_day;
