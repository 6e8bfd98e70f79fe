pub mod dispatch;
pub mod limiter;
pub mod listing;
pub mod trigger;
