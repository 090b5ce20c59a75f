//! Market calendar adapters.

mod session_calendar;

pub use session_calendar::{SessionCalendar, SessionWindow};
