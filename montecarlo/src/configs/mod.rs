mod schedule;
mod sweep;

pub use schedule::{Schedule, ScheduleEntry};
pub use sweep::SweepConfig;
