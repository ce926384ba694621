mod steady_clock;

pub use steady_clock::{SteadyClock, Timestamp};
