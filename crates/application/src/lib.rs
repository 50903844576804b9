pub mod clock;
pub mod use_cases;

pub use clock::{Clock, FixedClock, SystemClock};
pub use use_cases::*;
