pub mod clock;
pub mod tw_market;

pub use clock::{Clock, SystemClock};
