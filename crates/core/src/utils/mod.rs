pub mod coerce;
pub mod time_utils;

pub use coerce::{
    coerce_bool, coerce_count, coerce_number, coerce_optional_string, coerce_ratio,
    coerce_timestamp,
};
pub use time_utils::{Clock, FixedClock, SystemClock};
