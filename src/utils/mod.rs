mod aggregation;

pub use aggregation::{median_excluding_zeroes, month_to_quarter, safe_rate_of_change};
