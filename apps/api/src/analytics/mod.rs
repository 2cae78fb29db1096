// Dashboard analytics: single-pass aggregation over thread rows.

pub mod aggregate;
pub mod currency;
pub mod handlers;
