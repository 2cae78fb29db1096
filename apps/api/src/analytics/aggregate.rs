use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::analytics::currency::{format_currency_total, parse_currency_amount};
use crate::models::thread::{PriorityLevel, Thread};

/// Trailing window for the "recent activity" count.
pub const RECENT_ACTIVITY_WINDOW_DAYS: i64 = 7;

/// Histogram key for threads with no value type.
pub const UNKNOWN_VALUE_TYPE: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThreadStats {
    pub total_threads: usize,
    pub unprocessed_threads: usize,
    pub high_priority_threads: usize,
    pub processed_threads: usize,
    pub recent_activity: usize,
    pub value_type_breakdown: BTreeMap<String, usize>,
    pub priority_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorStats {
    pub total_sponsors: usize,
    pub high_priority_sponsors: usize,
    pub monetary_sponsors: usize,
    pub in_kind_sponsors: usize,
    pub total_value_amount: f64,
    pub total_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub threads: ThreadStats,
    pub sponsors: SponsorStats,
}

/// Computes every dashboard counter in one pass over `threads`.
pub fn aggregate(threads: &[Thread], now: DateTime<Utc>) -> AnalyticsSummary {
    let recent_since = now - Duration::days(RECENT_ACTIVITY_WINDOW_DAYS);
    let mut stats = ThreadStats::default();
    let mut sponsors = SponsorStats::default();

    for thread in threads {
        stats.total_threads += 1;

        match thread.llm_processed {
            Some(true) => stats.processed_threads += 1,
            Some(false) => stats.unprocessed_threads += 1,
            None => {}
        }

        let priority = thread.priority_level.unwrap_or(PriorityLevel::Normal);
        if priority.is_high() {
            stats.high_priority_threads += 1;
        }
        *stats
            .priority_breakdown
            .entry(priority.as_str().to_string())
            .or_default() += 1;

        let value_type = thread
            .value_type
            .map(|vt| vt.as_str())
            .unwrap_or(UNKNOWN_VALUE_TYPE);
        *stats
            .value_type_breakdown
            .entry(value_type.to_string())
            .or_default() += 1;

        if thread.updated_at >= recent_since && thread.updated_at < now {
            stats.recent_activity += 1;
        }

        if thread.sponsor_org_name.is_none() {
            continue;
        }

        sponsors.total_sponsors += 1;
        if priority.is_high() {
            sponsors.high_priority_sponsors += 1;
        }
        if thread.value_type.is_some_and(|vt| vt.is_monetary_like()) {
            sponsors.monetary_sponsors += 1;
        } else {
            sponsors.in_kind_sponsors += 1;
        }
        if let Some(amount) = thread
            .estimated_value_amount
            .as_deref()
            .and_then(parse_currency_amount)
        {
            sponsors.total_value_amount += amount;
        }
    }

    sponsors.total_value = format_currency_total(sponsors.total_value_amount);

    AnalyticsSummary {
        threads: stats,
        sponsors,
    }
}
