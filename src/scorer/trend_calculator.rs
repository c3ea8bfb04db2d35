use crate::config::trend_thresholds::{DOWN_PCT, UP_PCT, WINDOW_DATES};
use crate::types::{NicheRecord, Trend};

/// Trend label from the CPM history of a record.
///
/// Compares the CPM at the earliest and latest of the last `WINDOW_DATES`
/// distinct dates. This is a two-point comparison; the values in between are
/// ignored. A non-positive starting CPM reads as `Stable`.
pub fn compute_trend(record: &NicheRecord) -> Trend {
    let history = &record.historical_cpm;
    if history.len() < 2 {
        return Trend::Stable;
    }

    // BTreeMap keys are already chronological.
    let mut recent = history.values().skip(history.len().saturating_sub(WINDOW_DATES));
    let (Some(&first), Some(&last)) = (recent.next(), recent.last()) else {
        return Trend::Stable;
    };

    if first <= 0.0 {
        return Trend::Stable;
    }

    let percent_change = (last - first) / first * 100.0;
    if percent_change > UP_PCT {
        Trend::Up
    } else if percent_change < DOWN_PCT {
        Trend::Down
    } else {
        Trend::Stable
    }
}
