//! ID discovery: union of previously stored in-window identifiers and the
//! freshly fetched remote index. The index is best-effort: a failure there
//! narrows coverage instead of aborting the run.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::fetcher::TicketApi;
use crate::store::Store;
use crate::types::DrawStatus;
use crate::window::{date_from_epoch_millis, ReportWindow};

static RE_EPOCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/Date\((-?\d+)\)/$").unwrap());

/// Calendar date of one `/Date(<epoch-millis>)/` index timestamp, in the
/// report timezone.
pub fn parse_index_date(raw: &str) -> Option<NaiveDate> {
    let ms: i64 = RE_EPOCH.captures(raw)?.get(1)?.as_str().parse().ok()?;
    date_from_epoch_millis(ms)
}

/// Identifiers for the run: stored in-window ids (with their known draw
/// classification) unioned with in-window index ids, sorted by id.
pub async fn discover(
    store: &Store,
    api: &TicketApi,
    window: ReportWindow,
) -> Result<Vec<(u32, DrawStatus)>> {
    let stored = store.ids_on_or_after(window.start).await?;
    info!(
        "{} stored performance(s) dated on or after {}",
        stored.len(),
        window.start
    );

    let index = match index_ids_in_window(api, window).await {
        Ok(ids) => {
            debug!("index contributed {} in-window id(s)", ids.len());
            Some(ids)
        }
        Err(e) => {
            warn!("index fetch failed, continuing with stored ids only: {e}");
            None
        }
    };

    Ok(merge_ids(stored, index))
}

async fn index_ids_in_window(api: &TicketApi, window: ReportWindow) -> Result<Vec<u32>> {
    let entries = api.fetch_index().await?;
    let mut ids = Vec::new();
    for entry in entries {
        let date = parse_index_date(&entry.start_time)
            .ok_or_else(|| AppError::BadIndexDate(entry.start_time.clone()))?;
        if date >= window.start {
            ids.push(entry.id);
        }
    }
    Ok(ids)
}

/// Union stored and index ids. Stored classifications win; index-only ids
/// come out `Unknown`. `index: None` models a failed index fetch.
fn merge_ids(stored: Vec<(u32, bool)>, index: Option<Vec<u32>>) -> Vec<(u32, DrawStatus)> {
    let mut merged: BTreeMap<u32, DrawStatus> = stored
        .into_iter()
        .map(|(id, draw)| (id, DrawStatus::Known(draw)))
        .collect();
    for id in index.unwrap_or_default() {
        merged.entry(id).or_insert(DrawStatus::Unknown);
    }
    merged.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_date_parses_embedded_epoch_millis() {
        // 2017-07-13 16:40 UTC = 2017-07-14 00:40 in the report timezone.
        assert_eq!(
            parse_index_date("/Date(1499964000000)/"),
            Some(NaiveDate::from_ymd_opt(2017, 7, 14).unwrap())
        );
    }

    #[test]
    fn malformed_index_dates_are_rejected() {
        assert_eq!(parse_index_date("2017-07-14"), None);
        assert_eq!(parse_index_date("/Date()/"), None);
        assert_eq!(parse_index_date("/Date(abc)/"), None);
        assert_eq!(parse_index_date("Date(1499964000000)"), None);
    }

    #[test]
    fn union_keeps_stored_classifications() {
        let merged = merge_ids(vec![(2, true), (1, false)], Some(vec![2, 3]));
        assert_eq!(
            merged,
            vec![
                (1, DrawStatus::Known(false)),
                (2, DrawStatus::Known(true)),
                (3, DrawStatus::Unknown),
            ]
        );
    }

    #[test]
    fn failed_index_fetch_degrades_to_stored_ids() {
        let merged = merge_ids(vec![(9, true)], None);
        assert_eq!(merged, vec![(9, DrawStatus::Known(true))]);
    }

    #[test]
    fn empty_inputs_yield_an_empty_set() {
        assert!(merge_ids(Vec::new(), Some(Vec::new())).is_empty());
        assert!(merge_ids(Vec::new(), None).is_empty());
    }
}
