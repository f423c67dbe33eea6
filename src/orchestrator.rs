//! Fetch orchestrator: runs the per-performance fetch/parse cycle across a
//! bounded worker pool, merges page data with the store and the override
//! table, and records fresh classifications once all workers have joined.
//!
//! Merge order per field: page-derived values, then stored metadata, then
//! the static override; last write wins. Any worker's parse or network
//! error aborts the whole batch; only the index fetch (discovery) degrades.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::TicketApi;
use crate::parser::availability::parse_availability;
use crate::parser::detail::{parse_detail, DetailPage};
use crate::store::Store;
use crate::types::{
    Availability, DrawRatios, DrawStatus, OverridePatch, PerformanceRecord, TicketEntry,
};

struct Resolved {
    entry: TicketEntry,
    /// A classification to persist after the batch joins; `None` when the
    /// id was already stored.
    fresh: Option<PerformanceRecord>,
}

/// Resolve every `(id, draw-status)` pair into a report entry, sorted by
/// the theater total order for the renderer.
pub async fn resolve_all(
    api: &TicketApi,
    store: &Store,
    cfg: &Config,
    overrides: &HashMap<u32, OverridePatch>,
    items: Vec<(u32, DrawStatus)>,
    today: NaiveDate,
) -> Result<Vec<TicketEntry>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let pool_size = cfg.max_pool_size.min(items.len());
    let min_duration = Duration::from_secs_f64(cfg.min_request_duration);
    info!(
        "fetching {} performance(s) with {} worker slot(s)",
        items.len(),
        pool_size
    );

    let semaphore = Semaphore::new(pool_size);
    let workers = items.iter().map(|&(id, status)| {
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            // The permit is held through the sleep, so each slot spends at
            // least min_duration of wall clock per item.
            with_min_duration(min_duration, resolve_one(api, store, id, status, today)).await
        }
    });
    let results = join_all(workers).await;

    let mut entries = Vec::with_capacity(results.len());
    let mut fresh_records = Vec::new();
    for result in results {
        let resolved = result?;
        entries.push(resolved.entry);
        if let Some(rec) = resolved.fresh {
            fresh_records.push(rec);
        }
    }

    // Writes happen only here, after every worker has joined.
    let mut inserted = 0usize;
    for rec in &fresh_records {
        if store.insert_if_absent(rec).await? {
            inserted += 1;
        }
    }
    if inserted > 0 {
        info!("recorded {inserted} newly classified performance(s)");
    }

    for entry in &mut entries {
        if let Some(patch) = overrides.get(&entry.id) {
            debug!("applying override for id {}", entry.id);
            apply_override(entry, patch);
        }
    }

    entries.sort_by_key(|e| (e.theater.rank(), e.date, e.id));
    Ok(entries)
}

/// Run `fut`, then sleep out whatever remains of `min`: the outbound rate
/// limit regardless of how fast the network responds.
async fn with_min_duration<T>(min: Duration, fut: impl Future<Output = T>) -> T {
    let started = Instant::now();
    let out = fut.await;
    if let Some(remainder) = min.checked_sub(started.elapsed()) {
        sleep(remainder).await;
    }
    out
}

async fn resolve_one(
    api: &TicketApi,
    store: &Store,
    id: u32,
    status: DrawStatus,
    today: NaiveDate,
) -> Result<Resolved> {
    let html = api.fetch_detail(id).await?;
    let page = parse_detail(&html, today)?;
    let seats = api.fetch_availability(id).await?;
    let availability = parse_availability(&seats)?;
    let stored = store.get(id).await?;
    Ok(resolve_parts(id, page, availability, stored, status))
}

/// The pure tail of the per-item cycle: classification carry-forward, the
/// store-over-page metadata merge, and the record-to-persist decision.
fn resolve_parts(
    id: u32,
    page: DetailPage,
    availability: Availability,
    stored: Option<PerformanceRecord>,
    status: DrawStatus,
) -> Resolved {
    // A stored row is authoritative even when discovery saw this id only in
    // the index (e.g. its stored date predates the window).
    let status = match &stored {
        Some(rec) => DrawStatus::Known(rec.draw),
        None => status,
    };
    let draw_ratios = effective_ratios(status, page.draw_ratios.clone());

    let fresh = match &stored {
        Some(_) => None,
        None => Some(PerformanceRecord {
            id,
            theater: page.theater,
            date: page.date,
            team: page.team.clone(),
            draw: page.draw_ratios.is_some(),
        }),
    };

    let (theater, date, team) = match &stored {
        Some(rec) => (rec.theater, rec.date, rec.team.clone()),
        None => (page.theater, page.date, page.team),
    };

    Resolved {
        entry: TicketEntry { id, theater, date, team, availability, draw_ratios },
        fresh,
    }
}

/// Ratio handling given the carried classification: a known draw keeps its
/// marker even when the page no longer surfaces ratios (placeholder), a
/// known non-draw ignores whatever the page shows, and an unknown id takes
/// the page verbatim.
fn effective_ratios(status: DrawStatus, page: Option<DrawRatios>) -> Option<DrawRatios> {
    match status {
        DrawStatus::Known(true) => Some(page.unwrap_or_else(DrawRatios::placeholder)),
        DrawStatus::Known(false) => None,
        DrawStatus::Unknown => page,
    }
}

fn apply_override(entry: &mut TicketEntry, patch: &OverridePatch) {
    if let Some(theater) = patch.theater {
        entry.theater = theater;
    }
    if let Some(date) = patch.date {
        entry.date = date;
    }
    if let Some(team) = &patch.team {
        entry.team = Some(team.clone());
    }
}
