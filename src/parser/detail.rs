//! Detail-page parser: session title metadata and draw demand ratios.
//!
//! The page markers (`session-name` heading, `抽选` keyword,
//! `lottery-ratio` cells) are the only coupling to the site's markup; a
//! markup drift shows up here and nowhere else.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::{AppError, Result};
use crate::labels;
use crate::types::{DrawRatios, Theater};

/// Substring whose presence marks a lottery-allocated session.
const DRAW_KEYWORD: &str = "抽选";

/// Ratio cell text for sub-threshold demand.
const RATIO_UNDER: &str = "未满";

static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<h2[^>]*class="[^"]*session-name[^"]*"[^>]*>\s*([^<]+?)\s*</h2>"#).unwrap()
});

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)星梦剧院(\d{1,2})月(\d{1,2})日(.*)$").unwrap());

static RE_RATIO_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span[^>]*class="[^"]*lottery-ratio[^"]*"[^>]*>([^<]*)</span>"#).unwrap()
});

static RE_RATIO_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^已达座位上限([0-9]+(?:\.[0-9]+)?)$").unwrap());

/// Metadata extracted from one performance detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub theater: Theater,
    pub date: NaiveDate,
    /// Canonical team label; `None` when the title suffix names no team.
    pub team: Option<String>,
    /// Present iff the page carries the draw keyword.
    pub draw_ratios: Option<DrawRatios>,
}

/// Parse a detail page. The title shape is
/// `<theater>星梦剧院<month>月<day>日<suffix>`; the year is inferred from
/// `today` and bumped forward when the month/day has already passed.
pub fn parse_detail(html: &str, today: NaiveDate) -> Result<DetailPage> {
    let title = RE_HEADING
        .captures(html)
        .map(|c| c[1].to_string())
        .ok_or_else(|| AppError::MalformedTitle("session heading not found".to_string()))?;

    let caps = RE_TITLE
        .captures(&title)
        .ok_or_else(|| AppError::MalformedTitle(title.clone()))?;

    let theater = Theater::from_name(&caps[1])?;
    let month: u32 = caps[2]
        .parse()
        .map_err(|_| AppError::MalformedTitle(title.clone()))?;
    let day: u32 = caps[3]
        .parse()
        .map_err(|_| AppError::MalformedTitle(title.clone()))?;
    let date = infer_date(month, day, today).ok_or_else(|| AppError::MalformedTitle(title.clone()))?;

    let team = labels::match_team(&caps[4]).map(str::to_string);

    let draw_ratios = if html.contains(DRAW_KEYWORD) {
        Some(parse_ratios(html)?)
    } else {
        None
    };

    Ok(DetailPage { theater, date, team, draw_ratios })
}

/// Resolve a month/day to a calendar date: current year, or the next one
/// when the result would lie in the past (year-end rollover).
fn infer_date(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(date)
    }
}

/// Extract the three positional ratio cells (vip, regular, standing-room).
fn parse_ratios(html: &str) -> Result<DrawRatios> {
    let cells: Vec<String> = RE_RATIO_CELL
        .captures_iter(html)
        .map(|c| parse_ratio_cell(c[1].trim()))
        .collect::<Result<_>>()?;

    match <[String; 3]>::try_from(cells) {
        Ok([vip, regular, standing]) => Ok(DrawRatios { vip, regular, standing }),
        Err(cells) => Err(AppError::BadRatio(format!(
            "expected 3 ratio cells, found {}",
            cells.len()
        ))),
    }
}

/// One ratio cell: `未满` → the `<1` sentinel; `已达座位上限<n>` → `n`.
/// Anything else is fatal, including non-numeric trailing content.
fn parse_ratio_cell(text: &str) -> Result<String> {
    if text.contains(RATIO_UNDER) {
        return Ok("<1".to_string());
    }
    let number = RE_RATIO_LIMIT
        .captures(text)
        .map(|c| c[1].to_string())
        .ok_or_else(|| AppError::BadRatio(text.to_string()))?;
    number
        .parse::<f64>()
        .map_err(|_| AppError::BadRatio(text.to_string()))?;
    Ok(number)
}
