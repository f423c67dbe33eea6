use chrono::NaiveDate;

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Theater
// ---------------------------------------------------------------------------

/// The five star-dream theaters, one per city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theater {
    Shanghai,
    Beijing,
    Guangzhou,
    Shenyang,
    Chongqing,
}

impl Theater {
    /// Map a raw city name as it appears in a session title. Anything outside
    /// the five known names is a fatal input error.
    pub fn from_name(raw: &str) -> Result<Theater> {
        match raw {
            "上海" => Ok(Theater::Shanghai),
            "北京" => Ok(Theater::Beijing),
            "广州" => Ok(Theater::Guangzhou),
            "沈阳" => Ok(Theater::Shenyang),
            "重庆" => Ok(Theater::Chongqing),
            _ => Err(AppError::UnknownTheater(raw.to_string())),
        }
    }

    pub fn cn_name(&self) -> &'static str {
        match self {
            Theater::Shanghai => "上海",
            Theater::Beijing => "北京",
            Theater::Guangzhou => "广州",
            Theater::Shenyang => "沈阳",
            Theater::Chongqing => "重庆",
        }
    }

    /// CSS-safe short code, pairwise distinct across the five theaters.
    pub fn code(&self) -> &'static str {
        match self {
            Theater::Shanghai => "sh",
            Theater::Beijing => "bj",
            Theater::Guangzhou => "gz",
            Theater::Shenyang => "sy",
            Theater::Chongqing => "cq",
        }
    }

    /// Fixed total order used to sort report rows.
    pub fn rank(&self) -> u8 {
        match self {
            Theater::Shanghai => 0,
            Theater::Beijing => 1,
            Theater::Guangzhou => 2,
            Theater::Shenyang => 3,
            Theater::Chongqing => 4,
        }
    }

    pub const ALL: [Theater; 5] = [
        Theater::Shanghai,
        Theater::Beijing,
        Theater::Guangzhou,
        Theater::Shenyang,
        Theater::Chongqing,
    ];
}

impl std::fmt::Display for Theater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cn_name())
    }
}

// ---------------------------------------------------------------------------
// Draw classification
// ---------------------------------------------------------------------------

/// Draw classification carried forward from the store during ID discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStatus {
    Known(bool),
    Unknown,
}

/// The three positional demand ratios of a draw session. Values are display
/// strings: `"<1"` for sub-threshold demand, a decimal like `"87.50"` once
/// the seat limit was reached, or `""` when the page no longer surfaces the
/// ratio for a session the store knows had a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRatios {
    pub vip: String,
    pub regular: String,
    pub standing: String,
}

impl DrawRatios {
    /// Placeholder keeping the draw marker visible after sales close.
    /// Display continuity only; the stored draw flag is the truth.
    pub fn placeholder() -> Self {
        DrawRatios {
            vip: String::new(),
            regular: String::new(),
            standing: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Seat availability
// ---------------------------------------------------------------------------

/// Per-tier "can still be bought" flags, freshly fetched each run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    pub vip: bool,
    pub regular: bool,
    pub standing: bool,
}

// ---------------------------------------------------------------------------
// Persistent record & per-render entry
// ---------------------------------------------------------------------------

/// One previously classified performance. Inserted once, never updated by
/// the pipeline; `team: None` is the explicit no-team sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceRecord {
    pub id: u32,
    pub theater: Theater,
    pub date: NaiveDate,
    pub team: Option<String>,
    pub draw: bool,
}

/// One resolved report row. Built fresh each run from the parsers plus any
/// matching stored record; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketEntry {
    pub id: u32,
    pub theater: Theater,
    pub date: NaiveDate,
    pub team: Option<String>,
    pub availability: Availability,
    pub draw_ratios: Option<DrawRatios>,
}

/// Hand-maintained per-id field replacements, applied last during the merge.
#[derive(Debug, Clone)]
pub struct OverridePatch {
    pub id: u32,
    pub theater: Option<Theater>,
    pub date: Option<NaiveDate>,
    pub team: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theater_codes_are_pairwise_distinct() {
        for a in Theater::ALL {
            for b in Theater::ALL {
                if a != b {
                    assert_ne!(a.code(), b.code(), "{a} and {b} share a code");
                }
            }
        }
    }

    #[test]
    fn theater_ranks_form_a_total_order() {
        let mut ranks: Vec<u8> = Theater::ALL.iter().map(|t| t.rank()).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn theater_from_name_round_trips() {
        for t in Theater::ALL {
            assert_eq!(Theater::from_name(t.cn_name()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_theater_is_rejected() {
        assert!(matches!(
            Theater::from_name("杭州"),
            Err(AppError::UnknownTheater(_))
        ));
        assert!(Theater::from_name("").is_err());
    }

    #[test]
    fn placeholder_ratios_are_empty() {
        let p = DrawRatios::placeholder();
        assert_eq!(p.vip, "");
        assert_eq!(p.regular, "");
        assert_eq!(p.standing, "");
    }
}
