//! Team label matching and CSS class lookup.
//!
//! Session titles carry the team as a free-form suffix ("SⅡ队剧场公演",
//! "XII队特别公演", etc). Matching walks an ordered prefix table: longer
//! patterns sit above the shorter ones they overlap ("XII" before "X",
//! "SIII" before "SII"), so the table order is load-bearing.

/// Ordered (prefix, canonical label) table. Both the Roman-numeral Unicode
/// spelling and the plain-ASCII spelling of a team resolve to the same
/// canonical label.
const TEAM_PREFIXES: &[(&str, &str)] = &[
    ("SIII", "SⅢ"),
    ("SⅢ", "SⅢ"),
    ("SII", "SⅡ"),
    ("SⅡ", "SⅡ"),
    ("NIII", "NⅢ"),
    ("NⅢ", "NⅢ"),
    ("NII", "NⅡ"),
    ("NⅡ", "NⅡ"),
    ("HIII", "HⅢ"),
    ("HⅢ", "HⅢ"),
    ("HII", "HⅡ"),
    ("HⅡ", "HⅡ"),
    ("XII", "XⅡ"),
    ("XⅡ", "XⅡ"),
    ("X", "X"),
    ("B", "B"),
    ("E", "E"),
    ("J", "J"),
    ("G", "G"),
    ("Z", "Z"),
    ("C", "C"),
    ("K", "K"),
];

/// Match a raw title suffix against the team table.
/// `None` is the explicit no-team sentinel (joint shows, specials).
pub fn match_team(raw: &str) -> Option<&'static str> {
    TEAM_PREFIXES
        .iter()
        .find(|(prefix, _)| raw.starts_with(prefix))
        .map(|&(_, label)| label)
}

/// Canonical team label → CSS-safe identifier. Unknown labels get an empty
/// string so the rendered cell simply carries no team class.
pub fn team_css(label: &str) -> &'static str {
    match label {
        "SⅡ" => "s2",
        "NⅡ" => "n2",
        "HⅡ" => "h2",
        "X" => "x",
        "XⅡ" => "x2",
        "B" => "b",
        "E" => "e",
        "J" => "j",
        "G" => "g",
        "NⅢ" => "n3",
        "Z" => "z",
        "SⅢ" => "s3",
        "HⅢ" => "h3",
        "C" => "c",
        "K" => "k",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_unicode_spellings_agree() {
        assert_eq!(match_team("SII队剧场公演"), Some("SⅡ"));
        assert_eq!(match_team("SⅡ队剧场公演"), Some("SⅡ"));
        assert_eq!(match_team("NIII队公演"), Some("NⅢ"));
        assert_eq!(match_team("NⅢ队公演"), Some("NⅢ"));
    }

    #[test]
    fn longer_prefixes_win_over_shorter_overlaps() {
        // "SII队甲" must hit the SⅡ row, never a bare-"S" class.
        assert_eq!(match_team("SII队甲"), Some("SⅡ"));
        // "XII…" overlaps the bare "X" team and must resolve to XⅡ.
        assert_eq!(match_team("XII队特别公演"), Some("XⅡ"));
        assert_eq!(match_team("XⅡ队公演"), Some("XⅡ"));
        assert_eq!(match_team("X队公演"), Some("X"));
    }

    #[test]
    fn unmatched_suffix_is_the_no_team_sentinel() {
        assert_eq!(match_team("新年特别公演"), None);
        assert_eq!(match_team(""), None);
    }

    #[test]
    fn css_classes_cover_every_canonical_label() {
        for (_, label) in TEAM_PREFIXES {
            assert!(!team_css(label).is_empty(), "no css class for {label}");
        }
    }

    #[test]
    fn unknown_label_maps_to_empty_css_class() {
        assert_eq!(team_css("Q"), "");
        assert_eq!(team_css(""), "");
    }
}
