//! SVG report renderer. Pure string templating: entries in, document out.
//! The caller is responsible for sorting entries by the theater total order
//! before rendering; this module draws rows in the order given.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use crate::error::Result;
use crate::labels;
use crate::types::TicketEntry;
use crate::window::ReportWindow;

const WIDTH: usize = 900;
const HEADER_H: usize = 76;
const ROW_H: usize = 34;
const FOOTER_H: usize = 30;

const STYLE: &str = r#"<style>
text { font-family: 'Noto Sans SC', 'PingFang SC', sans-serif; font-size: 14px; fill: #333; }
.title { font-size: 20px; font-weight: bold; }
.colhead { font-size: 12px; fill: #888; }
.theater { font-weight: bold; }
.th-sh { fill: #2878b5; }
.th-bj { fill: #c82423; }
.th-gz { fill: #f28e2b; }
.th-sy { fill: #54a24b; }
.th-cq { fill: #9467bd; }
.team { fill: #9b9b9b; }
.team-s2 { fill: #91ccf4; }
.team-n2 { fill: #b2a7e0; }
.team-h2 { fill: #f8a13f; }
.team-x { fill: #9fd9e3; }
.team-x2 { fill: #7cc4a0; }
.team-b { fill: #7fb3e0; }
.team-e { fill: #8bc98b; }
.team-j { fill: #e08a8a; }
.team-g { fill: #f0c66a; }
.team-n3 { fill: #c9a0dc; }
.team-z { fill: #88c5c9; }
.team-s3 { fill: #e8a5c0; }
.team-h3 { fill: #a3b86c; }
.team-c { fill: #d4956a; }
.team-k { fill: #8d9fd4; }
.team-label { font-size: 12px; fill: #fff; }
.seat { stroke: #d0d0d0; stroke-width: 1; }
.open { fill: #8fd18f; }
.closed { fill: #ececec; }
.seat-label { font-size: 12px; }
.draw-mark { fill: #d9534f; font-weight: bold; }
.ratio { font-size: 12px; fill: #666; }
.footnote { font-size: 11px; fill: #999; }
</style>
"#;

/// Minimal XML text escaping; the ratio sentinel `<1` must not open a tag.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Render the weekly report. Deterministic for a fixed input.
pub fn render_svg(
    entries: &[TicketEntry],
    window: ReportWindow,
    generated_at: DateTime<FixedOffset>,
) -> String {
    let height = HEADER_H + entries.len() * ROW_H + FOOTER_H;
    let mut svg = String::with_capacity(4096 + entries.len() * 512);

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}">"#
    ));
    svg.push('\n');
    svg.push_str(STYLE);
    svg.push_str(&format!(
        "<text class=\"title\" x=\"20\" y=\"32\">星梦剧院售票周报 {} 至 {}</text>\n",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d"),
    ));
    svg.push_str(concat!(
        "<text class=\"colhead\" x=\"20\" y=\"60\">剧院</text>",
        "<text class=\"colhead\" x=\"100\" y=\"60\">日期</text>",
        "<text class=\"colhead\" x=\"190\" y=\"60\">队伍</text>",
        "<text class=\"colhead\" x=\"280\" y=\"60\">抽选</text>",
        "<text class=\"colhead\" x=\"560\" y=\"60\">VIP票</text>",
        "<text class=\"colhead\" x=\"670\" y=\"60\">普通票</text>",
        "<text class=\"colhead\" x=\"780\" y=\"60\">站票</text>\n",
    ));

    for (i, entry) in entries.iter().enumerate() {
        let top = HEADER_H + i * ROW_H;
        let baseline = top + 22;
        svg.push_str("<g class=\"row\">");

        svg.push_str(&format!(
            "<text class=\"theater th-{}\" x=\"20\" y=\"{baseline}\">{}</text>",
            entry.theater.code(),
            entry.theater.cn_name(),
        ));
        svg.push_str(&format!(
            "<text x=\"100\" y=\"{baseline}\">{}</text>",
            entry.date.format("%-m月%-d日"),
        ));

        if let Some(team) = &entry.team {
            let css = labels::team_css(team);
            let class = if css.is_empty() {
                "team".to_string()
            } else {
                format!("team team-{css}")
            };
            svg.push_str(&format!(
                "<rect class=\"{class}\" x=\"186\" y=\"{}\" width=\"52\" height=\"20\" rx=\"4\"/>\
                 <text class=\"team-label\" x=\"194\" y=\"{}\">{}</text>",
                top + 6,
                top + 21,
                xml_escape(team),
            ));
        }

        if let Some(ratios) = &entry.draw_ratios {
            svg.push_str(&format!(
                "<text class=\"draw-mark\" x=\"280\" y=\"{baseline}\">抽</text>"
            ));
            let cells = [&ratios.vip, &ratios.regular, &ratios.standing];
            if cells.iter().any(|c| !c.is_empty()) {
                let text = cells
                    .map(|c| xml_escape(c))
                    .join(" / ");
                svg.push_str(&format!(
                    "<text class=\"ratio\" x=\"310\" y=\"{baseline}\">{text}</text>"
                ));
            }
        }

        for (x, open) in [
            (556, entry.availability.vip),
            (666, entry.availability.regular),
            (776, entry.availability.standing),
        ] {
            let state = if open { "open" } else { "closed" };
            let label = if open { "有票" } else { "售罄" };
            svg.push_str(&format!(
                "<rect class=\"seat {state}\" x=\"{x}\" y=\"{}\" width=\"72\" height=\"22\" rx=\"3\"/>\
                 <text class=\"seat-label\" x=\"{}\" y=\"{}\">{label}</text>",
                top + 5,
                x + 22,
                top + 21,
            ));
        }

        svg.push_str("</g>\n");
    }

    svg.push_str(&format!(
        "<text class=\"footnote\" x=\"20\" y=\"{}\">生成于 {}</text>\n",
        height - 10,
        generated_at.format("%Y-%m-%d %H:%M:%S %:z"),
    ));
    svg.push_str("</svg>\n");
    svg
}

/// Write the document under `<out_dir>/<iso-week>/tickets-<timestamp>.svg`
/// and return the path.
pub fn write_report(
    out_dir: &Path,
    window: ReportWindow,
    generated_at: DateTime<FixedOffset>,
    svg: &str,
) -> Result<PathBuf> {
    let dir = out_dir.join(window.iso_week_label());
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("tickets-{}.svg", generated_at.format("%Y%m%d-%H%M%S")));
    std::fs::write(&path, svg)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Availability, DrawRatios, Theater};
    use chrono::{NaiveDate, TimeZone};
    use crate::window::report_tz;

    fn window() -> ReportWindow {
        ReportWindow {
            start: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 8, 16).unwrap(),
        }
    }

    fn generated_at() -> DateTime<FixedOffset> {
        report_tz().with_ymd_and_hms(2026, 8, 6, 15, 30, 0).unwrap()
    }

    fn entry(id: u32, theater: Theater) -> TicketEntry {
        TicketEntry {
            id,
            theater,
            date: NaiveDate::from_ymd_opt(2026, 8, 12).unwrap(),
            team: Some("SⅡ".to_string()),
            availability: Availability { vip: true, regular: false, standing: true },
            draw_ratios: None,
        }
    }

    #[test]
    fn one_row_per_entry() {
        let entries = vec![entry(1, Theater::Shanghai), entry(2, Theater::Beijing)];
        let svg = render_svg(&entries, window(), generated_at());
        assert_eq!(svg.matches("<g class=\"row\">").count(), 2);
    }

    #[test]
    fn availability_cells_are_open_only_when_true() {
        let svg = render_svg(&[entry(1, Theater::Shanghai)], window(), generated_at());
        assert_eq!(svg.matches("seat open").count(), 2);
        assert_eq!(svg.matches("seat closed").count(), 1);
    }

    #[test]
    fn ratio_sentinel_is_xml_escaped() {
        let mut e = entry(1, Theater::Shanghai);
        e.draw_ratios = Some(DrawRatios {
            vip: "87.50".to_string(),
            regular: "3.20".to_string(),
            standing: "<1".to_string(),
        });
        let svg = render_svg(&[e], window(), generated_at());
        assert!(svg.contains("87.50 / 3.20 / &lt;1"));
        assert!(!svg.contains("/ <1"));
    }

    #[test]
    fn placeholder_ratios_keep_the_marker_without_text() {
        let mut e = entry(1, Theater::Shanghai);
        e.draw_ratios = Some(DrawRatios::placeholder());
        let svg = render_svg(&[e], window(), generated_at());
        assert!(svg.contains(">抽</text>"));
        assert!(!svg.contains("class=\"ratio\""));
    }

    #[test]
    fn entry_without_draw_has_no_marker() {
        let svg = render_svg(&[entry(1, Theater::Shanghai)], window(), generated_at());
        assert!(!svg.contains(">抽</text>"));
    }

    #[test]
    fn renderer_preserves_the_given_order() {
        // Deliberately out of theater order: the renderer must not sort.
        let entries = vec![entry(1, Theater::Chongqing), entry(2, Theater::Shanghai)];
        let svg = render_svg(&entries, window(), generated_at());
        let cq = svg.find("th-cq").unwrap();
        let sh = svg.find("th-sh").unwrap();
        assert!(cq < sh);
    }

    #[test]
    fn theater_code_drives_the_row_class() {
        let svg = render_svg(&[entry(1, Theater::Guangzhou)], window(), generated_at());
        assert!(svg.contains("theater th-gz"));
    }

    #[test]
    fn header_carries_the_window_bounds() {
        let svg = render_svg(&[], window(), generated_at());
        assert!(svg.contains("2026-08-10 至 2026-08-16"));
    }

    #[test]
    fn report_lands_in_the_iso_week_directory() {
        let dir = tempfile::tempdir().unwrap();
        let svg = render_svg(&[entry(1, Theater::Shanghai)], window(), generated_at());
        let path = write_report(dir.path(), window(), generated_at(), &svg).unwrap();
        assert_eq!(
            path,
            dir.path().join("2026-W33").join("tickets-20260806-153000.svg")
        );
        assert!(path.exists());
    }

    #[test]
    fn escaping_covers_the_xml_specials() {
        assert_eq!(xml_escape("<1 & more>"), "&lt;1 &amp; more&gt;");
        assert_eq!(xml_escape("87.50"), "87.50");
    }
}
