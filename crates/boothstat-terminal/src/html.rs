//! Self-contained HTML rendering of a report
//!
//! The document carries its own stylesheet and no scripts, so it can be opened
//! directly, attached to an email or fed to any HTML-to-PDF converter. Wide
//! windows request a landscape page.

use boothstat_core::Report;
use boothstat_core::metrics::{CompletionBand, UserRow};
use boothstat_core::types::DayKey;
use std::fmt::Write;

use crate::output::{OutputFormat, OutputFormatter};

const STYLESHEET: &str = r#"
    *{box-sizing:border-box}
    body{margin:0;font-family:system-ui,sans-serif;color:#111827;background:#fff}
    main{padding:24px}
    header{display:flex;justify-content:space-between;align-items:flex-start;gap:16px}
    h1{margin:0;font-size:22px}
    h2{margin:0 0 8px;font-size:14px}
    .meta{margin-top:6px;font-size:12px;color:#4b5563}
    .tag{display:inline-block;padding:4px 10px;border:1px solid #d1d5db;border-radius:999px;background:#f9fafb;font-weight:700;font-size:11px}
    .cards{display:grid;grid-template-columns:repeat(4,1fr);gap:12px;margin-top:14px}
    .card{border:1px solid #d1d5db;border-radius:12px;padding:12px;background:#f9fafb}
    .card .label{font-size:11px;font-weight:800;color:#374151}
    .card .value{margin-top:6px;font-size:22px;font-weight:900}
    .card .hint{margin-top:6px;font-size:11px;color:#6b7280}
    section{margin-top:14px;border:1px solid #d1d5db;border-radius:12px;padding:12px}
    .chart{display:flex;gap:8px;align-items:flex-end;height:140px}
    .col{flex:1;display:flex;flex-direction:column;height:100%}
    .track{flex:1;position:relative;display:flex;align-items:flex-end;border:1px solid #e5e7eb;border-radius:8px;overflow:hidden;background:#f9fafb}
    .fill{width:100%;background:rgba(37,99,235,0.3)}
    .count{position:absolute;top:4px;left:0;right:0;text-align:center;font-size:11px;font-weight:800}
    .day{margin-top:4px;text-align:center;font-size:10px;color:#6b7280}
    table{width:100%;border-collapse:collapse;font-size:11px}
    th{background:#f9fafb;text-align:left;padding:8px;border-bottom:1px solid #d1d5db;white-space:nowrap}
    td{padding:8px;border-bottom:1px solid #f3f4f6;vertical-align:top}
    td.num,th.num{text-align:right}
    .name{font-weight:800}
    .email{font-size:10px;color:#6b7280}
    .band{display:inline-block;padding:4px 8px;border-radius:999px;border:1px solid;font-weight:800}
    .on-target{background:#ecfdf5;border-color:#a7f3d0;color:#047857}
    .partial{background:#eff6ff;border-color:#bfdbfe;color:#1d4ed8}
    .below{background:#fef2f2;border-color:#fecaca;color:#b91c1c}
    footer{margin-top:10px;font-size:10px;color:#6b7280}
"#;

/// Escape text for inclusion in HTML element content or attribute values
///
/// # Examples
/// ```
/// use boothstat_terminal::html::escape_html;
///
/// assert_eq!(escape_html(r#"<b>"A&B's"</b>"#), "&lt;b&gt;&quot;A&amp;B&#39;s&quot;&lt;/b&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// HTML formatter producing a printable report document
#[derive(Debug, Clone, Default)]
pub struct HtmlFormatter {
    generated_on: Option<DayKey>,
}

impl HtmlFormatter {
    pub fn new(generated_on: Option<DayKey>) -> Self {
        Self { generated_on }
    }

    fn band_class(band: CompletionBand) -> &'static str {
        band.as_str()
    }

    fn document(&self, report: &Report, body: &str) -> String {
        let page = if report.is_wide() {
            "@page{size:A4 landscape;margin:14mm 10mm}"
        } else {
            "@page{size:A4;margin:14mm 10mm}"
        };
        format!(
            "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n\
             <title>Booth Entry Daily Report</title>\n<style>{STYLESHEET}    {page}\n</style>\n\
             </head>\n<body>\n<main>\n{header}{body}{footer}</main>\n</body>\n</html>\n",
            header = self.header(report),
            footer = Self::footer(report),
        )
    }

    fn header(&self, report: &Report) -> String {
        let (first, last) = report.period_labels();
        let mut out = String::new();
        out.push_str("<header>\n<div>\n<h1>Booth Entry Daily Report</h1>\n");
        let _ = writeln!(
            out,
            "<div class=\"meta\">Period: <span class=\"tag\">{}</span> → <span class=\"tag\">{}</span> \
             &nbsp; Target: <span class=\"tag\">{}/day</span></div>",
            escape_html(&first),
            escape_html(&last),
            report.quota_target
        );
        out.push_str("</div>\n");
        if let Some(day) = self.generated_on {
            let _ = writeln!(
                out,
                "<div class=\"meta\">Generated ({}): <span class=\"tag\">{}</span></div>",
                escape_html(&report.window.offset().display_name()),
                escape_html(&day.label())
            );
        }
        out.push_str("</header>\n");
        out
    }

    fn cards(report: &Report) -> String {
        let card = |label: &str, value: &str, hint: &str| {
            format!(
                "<div class=\"card\"><div class=\"label\">{}</div><div class=\"value\">{}</div>\
                 <div class=\"hint\">{}</div></div>\n",
                escape_html(label),
                escape_html(value),
                escape_html(hint)
            )
        };

        let mut out = String::from("<div class=\"cards\">\n");
        out.push_str(&card(
            &format!("Entries ({} days)", report.window_size),
            &report.range_total.to_string(),
            &format!("Avg/day: {}", report.average_per_day),
        ));
        out.push_str(&card(
            "Active Users",
            &report.active_user_count.to_string(),
            "Unique emails in period",
        ));
        out.push_str(&card(
            "Overall Completion",
            &format!("{}%", report.overall_completion_pct),
            &format!("Entries / (Users × Days × {})", report.quota_target),
        ));
        out.push_str(&card(
            "Report End Date",
            &report.window.last_day().label(),
            &report.window.offset().display_name(),
        ));
        out.push_str("</div>\n");
        out
    }

    fn trend_section(report: &Report) -> String {
        let mut out = String::from("<section>\n<h2>Trend (daily entries)</h2>\n<div class=\"chart\">\n");
        for ((label, count), height) in report
            .day_labels()
            .iter()
            .zip(report.trend.counts())
            .zip(report.trend_bar_heights())
        {
            let _ = writeln!(
                out,
                "<div class=\"col\"><div class=\"track\"><div class=\"count\">{count}</div>\
                 <div class=\"fill\" style=\"height:{height}%\"></div></div>\
                 <div class=\"day\">{}</div></div>",
                escape_html(label)
            );
        }
        out.push_str("</div>\n</section>\n");
        out
    }

    fn user_row(row: &UserRow, report: &Report) -> String {
        let mut out = String::from("<tr>\n");
        let _ = writeln!(
            out,
            "<td><div class=\"name\">{}</div><div class=\"email\">{}</div></td>",
            escape_html(&row.tally.display_name),
            escape_html(&row.tally.identity)
        );
        for cell in row.cells(report.quota_target) {
            let _ = writeln!(
                out,
                "<td><span class=\"band {}\">{} / {}</span></td>",
                Self::band_class(cell.band),
                cell.count,
                report.quota_target
            );
        }
        let _ = writeln!(
            out,
            "<td class=\"num\"><div class=\"name\">{}%</div><div class=\"email\">{} / {}</div></td>",
            row.cumulative_pct,
            row.tally.total,
            report.expected_per_user()
        );
        out.push_str("</tr>\n");
        out
    }

    fn users_section(report: &Report) -> String {
        let mut out = String::from("<section>\n<h2>User Performance (daily filled)</h2>\n");
        let _ = writeln!(
            out,
            "<div class=\"meta\">Cells show <b>x / {target}</b> • Cumulative % = total / ({days}×{target})</div>",
            target = report.quota_target,
            days = report.window_size
        );
        out.push_str("<table>\n<thead>\n<tr><th>User</th>");
        for label in report.day_labels() {
            let _ = write!(out, "<th>{}</th>", escape_html(&label));
        }
        out.push_str("<th class=\"num\">Cumulative %</th></tr>\n</thead>\n<tbody>\n");

        if report.is_empty() {
            let _ = writeln!(
                out,
                "<tr><td colspan=\"{}\">No data found.</td></tr>",
                report.window_size + 2
            );
        } else {
            for row in &report.users {
                out.push_str(&Self::user_row(row, report));
            }
        }
        out.push_str("</tbody>\n</table>\n</section>\n");
        out
    }

    fn footer(report: &Report) -> String {
        format!(
            "<footer>Times are grouped by {} day boundaries.</footer>\n",
            escape_html(&report.window.offset().display_name())
        )
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &Report) -> String {
        let body = format!(
            "{}{}{}",
            Self::cards(report),
            Self::trend_section(report),
            Self::users_section(report)
        );
        self.document(report, &body)
    }

    fn format_trend(&self, report: &Report) -> String {
        self.document(report, &Self::trend_section(report))
    }

    fn format_users(&self, report: &Report) -> String {
        self.document(report, &Self::users_section(report))
    }

    fn extension(&self) -> &'static str {
        OutputFormat::Html.extension()
    }
}
