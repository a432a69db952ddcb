//! ==============================================================================
//! render.rs - drawing the dashboard cards
//! ==============================================================================
//!
//! purpose:
//!     the renderer side of the dashboard. it only ever sees display models,
//!     never raw readings.
//!     - Renderer: called on every state change (ConsoleRenderer logs it)
//!     - render_page: the html page served at `/`
//!
//! relationships:
//!     - uses: display.rs (DisplayModel), chart.rs (PieChart)
//!     - used by: state.rs (Renderer), main.rs (dashboard_handler)
//!
//! ==============================================================================

use crate::chart::{PieChart, CAPTION_HINT};
use crate::display::{DisplayModel, Trend};
use crate::state::{DashboardView, NoticeLevel};

use chrono::Local;
use std::fmt::Write;

/// receives the four cards whenever the dashboard changes
pub trait Renderer: Send + Sync {
    fn render(&self, cards: &[DisplayModel; 4], loading: bool);
}

// ==============================================================================
// console renderer
// ==============================================================================

pub struct ConsoleRenderer {
    show_sensor_data: bool,
}

impl ConsoleRenderer {
    pub fn new(show_sensor_data: bool) -> Self {
        Self { show_sensor_data }
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, cards: &[DisplayModel; 4], loading: bool) {
        if loading || !self.show_sensor_data {
            return;
        }
        for line in cards.iter().map(summary_line) {
            tracing::info!("{}", line);
        }
    }
}

/// one log line per card, e.g. `Gas Sensor Readings: 150 ppm ↑ (Good)`
pub fn summary_line(card: &DisplayModel) -> String {
    let mut line = format!("{}: {}", card.title, card.formatted_value);
    if card.pie.is_some() {
        line.push_str("°C");
    }
    match card.trend {
        Trend::Up => line.push_str(" ↑"),
        Trend::Down => line.push_str(" ↓"),
        Trend::None => {}
    }
    if let Some(pie) = &card.pie {
        let _ = write!(line, " ({}% of {}°C)", pie.slices.percentage, pie.max);
    }
    if let Some(classification) = card.classification {
        let _ = write!(line, " ({})", classification);
    }
    line
}

// ==============================================================================
// html page
// ==============================================================================

/// full dashboard page. `refresh_seconds` > 0 makes the browser reload it.
pub fn render_page(view: &DashboardView, refresh_seconds: u64) -> String {
    let refresh = if refresh_seconds > 0 {
        format!(r#"<meta http-equiv="refresh" content="{}">"#, refresh_seconds)
    } else {
        String::new()
    };

    let body = if view.loading {
        r#"<div class="center"><div class="spinner"></div></div>"#.to_string()
    } else {
        let mut cards = String::new();
        for card in &view.cards {
            cards.push_str(&match &card.pie {
                Some(pie) => pie_card(card.title, pie),
                None => value_card(card),
            });
        }

        let toast = view
            .toast
            .as_ref()
            .map(|n| {
                let class = match n.level {
                    NoticeLevel::Success => "toast toast-success",
                    NoticeLevel::Error => "toast toast-error",
                };
                format!(r#"<div class="{}">{}</div>"#, class, html_escape(&n.message))
            })
            .unwrap_or_default();

        let updated = view
            .last_updated
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            r#"{toast}
<h1>Sensor Readings Dashboard</h1>
<div class="grid">{cards}</div>
<div class="footer">Last updated: {updated}</div>"#
        )
    };

    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>Sensor Readings Dashboard</title>
{refresh}
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>"#
    )
}

fn value_card(card: &DisplayModel) -> String {
    let arrow = match card.trend {
        Trend::Up => r#"<span class="trend up">▲</span>"#,
        Trend::Down => r#"<span class="trend down">▼</span>"#,
        Trend::None => "",
    };
    let badge = match (card.classification, card.badge) {
        (Some(c), Some(tier)) => format!(
            r#"<div><span class="badge {}">{}</span></div>"#,
            tier.css_class(),
            html_escape(c.label())
        ),
        _ => String::new(),
    };
    format!(
        r#"<div class="card"><h2>{}</h2><div class="value"><span>{}</span>{}</div>{}</div>"#,
        html_escape(card.title),
        html_escape(&card.formatted_value),
        arrow,
        badge
    )
}

fn pie_card(title: &str, pie: &PieChart) -> String {
    // the inner circle's stroke fills the disc; with pathLength 100 the dash
    // length is the current share in percent
    let share = pie.slices.current_share() * 100.0;
    let [current, remaining] = &pie.segments;
    format!(
        r#"<div class="card pie-card" tabindex="0"><h2>{title}</h2>
<div class="caption"><span class="hint">{hint}</span><span class="reveal">{caption}</span></div>
<svg viewBox="0 0 42 42" class="pie">
<circle r="20" cx="21" cy="21" fill="{remaining_color}"/>
<circle r="10" cx="21" cy="21" fill="transparent" stroke="{current_color}" stroke-width="20" pathLength="100" stroke-dasharray="{share:.2} 100" transform="rotate(-90 21 21)"/>
<text x="21" y="21" text-anchor="middle" dominant-baseline="middle" class="center-text">{center}</text>
</svg>
<ul class="legend"><li><i style="background:{current_color}"></i>{current_label}</li><li><i style="background:{remaining_color}"></i>{remaining_label}</li></ul>
</div>"#,
        title = html_escape(title),
        hint = html_escape(CAPTION_HINT),
        caption = html_escape(&pie.caption),
        current_color = current.color,
        remaining_color = remaining.color,
        center = html_escape(&pie.center_text),
        current_label = html_escape(&current.label),
        remaining_label = html_escape(&remaining.label),
    )
}

/// escape html special characters to prevent xss
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f2f2f2; margin: 0; padding: 2rem; color: #1f2937; }
h1 { text-align: center; font-size: 2.25rem; margin-bottom: 2rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 1.5rem; max-width: 80rem; margin: 0 auto; }
.card { background: #fff; border-radius: 1rem; box-shadow: 0 10px 20px rgba(0,0,0,.08); padding: 1.5rem; }
.card h2 { color: #570df8; font-size: 1.15rem; margin: 0 0 1rem; }
.value { display: flex; align-items: center; gap: .5rem; font-size: 1.9rem; font-weight: 700; }
.trend.up { color: #36d399; } .trend.down { color: #f87272; }
.badge { display: inline-block; margin-top: .5rem; padding: .1rem .6rem; border-radius: 1rem; font-size: .85rem; color: #fff; }
.badge-success { background: #36d399; } .badge-info { background: #3abff8; }
.badge-warning { background: #fbbd23; } .badge-error { background: #f87272; }
.caption { text-align: center; font-size: .85rem; color: #4b5563; margin-bottom: .5rem; }
.caption .reveal { display: none; }
.pie-card { cursor: pointer; outline: none; }
.pie-card:hover .caption .hint, .pie-card:focus .caption .hint { display: none; }
.pie-card:hover .caption .reveal, .pie-card:focus .caption .reveal { display: inline; }
.pie { width: 100%; height: 12rem; }
.center-text { font-size: 5px; fill: #000; }
.legend { list-style: none; padding: 0; color: #9ca3af; font-size: .9rem; }
.legend i { display: inline-block; width: .8rem; height: .8rem; margin-right: .4rem; border: 1px solid #ddd; }
.footer { margin-top: 2rem; text-align: center; font-size: .85rem; color: #6b7280; }
.toast { position: fixed; top: 1rem; right: 1rem; padding: .75rem 1rem; border-radius: .5rem; background: #fff; box-shadow: 0 4px 12px rgba(0,0,0,.15); }
.toast-success { border-left: 4px solid #36d399; } .toast-error { border-left: 4px solid #f87272; }
.center { display: flex; justify-content: center; align-items: center; min-height: 80vh; }
.spinner { width: 3rem; height: 3rem; border: 4px solid #ddd; border-top-color: #570df8; border-radius: 50%; animation: spin 1s linear infinite; }
@keyframes spin { to { transform: rotate(360deg); } }
"#;
