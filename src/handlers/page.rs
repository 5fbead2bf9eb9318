use crate::models::readings::{format_date, format_timestamp};
use crate::models::{LoadedReadings, Notice, NoticeLevel, RangeQuery, SessionPhase, TokenState};
use crate::services::chart::sorted_readings;
use crate::services::{summarize, to_chart_series};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;
use time::OffsetDateTime;

const PLOTLY_SRC: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 260px; padding: 1rem; background: #f4f6f8; }
main { flex: 1; padding: 1rem 2rem; }
.notice { padding: .6rem 1rem; border-radius: 6px; margin: .4rem 0; }
.success { background: #e6f4ea; } .info { background: #e8f0fe; }
.warning { background: #fef7e0; } .error { background: #fce8e6; }
.metrics { display: flex; gap: 1rem; margin: 1rem 0; }
.metric { background: #f4f6f8; padding: .8rem 1rem; border-radius: 6px; min-width: 120px; }
.metric b { display: block; font-size: 1.3rem; }
.connect { display: inline-block; background: #4CAF50; color: white; padding: 15px 40px;
  border-radius: 8px; text-decoration: none; font-size: 18px; }
table { border-collapse: collapse; } td, th { padding: .2rem .8rem; border-bottom: 1px solid #ddd; }
"#;

const CHART_SCRIPT: &str = r#"
const series = __SERIES__;
const trace = {
  x: series.points.map(p => p.timestamp),
  y: series.points.map(p => p.value),
  mode: 'lines+markers',
  name: 'Glucose Level',
  line: { color: 'blue', width: 2 },
  marker: { size: 6, color: series.points.map(p => p.color), line: { width: 1, color: 'white' } }
};
const band = series.target_band;
const shapes = [{ type: 'rect', xref: 'paper', x0: 0, x1: 1, y0: band.low, y1: band.high,
  fillcolor: band.fill, opacity: band.opacity, line: { width: 0 } }]
  .concat(series.reference_lines.map(l => ({ type: 'line', xref: 'paper', x0: 0, x1: 1,
    y0: l.value, y1: l.value, line: { color: l.color, dash: 'dash' } })));
const annotations = series.reference_lines.map(l => ({ xref: 'paper', x: 1, y: l.value,
  text: l.label, showarrow: false, xanchor: 'right', yanchor: 'bottom' }))
  .concat([{ xref: 'paper', x: 0, y: band.high, text: band.label, showarrow: false,
    xanchor: 'left', yanchor: 'top' }]);
Plotly.newPlot('chart', [trace], {
  title: 'Glucose Levels Over Time', xaxis: { title: 'Time' },
  yaxis: { title: 'Glucose (mg/dL)' }, height: 500, showlegend: true,
  hovermode: 'x unified', shapes, annotations
}, { responsive: true });
"#;

pub struct DashboardView<'a> {
    pub phase: SessionPhase,
    pub notices: &'a [Notice],
    pub authorization_url: Option<&'a str>,
    pub token: Option<&'a TokenState>,
    pub now: OffsetDateTime,
    pub form_range: RangeQuery,
    pub loaded: Option<&'a LoadedReadings>,
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let mut body = String::new();

    if view.phase == SessionPhase::Authenticated {
        body.push_str(&render_sidebar(view));
    }

    body.push_str("<main><h1>Dexcom Data Viewer</h1>");
    body.push_str(&render_notices(view.notices));

    match view.token {
        Some(token) => {
            if token.expires_soon(view.now) {
                body.push_str(&render_notices(&[Notice::warning(
                    "Your access token will expire soon. Consider refreshing it.",
                )]));
            }
            body.push_str(r#"<p class="notice success">Connected to Dexcom</p>"#);
            body.push_str("<h2>Glucose Data Dashboard</h2>");
            match view.loaded {
                Some(loaded) => body.push_str(&render_loaded(loaded)),
                None => body.push_str("<p>Pick a date range and load your glucose data.</p>"),
            }
        }
        None => body.push_str(&render_connect(view.authorization_url)),
    }

    body.push_str("</main>");
    page("Dexcom Data Viewer", &body, view.loaded.is_some())
}

/// Served on every route when the credentials are missing.
pub fn render_config_error(message: &str) -> String {
    let body = format!(
        r#"<main><h1>Dexcom Data Viewer</h1>
<p class="notice error">{}</p>
<h3>Setup instructions</h3>
<ol>
<li>Create a <code>.env</code> file next to the server binary.</li>
<li>Add your Dexcom credentials:
<pre>DEXCOM_CLIENT_ID=your_client_id
DEXCOM_CLIENT_SECRET=your_client_secret
DEXCOM_REDIRECT_URI=http://localhost:8501</pre></li>
<li>Restart the server.</li>
</ol></main>"#,
        encode_text(message)
    );
    page("Dexcom Data Viewer: configuration error", &body, false)
}

fn page(title: &str, body: &str, with_chart: bool) -> String {
    let script = if with_chart {
        format!(r#"<script src="{PLOTLY_SRC}"></script>"#)
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{}</title>
    <style>{STYLE}</style>
    {script}
</head>
<body>{body}</body>
</html>"#,
        encode_text(title)
    )
}

fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| {
            let class = match notice.level {
                NoticeLevel::Success => "success",
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            format!(
                r#"<p class="notice {class}">{}</p>"#,
                encode_text(&notice.message)
            )
        })
        .collect()
}

fn render_sidebar(view: &DashboardView<'_>) -> String {
    let start = format_date(view.form_range.start().date());
    let end = format_date(view.form_range.end().date());

    let mut html = format!(
        r#"<aside>
<h3>Data Controls</h3>
<form method="post" action="/readings/load">
  <label>Start Date <input type="date" name="start" value="{start}"></label><br>
  <label>End Date <input type="date" name="end" value="{end}"></label><br>
  <button type="submit">Load Glucose Data</button>
</form>
<h4>Quick Ranges</h4>
<form method="post" action="/readings/load"><input type="hidden" name="preset" value="today"><button>Today</button></form>
<form method="post" action="/readings/load"><input type="hidden" name="preset" value="last3days"><button>Last 3 Days</button></form>
<h4>Authentication</h4>
<form method="post" action="/oauth/refresh"><button>Refresh Token</button></form>
<form method="post" action="/oauth/disconnect"><button>Disconnect</button></form>
"#
    );

    if let Some(token) = view.token {
        let remaining = token.remaining(view.now);
        if remaining.is_positive() {
            let _ = write!(
                html,
                r#"<p class="notice info">Token expires in: {}h {}m</p>"#,
                remaining.whole_hours(),
                remaining.whole_minutes() % 60
            );
        } else {
            html.push_str(r#"<p class="notice warning">Token has expired</p>"#);
        }
    }

    html.push_str("</aside>");
    html
}

fn render_connect(authorization_url: Option<&str>) -> String {
    let href = authorization_url.unwrap_or("/oauth/login");
    format!(
        r#"<p class="notice info">Click the button below to connect to your Dexcom account</p>
<p style="text-align:center;margin:2rem 0"><a class="connect" href="{}">Connect to Dexcom</a></p>
<details open><summary>Setup Information</summary>
<ul>
<li>A Dexcom Developer account with an app registered for the <code>offline_access</code> scope.</li>
<li>The app's redirect URI must match <code>DEXCOM_REDIRECT_URI</code>.</li>
<li>Set <code>DEXCOM_BASE_URL=https://api.dexcom.com</code> once the app is approved for production.</li>
</ul></details>"#,
        encode_double_quoted_attribute(href)
    )
}

fn render_loaded(loaded: &LoadedReadings) -> String {
    let mut html = format!(
        "<p>{} to {}</p>",
        format_date(loaded.range.start().date()),
        format_date(loaded.range.end().date())
    );

    if loaded.readings.is_empty() {
        html.push_str(
            r#"<p class="notice warning">No glucose readings found for the selected period</p>"#,
        );
        return html;
    }

    let summary = summarize(&loaded.readings);
    let metric = |label: &str, value: String| {
        format!(r#"<div class="metric">{label}<b>{}</b></div>"#, encode_text(&value))
    };
    let mg_dl =
        |value: Option<i32>| value.map_or_else(|| "-".to_string(), |v| format!("{v} mg/dL"));

    html.push_str(r#"<div class="metrics">"#);
    html.push_str(&metric(
        "Average",
        summary
            .average
            .map_or_else(|| "-".to_string(), |v| format!("{v:.1} mg/dL")),
    ));
    html.push_str(&metric("Minimum", mg_dl(summary.minimum)));
    html.push_str(&metric("Maximum", mg_dl(summary.maximum)));
    html.push_str(&metric("Time in Range", format!("{:.1}%", summary.percent_in_range)));
    html.push_str(&metric("Total Readings", summary.count.to_string()));
    html.push_str("</div>");

    let series = to_chart_series(&loaded.readings);
    let json = serde_json::to_string(&series)
        .unwrap_or_else(|_| "{\"points\":[]}".to_string())
        .replace("</", "<\\/");
    html.push_str(r#"<div id="chart"></div><script>"#);
    html.push_str(&CHART_SCRIPT.replace("__SERIES__", &json));
    html.push_str("</script>");

    html.push_str(r#"<p><a href="/readings/export">Download Data as CSV</a></p>"#);
    html.push_str("<details><summary>Raw Data</summary><table>");
    html.push_str("<tr><th>Time</th><th>Value (mg/dL)</th><th>Range</th></tr>");
    for reading in sorted_readings(&loaded.readings) {
        let timestamp = format_timestamp(&reading.timestamp).unwrap_or_default();
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            encode_text(&timestamp),
            reading.value,
            reading.range().label()
        );
    }
    html.push_str("</table></details>");

    html
}
