use crate::chart::render_pie_chart;
use crate::data_structures::{AnalysisOutcome, AnalysisReport, NoArticlesReason};
use crate::utils::{escape_html, is_safe_link};
use std::fmt::Write;
use url::form_urlencoded;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 0; color: #2c3e50; }
.layout { display: flex; min-height: 100vh; }
.sidebar { width: 260px; background: #f4f6f8; padding: 24px; box-sizing: border-box; }
.sidebar label { display: block; margin: 12px 0 4px; font-weight: 600; }
.sidebar input { width: 100%; padding: 6px; box-sizing: border-box; }
.sidebar button { margin-top: 16px; width: 100%; padding: 8px; background: #e74c3c; color: #fff; border: 0; border-radius: 4px; cursor: pointer; }
.main { flex: 1; padding: 24px 32px; }
.info, .warning, .error { padding: 12px 16px; border-radius: 4px; margin: 16px 0; }
.info { background: #eaf2fb; }
.warning { background: #fff6dd; }
.error { background: #fdecea; }
table { border-collapse: collapse; width: 100%; font-size: 14px; }
th, td { border-bottom: 1px solid #e1e4e8; padding: 6px 8px; text-align: left; vertical-align: top; }
.sentiment-Positive { color: #27ae60; }
.sentiment-Negative { color: #c0392b; }
.sentiment-Neutral { color: #7f8c8d; }
.chart-title { font-size: 16px; font-weight: 600; }
.slice-label, .slice-pct { font-size: 13px; }
"#;

/// Values echoed back into the sidebar inputs.
#[derive(Debug, Clone)]
pub struct FormState {
    pub ticker: String,
    pub keyword: String,
}

fn page(form: &FormState, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Stock News Sentiment Analyzer</title>
<style>{style}</style>
</head>
<body>
<div class="layout">
<form class="sidebar" method="get" action="/analyze">
<h2>User Input</h2>
<label for="ticker">Stock Ticker</label>
<input id="ticker" name="ticker" value="{ticker}">
<label for="keyword">Keyword (optional)</label>
<input id="keyword" name="keyword" value="{keyword}">
<button type="submit">Analyze Sentiment</button>
</form>
<main class="main">
<h1>Stock News Sentiment Analyzer</h1>
<p>Analyze the sentiment of the latest news articles for any stock ticker. Enter a <strong>ticker symbol</strong> (e.g. <code>BA</code> for Boeing) and an optional <strong>keyword</strong> to filter results.</p>
{body}
</main>
</div>
</body>
</html>
"#,
        style = STYLE,
        ticker = escape_html(&form.ticker),
        keyword = escape_html(&form.keyword),
        body = body,
    )
}

pub fn render_index(form: &FormState) -> String {
    page(
        form,
        r#"<div class="info">Enter a ticker and click "Analyze Sentiment" to begin.</div>"#,
    )
}

pub fn render_error(form: &FormState, message: &str) -> String {
    page(
        form,
        &format!(r#"<div class="error"><strong>Analysis failed:</strong> {}</div>"#, escape_html(message)),
    )
}

pub fn render_outcome(form: &FormState, outcome: &AnalysisOutcome) -> String {
    match outcome {
        AnalysisOutcome::Completed(report) => page(form, &render_report(report)),
        AnalysisOutcome::NoArticles { ticker, reason, .. } => page(form, &render_no_articles(ticker, reason)),
    }
}

fn render_no_articles(ticker: &str, reason: &NoArticlesReason) -> String {
    format!(
        r#"<div class="warning"><strong>No articles found for {}.</strong> {}</div>"#,
        escape_html(ticker),
        escape_html(&reason.hint()),
    )
}

fn render_report(report: &AnalysisReport) -> String {
    let mut html = String::new();
    let ticker = escape_html(&report.ticker);

    let _ = write!(
        html,
        r#"<h2>Overall Sentiment for {ticker}</h2>
<p><strong>Sentiment:</strong> <span class="sentiment-{label}">{label}</span></p>
<p><strong>Score:</strong> {score}</p>"#,
        label = report.aggregate.overall_label,
        score = report.aggregate.overall_score,
    );

    if report.skipped_entries > 0 {
        let _ = write!(
            html,
            r#"<div class="warning">{} feed item(s) had no summary and were not analyzed.</div>"#,
            report.skipped_entries
        );
    }

    let csv_href = format!("/api/analyze.csv?{}", csv_query(report));
    let _ = write!(
        html,
        r#"<p><a href="{}" download>Download CSV</a></p>"#,
        escape_html(&csv_href)
    );

    html.push_str(
        "<table>\n<thead><tr><th>Title</th><th>Sentiment</th><th>Confidence</th><th>Published</th><th>Link</th></tr></thead>\n<tbody>\n",
    );
    for article in &report.articles {
        let link = if is_safe_link(&article.link) {
            format!(
                r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{href}</a>"#,
                href = escape_html(&article.link)
            )
        } else {
            escape_html(&article.link)
        };

        let _ = writeln!(
            html,
            r#"<tr><td>{title}</td><td class="sentiment-{label}">{label}</td><td>{confidence}</td><td>{published}</td><td>{link}</td></tr>"#,
            title = escape_html(&article.title),
            label = article.label,
            confidence = article.display_confidence(),
            published = escape_html(&article.published),
        );
    }
    html.push_str("</tbody>\n</table>\n");

    html.push_str(r#"<div class="chart">"#);
    html.push_str(&render_pie_chart(&report.distribution));
    html.push_str("</div>");

    html
}

fn csv_query(report: &AnalysisReport) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("ticker", &report.ticker);
    if let Some(keyword) = &report.keyword {
        query.append_pair("keyword", keyword);
    }
    query.finish()
}
