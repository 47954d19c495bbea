use crate::domain::model::{AnalysisData, KeywordSummary, PageSummary, QueryMetric, RankBucket};
use crate::utils::error::{LensError, Result};
use pulldown_cmark::{html, Event, Options, Parser};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn opt_u64(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| LensError::processing(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| LensError::processing(e.to_string()))
}

pub fn keywords_csv(metrics: &[QueryMetric]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "query",
        "clicks",
        "impressions",
        "ctr",
        "position",
        "prev_clicks",
        "prev_position",
        "rank_bucket",
    ])?;
    for metric in metrics {
        writer.write_record([
            metric.query.clone(),
            metric.clicks.to_string(),
            metric.impressions.to_string(),
            format!("{:.4}", metric.ctr()),
            opt_f64(metric.position),
            opt_u64(metric.prev_clicks),
            opt_f64(metric.prev_position),
            metric
                .rank_bucket
                .map(|b| b.as_str().to_string())
                .unwrap_or_default(),
        ])?;
    }
    finish_csv(writer)
}

pub fn page_summaries_csv(pages: &[PageSummary]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![
        "page".to_string(),
        "best_query".to_string(),
        "best_query_clicks".to_string(),
        "best_query_position".to_string(),
        "prev_best_query_position".to_string(),
        "total_clicks".to_string(),
        "prev_total_clicks".to_string(),
        "click_change".to_string(),
        "keyword_count".to_string(),
    ];
    header.extend(RankBucket::ALL.iter().map(|b| format!("rank_{}", b.as_str())));
    writer.write_record(&header)?;

    for page in pages {
        let mut record = vec![
            page.page.clone(),
            page.best_query.clone().unwrap_or_default(),
            page.best_query_clicks.to_string(),
            opt_f64(page.best_query_position),
            opt_f64(page.prev_best_query_position),
            page.total_clicks.to_string(),
            opt_u64(page.prev_total_clicks),
            page.click_change().map(|c| c.to_string()).unwrap_or_default(),
            page.keyword_count.to_string(),
        ];
        record.extend(RankBucket::ALL.iter().map(|b| page.ranks.get(*b).to_string()));
        writer.write_record(&record)?;
    }
    finish_csv(writer)
}

/// Markdown report combining the keyword summary and the parsed analysis.
pub fn markdown_report(
    page: &str,
    summary: Option<&KeywordSummary>,
    analysis: &AnalysisData,
) -> String {
    let mut out = format!("# SEO report: {}\n\n", page);
    out.push_str(&format!("**Strategy:** {}\n\n", analysis.strategy.as_str()));

    if let Some(summary) = summary {
        out.push_str("## Search Console summary\n\n");
        if let Some(best) = &summary.best_query {
            out.push_str(&format!("- Best query: {}\n", best));
        }
        out.push_str(&format!(
            "- Clicks: {} / Impressions: {} / Queries: {}\n",
            summary.total_clicks, summary.total_impressions, summary.keyword_count
        ));
        for bucket in RankBucket::ALL {
            out.push_str(&format!(
                "- Position {}: {}\n",
                bucket.label(),
                summary.ranks.get(bucket)
            ));
        }
        out.push('\n');
    }

    if !analysis.priority_keywords.is_empty() {
        out.push_str("## Priority keywords\n\n");
        for keyword in &analysis.priority_keywords {
            out.push_str(&format!("- {}\n", keyword));
        }
        out.push('\n');
    }

    for section in &analysis.sections {
        match &section.title {
            Some(title) => out.push_str(&format!("## {}\n\n{}\n\n", title, section.body)),
            None if !section.body.is_empty() => out.push_str(&format!("{}\n\n", section.body)),
            None => {}
        }
    }

    out.trim_end().to_string() + "\n"
}

/// Render Markdown for an email client. Raw HTML in the input is escaped.
pub fn markdown_to_email_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        other => other,
    });

    let mut body = String::new();
    html::push_html(&mut body, parser);

    format!(
        "<div style=\"font-family: Arial, Helvetica, sans-serif; font-size: 14px; line-height: 1.6; color: #222;\">\n{}</div>",
        body
    )
}

/// ZIP archive held in memory, one entry per `(name, contents)`.
pub fn export_bundle(files: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in files {
        zip.start_file::<_, ()>(*name, FileOptions::default())?;
        zip.write_all(contents)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
