//! Per-cluster report over stored results: sizes, average sales, dominant
//! stage and portfolio, and a suggested follow-up for each segment.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::LabeledRecord;

/// Mean sales above which a "Medium Prospect" segment is worth nurturing
pub const NURTURE_THRESHOLD: f64 = 100_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub description: Option<String>,
    pub count: usize,
    pub mean_sales: f64,
    pub dominant_stage: String,
    pub dominant_portfolio: String,
    pub customers: Vec<String>,
    pub strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub clusters: Vec<ClusterSummary>,
    pub overview: String,
    pub conclusion: String,
}

/// Follow-up suggestion for a segment
pub fn strategy(description: Option<&str>, mean_sales: f64) -> &'static str {
    match description {
        Some("High Prospect") => "High-priority follow-up for fast closing",
        Some("Medium Prospect") if mean_sales > NURTURE_THRESHOLD => "Continue nurturing until deal",
        Some("Low Prospect") => "Run periodic promotions",
        _ => "Re-evaluate customer data",
    }
}

/// Group records by cluster id, ordered by id
pub fn summarize(records: &[LabeledRecord]) -> Vec<ClusterSummary> {
    let mut groups: BTreeMap<usize, Vec<&LabeledRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.cluster).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(cluster, members)| {
            let count = members.len();
            let total: f64 = members.iter().map(|m| m.record.sales_amount).sum();
            let mean_sales = total / count as f64;
            let description = members[0].description.clone();

            ClusterSummary {
                cluster,
                strategy: strategy(description.as_deref(), mean_sales).to_string(),
                description,
                count,
                mean_sales,
                dominant_stage: dominant(members.iter().map(|m| m.record.stage.as_str())),
                dominant_portfolio: dominant(members.iter().map(|m| m.record.portfolio.as_str())),
                customers: members.iter().map(|m| m.record.customer.clone()).collect(),
            }
        })
        .collect()
}

pub fn report(records: &[LabeledRecord]) -> Report {
    let clusters = summarize(records);
    let overview = overview(records.len(), &clusters);
    let conclusion = conclusion(&clusters);
    Report {
        clusters,
        overview,
        conclusion,
    }
}

fn overview(total: usize, clusters: &[ClusterSummary]) -> String {
    let mut text = format!(
        "Out of {} prospects, the system produced {} segments.",
        total,
        clusters.len()
    );
    for c in clusters {
        text.push_str(&format!(
            " Cluster {} ({}) holds {} prospects, mostly portfolio {}, average sales Rp {}, dominant stage {}.",
            c.cluster,
            c.description.as_deref().unwrap_or("untagged"),
            c.count,
            c.dominant_portfolio,
            format_amount(c.mean_sales),
            c.dominant_stage
        ));
    }
    text
}

/// Rank segments by average sales: focus on the first, nurture the second,
/// re-evaluate the third
fn conclusion(clusters: &[ClusterSummary]) -> String {
    let mut ranked: Vec<&ClusterSummary> = clusters.iter().collect();
    ranked.sort_by(|a, b| b.mean_sales.total_cmp(&a.mean_sales));

    let mut text = String::new();
    if let Some(first) = ranked.first() {
        text.push_str(&format!(
            "Focus sales effort on Cluster {} to speed up conversion.",
            first.cluster
        ));
    }
    if let Some(second) = ranked.get(1) {
        text.push_str(&format!(
            " Cluster {} can be followed up with a nurturing strategy.",
            second.cluster
        ));
    }
    if let Some(third) = ranked.get(2) {
        text.push_str(&format!(
            " Cluster {} needs a renewed approach or a feasibility review.",
            third.cluster
        ));
    }
    text
}

/// Most frequent value; ties go to the value seen first
fn dominant<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, n) in counts {
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((value, n));
        }
    }
    best.map(|(v, _)| v.to_string()).unwrap_or_default()
}

/// Round to a whole amount with comma thousands separators
pub fn format_amount(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if rounded < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
