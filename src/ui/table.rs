use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};
use crate::storage::SurveyStats;

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct AnswerRow {
    #[tabled(rename = "Answer")]
    answer: String,
    #[tabled(rename = "Count")]
    count: usize,
}

pub fn stats_table(stats: &SurveyStats) -> String {
    let rows = vec![
        MetricRow { metric: "Responses".into(), value: stats.total_responses.to_string() },
        MetricRow { metric: "Avg portal rating".into(), value: format!("{:.1}", stats.average_ratings.portal) },
        MetricRow { metric: "Avg LLM rating".into(), value: format!("{:.1}", stats.average_ratings.llm) },
        MetricRow { metric: "Improvements: yes".into(), value: stats.has_improvements.yes.to_string() },
        MetricRow { metric: "Improvements: no".into(), value: stats.has_improvements.no.to_string() },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Answer/count table, most frequent answer first. Empty when there are no answers.
pub fn distribution_table(counts: &BTreeMap<String, usize>) -> String {
    if counts.is_empty() {
        return String::new();
    }

    let mut rows: Vec<AnswerRow> = counts
        .iter()
        .map(|(answer, count)| AnswerRow {
            answer: if answer.is_empty() { "(blank)".to_string() } else { answer.clone() },
            count: *count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.answer.cmp(&b.answer)));

    Table::new(rows).with(Style::rounded()).to_string()
}
