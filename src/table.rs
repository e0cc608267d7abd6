use crate::aggregate::counts_for;
use crate::page::escape_html;
use crate::types::{Record, Team};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;

pub const COLUMNS: [&str; 5] = ["AC", "City/Town/Village", "Name", "Status", "Entries"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub region_code: String,
    pub city: String,
    pub name: String,
    pub status: String,
    /// Counted over the complete rows only, so it can trail the map's figure.
    pub entries: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TableView {
    Rows { rows: Vec<TableRow> },
    Empty { message: String },
}

impl TableView {
    pub fn build(team: Team, records: &[Record]) -> Self {
        let complete: Vec<&Record> = records.iter().filter(|r| r.is_complete()).collect();
        debug!("Valid rows for {}: {}", team, complete.len());

        if complete.is_empty() {
            return TableView::Empty {
                message: format!("No valid data available for {} team.", team),
            };
        }

        let counts = counts_for(complete.iter().copied());
        let rows = complete
            .into_iter()
            .map(|r| TableRow {
                region_code: r.region_code.clone(),
                city: r.city.clone().unwrap_or_default(),
                name: r.person_name.clone().unwrap_or_default(),
                status: r.status.clone().unwrap_or_default(),
                entries: counts.get(&r.region_code),
            })
            .collect();

        TableView::Rows { rows }
    }

    pub fn rows(&self) -> &[TableRow] {
        match self {
            TableView::Rows { rows } => rows,
            TableView::Empty { .. } => &[],
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<table><thead><tr>");
        for column in COLUMNS {
            let _ = write!(html, "<th>{}</th>", escape_html(column));
        }
        html.push_str("</tr></thead><tbody>");
        for row in self.rows() {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&row.region_code),
                escape_html(&row.city),
                escape_html(&row.name),
                escape_html(&row.status),
                row.entries
            );
        }
        html.push_str("</tbody></table>");
        if let TableView::Empty { message } = self {
            let _ = write!(html, r#"<p class="empty">{}</p>"#, escape_html(message));
        }
        html
    }
}
