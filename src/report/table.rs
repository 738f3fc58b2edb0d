use crate::calendar;
use crate::database::models::EventKind;
use crate::report::{Report, ReportScope};

/// Format-agnostic tabular projection of a report. Turning it into a
/// spreadsheet, CSV or chat attachment is the presentation layer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One row per event. Organization-wide reports carry code and name columns;
/// a single-account report omits them.
pub fn to_tabular(report: &Report) -> Table {
    let with_account = matches!(report.scope, ReportScope::All);

    let mut header: Vec<String> = Vec::new();
    if with_account {
        header.push("کد".to_string());
        header.push("نام".to_string());
    }
    header.push("تاریخ".to_string());
    header.push("ساعت".to_string());
    header.push("نوع".to_string());

    let mut rows = Vec::new();
    for group in &report.groups {
        for event in &group.events {
            let (date, time) = calendar::to_local_civil(event.occurred_at);
            let mut row = Vec::new();
            if with_account {
                row.push(group.account.code_label().unwrap_or_default());
                row.push(group.account.display());
            }
            row.push(date);
            row.push(time);
            row.push(kind_label(&event.kind));
            rows.push(row);
        }
    }

    Table { header, rows }
}

fn kind_label(kind: &str) -> String {
    EventKind::parse(kind).map_or_else(|| kind.to_string(), |k| k.label().to_string())
}
