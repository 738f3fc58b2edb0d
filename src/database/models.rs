use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub external_id: i64,
    pub full_name: String,
    pub handle: Option<String>,
    pub display_name: String,
    pub employee_code: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Name shown everywhere: display_name, then full_name, then the
    /// employee code, then the raw external id. First non-empty wins.
    pub fn display(&self) -> String {
        if !self.display_name.trim().is_empty() {
            return self.display_name.clone();
        }
        if !self.full_name.trim().is_empty() {
            return self.full_name.clone();
        }
        if let Some(code) = self.code_label() {
            return code;
        }
        self.external_id.to_string()
    }

    /// Zero-padded employee code, e.g. `007`.
    pub fn code_label(&self) -> Option<String> {
        self.employee_code.map(|code| format!("{code:03}"))
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttendanceEvent {
    pub id: i64,
    pub account_id: i64,
    pub kind: String, // "enter" or "exit"
    pub occurred_at: DateTime<Utc>,
    pub local_day: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Enter,
    Exit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Enter => "enter",
            EventKind::Exit => "exit",
        }
    }

    pub fn parse(s: &str) -> Option<EventKind> {
        match s {
            "enter" => Some(EventKind::Enter),
            "exit" => Some(EventKind::Exit),
            _ => None,
        }
    }

    /// User-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Enter => "ورود",
            EventKind::Exit => "خروج",
        }
    }
}
