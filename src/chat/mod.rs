pub mod format;
pub mod handler;
pub mod session;

use crate::report::table::Table;

/// One decoded chat event. The transport adapter classifies the raw payload
/// into a `Command` and supplies the caller's platform identity plus naming
/// hints; the core receives one `Inbound` at a time per caller.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub caller: i64,
    pub full_name: String,
    pub handle: Option<String>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    ClockIn,
    ClockOut,
    DailyReport,
    MonthlyReport,
    AdminDailyAll,
    AdminMonthly,
    ListAccounts,
    Rename,
    Export,
    Cancel,
    /// Free text, consumed by whatever flow is awaiting input.
    Text(String),
}

/// What goes back to the caller: text blocks plus optional export artifacts,
/// rendered by the presentation layer as messages and attachments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub text: Vec<String>,
    pub artifacts: Vec<Artifact>,
}

impl Reply {
    pub fn text(message: impl Into<String>) -> Reply {
        Reply {
            text: vec![message.into()],
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Reply {
        self.artifacts.push(artifact);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Table { name: String, table: Table },
    Document { name: String, body: String },
}
