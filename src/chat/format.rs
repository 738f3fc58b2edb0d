use crate::calendar;
use crate::database::models::{Account, AttendanceEvent, EventKind};
use crate::report::{Report, ReportScope};
use chrono::{DateTime, Utc};

pub const GREETING: &str =
    "سلام! برای ثبت حضور یا دریافت گزارش‌ها از منوی زیر استفاده کنید.";
pub const CANCELLED: &str = "🔙 لغو شد.";
pub const DENIED: &str = "❌ دسترسی فقط برای ادمین‌ها.";
pub const EMPTY_REPORT: &str = "📋 موردی ثبت نشده است.";
pub const ASK_PERIOD: &str =
    "📆 ماه مورد نظر را به صورت YYYY-MM وارد کنید (مثلاً 1403-05).";
pub const BAD_PERIOD: &str = "⚠️ قالب دوره نامعتبر است. به صورت YYYY-MM وارد کنید.";
pub const ASK_SCOPE: &str = "گزارش همه کاربران یا فقط یک کاربر؟ («همه» یا «یک»)";
pub const BAD_SCOPE: &str = "⚠️ «همه» یا «یک» را وارد کنید.";
pub const ASK_TARGET: &str = "🔢 کد پرسنلی یا شناسه کاربر را وارد کنید.";
pub const BAD_TARGET: &str = "⚠️ شناسه باید عددی باشد.";
pub const TARGET_NOT_FOUND: &str = "❌ کاربری با این شناسه یافت نشد.";
pub const ASK_NEW_NAME: &str = "✏️ نام نمایشی جدید را وارد کنید.";
pub const EMPTY_NAME: &str = "⚠️ نام نمایشی نمی‌تواند خالی باشد.";
pub const EXPORT_READY: &str = "📦 خروجی کامل آماده شد.";
pub const UNKNOWN: &str = "برای ثبت حضور یا دریافت گزارش‌ها از منوی ربات استفاده کنید.";

pub const TITLE_DAILY_SELF: &str = "📅 گزارش روزانه شما:";
pub const TITLE_DAILY_ALL: &str = "📅 گزارش روزانه همه:";

pub fn monthly_self_title(year: i32, month: u32) -> String {
    format!("📅 گزارش ماهانه شما ({year}/{month:02}):")
}

pub fn monthly_all_title(year: i32, month: u32) -> String {
    format!("📅 گزارش ماهانه همه ({year}/{month:02}):")
}

pub fn monthly_target_title(name: &str, year: i32, month: u32) -> String {
    format!("📅 گزارش ماهانه {name} ({year}/{month:02}):")
}

pub fn clock_recorded(kind: EventKind, at: DateTime<Utc>) -> String {
    let (date, time) = calendar::to_local_civil(at);
    match kind {
        EventKind::Enter => format!("✅ ورود ثبت شد: {date} | {time}"),
        EventKind::Exit => format!("✅ خروج ثبت شد: {date} | {time}"),
    }
}

pub fn clock_duplicate(kind: EventKind) -> String {
    match kind {
        EventKind::Enter => "⚠️ شما قبلاً امروز ورود را ثبت کرده‌اید.".to_string(),
        EventKind::Exit => "⚠️ شما قبلاً امروز خروج را ثبت کرده‌اید.".to_string(),
    }
}

pub fn renamed(name: &str) -> String {
    format!("✅ نام نمایشی به «{name}» تغییر کرد.")
}

/// One text block: title line, then `date | time | kind` per event,
/// prefixed with the account name in organization-wide reports.
pub fn report_lines(title: &str, report: &Report) -> String {
    let with_names = matches!(report.scope, ReportScope::All);
    let mut lines = vec![title.to_string()];
    for group in &report.groups {
        for event in &group.events {
            if with_names {
                lines.push(format!("{} | {}", group.account.display(), event_line(event)));
            } else {
                lines.push(event_line(event));
            }
        }
    }
    lines.join("\n")
}

pub fn account_list(accounts: &[Account]) -> String {
    let mut lines = vec!["👥 لیست کاربران:".to_string()];
    for account in accounts {
        lines.push(format!(
            "{}\t{}\t@{}",
            account.code_label().unwrap_or_default(),
            account.display(),
            account.handle.clone().unwrap_or_default(),
        ));
    }
    lines.join("\n")
}

fn event_line(event: &AttendanceEvent) -> String {
    let (date, time) = calendar::to_local_civil(event.occurred_at);
    let label = EventKind::parse(&event.kind)
        .map_or_else(|| event.kind.clone(), |kind| kind.label().to_string());
    format!("{date} | {time} | {label}")
}
