use crate::auth;
use crate::calendar;
use crate::chat::format;
use crate::chat::session::{PendingAction, SessionStore, State};
use crate::chat::{Artifact, Command, Inbound, Reply};
use crate::config::Config;
use crate::database::models::{Account, EventKind};
use crate::database::queries::{self, RecordOutcome};
use crate::error::{Error, Result};
use crate::report::{self, ReportScope, export, table};
use sqlx::SqlitePool;

enum ScopeChoice {
    All,
    Single,
}

fn scope_choice(text: &str) -> Option<ScopeChoice> {
    match text.trim() {
        "all" | "همه" => Some(ScopeChoice::All),
        "single" | "یک" | "یک کاربر" => Some(ScopeChoice::Single),
        _ => None,
    }
}

/// The conversational core: provisions callers, runs the per-caller state
/// machine and turns commands into ledger writes, reports and exports.
pub struct Engine {
    pool: SqlitePool,
    super_admin: i64,
    sessions: SessionStore,
}

impl Engine {
    pub async fn new(pool: SqlitePool, config: &Config) -> Result<Engine> {
        auth::seed_super_admin(&pool, config.super_admin).await?;
        tracing::info!(super_admin = config.super_admin, "attendance engine ready");

        Ok(Engine {
            pool,
            super_admin: config.super_admin,
            sessions: SessionStore::new(),
        })
    }

    /// Handle one decoded command for one caller. User-level failures
    /// (denials, bad input, unknown targets) become replies; only store
    /// faults surface as errors.
    pub async fn handle(&self, inbound: Inbound) -> Result<Reply> {
        let account = queries::register_or_get(
            &self.pool,
            inbound.caller,
            &inbound.full_name,
            inbound.handle.as_deref(),
        )
        .await?;

        if inbound.command == Command::Cancel {
            self.sessions.clear(inbound.caller).await;
            return Ok(Reply::text(format::CANCELLED));
        }

        let state = self.sessions.get(inbound.caller).await;
        let result = if state != State::Idle {
            if let Command::Text(text) = &inbound.command {
                self.advance(&account, state, text).await
            } else {
                // a structured command abandons the pending flow
                self.sessions.clear(inbound.caller).await;
                self.dispatch(&account, &inbound.command).await
            }
        } else {
            self.dispatch(&account, &inbound.command).await
        };

        // every privileged step checks the gate before touching session
        // state, so a denial leaves the conversation where it was
        match result {
            Err(Error::Unauthorized) => Ok(Reply::text(format::DENIED)),
            other => other,
        }
    }

    async fn dispatch(&self, account: &Account, command: &Command) -> Result<Reply> {
        match command {
            Command::Start => Ok(Reply::text(format::GREETING)),
            Command::ClockIn => self.clock(account, EventKind::Enter).await,
            Command::ClockOut => self.clock(account, EventKind::Exit).await,
            Command::DailyReport => {
                let report = report::daily_report(
                    &self.pool,
                    ReportScope::Account(account.id),
                    calendar::now(),
                )
                .await?;
                if report.is_empty() {
                    return Ok(Reply::text(format::EMPTY_REPORT));
                }
                Ok(Reply::text(format::report_lines(format::TITLE_DAILY_SELF, &report)))
            }
            Command::MonthlyReport => {
                self.sessions
                    .set(account.external_id, State::AwaitingPeriodToken { admin: false })
                    .await;
                Ok(Reply::text(format::ASK_PERIOD))
            }
            Command::AdminDailyAll => {
                self.ensure_admin(account).await?;
                let report =
                    report::daily_report(&self.pool, ReportScope::All, calendar::now()).await?;
                if report.is_empty() {
                    return Ok(Reply::text(format::EMPTY_REPORT));
                }
                Ok(Reply::text(format::report_lines(format::TITLE_DAILY_ALL, &report)))
            }
            Command::AdminMonthly => {
                self.ensure_admin(account).await?;
                self.sessions
                    .set(account.external_id, State::AwaitingPeriodToken { admin: true })
                    .await;
                Ok(Reply::text(format::ASK_PERIOD))
            }
            Command::ListAccounts => {
                self.ensure_admin(account).await?;
                let accounts = queries::list_accounts(&self.pool).await?;
                Ok(Reply::text(format::account_list(&accounts)))
            }
            Command::Rename => {
                self.ensure_admin(account).await?;
                self.sessions
                    .set(
                        account.external_id,
                        State::AwaitingTargetAccount {
                            action: PendingAction::Rename,
                        },
                    )
                    .await;
                Ok(Reply::text(format::ASK_TARGET))
            }
            Command::Export => {
                self.ensure_admin(account).await?;
                let export = export::full_export(&self.pool).await?;
                Ok(Reply::text(format::EXPORT_READY)
                    .with_artifact(Artifact::Table {
                        name: "all_attendance".to_string(),
                        table: export.attendance,
                    })
                    .with_artifact(Artifact::Document {
                        name: "users_admins".to_string(),
                        body: export.roster,
                    }))
            }
            // intercepted in handle(); nothing to undo here
            Command::Cancel => Ok(Reply::text(format::CANCELLED)),
            Command::Text(_) => Ok(Reply::text(format::UNKNOWN)),
        }
    }

    /// Feed free text into the caller's pending flow. Invalid input
    /// re-prompts without changing state; denials never change state.
    async fn advance(&self, account: &Account, state: State, text: &str) -> Result<Reply> {
        match state {
            State::Idle => self.dispatch(account, &Command::Text(text.to_string())).await,
            State::AwaitingPeriodToken { admin } => match calendar::parse_period_token(text) {
                Ok((year, month)) if admin => {
                    self.sessions
                        .set(account.external_id, State::AwaitingReportScope { year, month })
                        .await;
                    Ok(Reply::text(format::ASK_SCOPE))
                }
                Ok((year, month)) => {
                    self.sessions.clear(account.external_id).await;
                    self.monthly_reply(
                        ReportScope::Account(account.id),
                        year,
                        month,
                        format::monthly_self_title(year, month),
                        false,
                    )
                    .await
                }
                Err(Error::Validation(_)) => Ok(Reply::text(format::BAD_PERIOD)),
                Err(e) => Err(e),
            },
            State::AwaitingReportScope { year, month } => match scope_choice(text) {
                Some(ScopeChoice::All) => {
                    self.ensure_admin(account).await?;
                    self.sessions.clear(account.external_id).await;
                    self.monthly_reply(
                        ReportScope::All,
                        year,
                        month,
                        format::monthly_all_title(year, month),
                        true,
                    )
                    .await
                }
                Some(ScopeChoice::Single) => {
                    self.sessions
                        .set(
                            account.external_id,
                            State::AwaitingTargetAccount {
                                action: PendingAction::MonthlyReport { year, month },
                            },
                        )
                        .await;
                    Ok(Reply::text(format::ASK_TARGET))
                }
                None => Ok(Reply::text(format::BAD_SCOPE)),
            },
            State::AwaitingTargetAccount { action } => {
                let target = match queries::resolve_account(&self.pool, text).await {
                    Ok(target) => target,
                    Err(Error::Validation(_)) => return Ok(Reply::text(format::BAD_TARGET)),
                    Err(Error::NotFound(_)) => return Ok(Reply::text(format::TARGET_NOT_FOUND)),
                    Err(e) => return Err(e),
                };
                match action {
                    PendingAction::MonthlyReport { year, month } => {
                        self.ensure_admin(account).await?;
                        self.sessions.clear(account.external_id).await;
                        let title = format::monthly_target_title(&target.display(), year, month);
                        self.monthly_reply(ReportScope::Account(target.id), year, month, title, true)
                            .await
                    }
                    PendingAction::Rename => {
                        self.sessions
                            .set(
                                account.external_id,
                                State::AwaitingNewDisplayName {
                                    account_id: target.id,
                                },
                            )
                            .await;
                        Ok(Reply::text(format::ASK_NEW_NAME))
                    }
                }
            }
            State::AwaitingNewDisplayName { account_id } => {
                let name = text.trim();
                if name.is_empty() {
                    return Ok(Reply::text(format::EMPTY_NAME));
                }
                self.ensure_admin(account).await?;
                queries::set_display_name(&self.pool, account_id, name).await?;
                self.sessions.clear(account.external_id).await;
                tracing::info!(account_id, by = account.external_id, "display name updated");
                Ok(Reply::text(format::renamed(name)))
            }
        }
    }

    async fn clock(&self, account: &Account, kind: EventKind) -> Result<Reply> {
        match queries::record(&self.pool, account.id, kind, calendar::now()).await? {
            RecordOutcome::Recorded(at) => Ok(Reply::text(format::clock_recorded(kind, at))),
            RecordOutcome::AlreadyRecordedToday => Ok(Reply::text(format::clock_duplicate(kind))),
        }
    }

    async fn monthly_reply(
        &self,
        scope: ReportScope,
        year: i32,
        month: u32,
        title: String,
        attach_table: bool,
    ) -> Result<Reply> {
        let report = report::monthly_report(&self.pool, scope, year, month).await?;
        if report.is_empty() {
            return Ok(Reply::text(format::EMPTY_REPORT));
        }
        let mut reply = Reply::text(format::report_lines(&title, &report));
        if attach_table {
            reply = reply.with_artifact(Artifact::Table {
                name: format!("report-{year}-{month:02}"),
                table: table::to_tabular(&report),
            });
        }
        Ok(reply)
    }

    async fn ensure_admin(&self, account: &Account) -> Result<()> {
        if auth::is_privileged(&self.pool, self.super_admin, account.external_id).await? {
            return Ok(());
        }
        tracing::warn!(caller = account.external_id, "denied privileged command");
        Err(Error::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;

    const ADMIN: i64 = 777;

    async fn engine() -> Engine {
        let pool = memory_pool().await;
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            super_admin: ADMIN,
        };
        Engine::new(pool, &config).await.unwrap()
    }

    fn msg(caller: i64, command: Command) -> Inbound {
        Inbound {
            caller,
            full_name: format!("User {caller}"),
            handle: None,
            command,
        }
    }

    fn text(caller: i64, body: &str) -> Inbound {
        msg(caller, Command::Text(body.to_string()))
    }

    #[tokio::test]
    async fn ordinary_caller_is_denied_admin_commands() {
        let engine = engine().await;

        for command in [
            Command::AdminDailyAll,
            Command::AdminMonthly,
            Command::ListAccounts,
            Command::Rename,
            Command::Export,
        ] {
            let reply = engine.handle(msg(1, command)).await.unwrap();
            assert_eq!(reply.text, vec![format::DENIED.to_string()]);
        }

        // denial left no flow behind
        let reply = engine.handle(text(1, "1403-05")).await.unwrap();
        assert_eq!(reply.text, vec![format::UNKNOWN.to_string()]);
    }

    #[tokio::test]
    async fn invalid_period_token_reprompts_without_losing_state() {
        let engine = engine().await;

        engine.handle(msg(ADMIN, Command::AdminMonthly)).await.unwrap();
        let reply = engine.handle(text(ADMIN, "abc")).await.unwrap();
        assert_eq!(reply.text, vec![format::BAD_PERIOD.to_string()]);

        // the flow is still awaiting a token
        let reply = engine.handle(text(ADMIN, "1403-05")).await.unwrap();
        assert_eq!(reply.text, vec![format::ASK_SCOPE.to_string()]);
    }

    #[tokio::test]
    async fn cancel_resets_the_flow_without_side_effects() {
        let engine = engine().await;

        engine.handle(msg(ADMIN, Command::AdminMonthly)).await.unwrap();
        let reply = engine.handle(msg(ADMIN, Command::Cancel)).await.unwrap();
        assert_eq!(reply.text, vec![format::CANCELLED.to_string()]);

        let reply = engine.handle(text(ADMIN, "1403-05")).await.unwrap();
        assert_eq!(reply.text, vec![format::UNKNOWN.to_string()]);
    }

    #[tokio::test]
    async fn structured_command_abandons_pending_flow() {
        let engine = engine().await;

        engine.handle(msg(ADMIN, Command::AdminMonthly)).await.unwrap();
        let reply = engine.handle(msg(ADMIN, Command::ClockIn)).await.unwrap();
        assert!(reply.text[0].contains("ورود ثبت شد"));

        let reply = engine.handle(text(ADMIN, "1403-05")).await.unwrap();
        assert_eq!(reply.text, vec![format::UNKNOWN.to_string()]);
    }

    #[tokio::test]
    async fn callers_do_not_share_sessions() {
        let engine = engine().await;

        engine.handle(msg(ADMIN, Command::AdminMonthly)).await.unwrap();
        // another caller's text is not fed into the admin's flow
        let reply = engine.handle(text(1, "1403-05")).await.unwrap();
        assert_eq!(reply.text, vec![format::UNKNOWN.to_string()]);

        let reply = engine.handle(text(ADMIN, "1403-05")).await.unwrap();
        assert_eq!(reply.text, vec![format::ASK_SCOPE.to_string()]);
    }
}
