use crate::error::MailerError;
use crate::transport::{OutgoingReport, ReportTransport};
use analytics::{AggregationEngine, SessionProvider};
use chrono::{DateTime, Local, Utc};
use configuration::ReportConfig;
use core_types::{Scope, Window};
use renderer::{RenderOptions, ReportRenderer};
use std::sync::Arc;

const SUBJECT_PREFIX: &str = "CONSOLIDATED REPORT CPA PRO";
const BODY: &str = "Attached is the performance report for the operators.";

/// How a reporting run ended. Dispatching never returns an error; every
/// fault is folded into `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { rows: usize, pages: usize },
    /// Nobody had activity in the window. Nothing was transmitted.
    NothingToReport,
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DispatchOutcome::Failed { .. })
    }

    /// A short human-readable summary, suitable for API responses.
    pub fn message(&self) -> String {
        match self {
            DispatchOutcome::Sent { rows, pages } => {
                format!("Report sent: {rows} row(s) on {pages} page(s).")
            }
            DispatchOutcome::NothingToReport => "No activity in the reporting window.".to_string(),
            DispatchOutcome::Failed { reason } => format!("Report failed: {reason}"),
        }
    }
}

/// Coordinates one reporting run: aggregate, render, transmit.
pub struct Dispatcher {
    sessions: Arc<dyn SessionProvider>,
    transport: Arc<dyn ReportTransport>,
    engine: AggregationEngine,
    renderer: ReportRenderer,
    window_days: i64,
    attachment_name: String,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        transport: Arc<dyn ReportTransport>,
        report: &ReportConfig,
    ) -> Self {
        let renderer = ReportRenderer::new(RenderOptions {
            title: report.title.clone(),
            currency: report.currency.clone(),
        });
        Self {
            sessions,
            transport,
            engine: AggregationEngine::new(),
            renderer,
            window_days: report.window_days,
            attachment_name: report.attachment_name.clone(),
        }
    }

    pub async fn dispatch(&self, scope: Scope) -> DispatchOutcome {
        self.dispatch_at(scope, Utc::now()).await
    }

    /// Runs the pipeline with the window ending at `now`.
    pub async fn dispatch_at(&self, scope: Scope, now: DateTime<Utc>) -> DispatchOutcome {
        match self.try_dispatch(scope, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, ?scope, "Report dispatch failed.");
                DispatchOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    /// Runs the dispatch on its own task, so a panic anywhere in the pipeline
    /// is reported as `Failed` rather than unwinding into the caller.
    pub async fn run_contained(self: Arc<Self>, scope: Scope) -> DispatchOutcome {
        match tokio::spawn(async move { self.dispatch(scope).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, ?scope, "Report task aborted.");
                DispatchOutcome::Failed { reason: format!("report task aborted: {e}") }
            }
        }
    }

    async fn try_dispatch(&self, scope: Scope, now: DateTime<Utc>) -> Result<DispatchOutcome, MailerError> {
        let window = Window::trailing_days(now, self.window_days);

        // The session is released before rendering and transmission start.
        let rows = {
            let mut session = self.sessions.open_session().await?;
            self.engine.aggregate(session.as_mut(), scope, window).await?
        };

        if rows.is_empty() {
            tracing::info!(?scope, "No activity in the reporting window; nothing sent.");
            return Ok(DispatchOutcome::NothingToReport);
        }

        let rendered = self.renderer.render(&rows)?;
        let report = OutgoingReport {
            subject: subject_for(now),
            body: BODY.to_string(),
            attachment_name: self.attachment_name.clone(),
            pdf: rendered.bytes,
        };
        self.transport.send(report).await?;

        tracing::info!(?scope, rows = rows.len(), pages = rendered.pages, "Report dispatched.");
        Ok(DispatchOutcome::Sent { rows: rows.len(), pages: rendered.pages })
    }
}

/// `CONSOLIDATED REPORT CPA PRO - dd/mm`, dated in local time.
pub fn subject_for(now: DateTime<Utc>) -> String {
    format!("{SUBJECT_PREFIX} - {}", now.with_timezone(&Local).format("%d/%m"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use analytics::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use core_types::Role;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    struct PanickingTransport;

    #[async_trait]
    impl ReportTransport for PanickingTransport {
        async fn send(&self, _report: OutgoingReport) -> Result<(), MailerError> {
            panic!("transport blew up");
        }
    }

    fn settings() -> ReportConfig {
        ReportConfig {
            window_days: 7,
            attachment_name: "Consolidated_Report.pdf".to_string(),
            title: "CPA PRO - CONSOLIDATED REPORT".to_string(),
            currency: "R$".to_string(),
        }
    }

    fn dispatcher(store: &MemoryStore, transport: Arc<dyn ReportTransport>) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(Arc::new(store.clone()), transport, &settings()))
    }

    fn seeded_store(now: DateTime<Utc>) -> MemoryStore {
        let store = MemoryStore::new();
        let ana = store.add_user("ana", Role::User);
        store.add_cycle(
            &ana,
            now - Duration::days(1),
            [dec!(100), dec!(150), Decimal::ZERO],
            [Decimal::ZERO, Decimal::ZERO, dec!(20)],
        );
        store
    }

    #[tokio::test]
    async fn all_users_without_activity_is_a_quiet_success() {
        let store = MemoryStore::new();
        store.add_user("ana", Role::User);
        let transport = MemoryTransport::new();
        let dispatcher = dispatcher(&store, Arc::new(transport.clone()));

        let outcome = dispatcher.dispatch(Scope::All).await;

        assert_eq!(outcome, DispatchOutcome::NothingToReport);
        assert!(outcome.is_success());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn sends_one_email_with_the_pdf_attached() {
        let now = Utc::now();
        let store = seeded_store(now);
        let transport = MemoryTransport::new();
        let dispatcher = dispatcher(&store, Arc::new(transport.clone()));

        let outcome = dispatcher.dispatch_at(Scope::All, now).await;

        assert_eq!(outcome, DispatchOutcome::Sent { rows: 1, pages: 1 });
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, subject_for(now));
        assert!(sent[0].subject.starts_with("CONSOLIDATED REPORT CPA PRO - "));
        assert_eq!(sent[0].attachment_name, "Consolidated_Report.pdf");
        assert!(sent[0].pdf.starts_with(b"%PDF"));
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn single_user_scope_reports_even_without_cycles() {
        let store = MemoryStore::new();
        let bia = store.add_user("bia", Role::User);
        let transport = MemoryTransport::new();
        let dispatcher = dispatcher(&store, Arc::new(transport.clone()));

        let outcome = dispatcher.dispatch(Scope::Single(bia.id)).await;

        assert_eq!(outcome, DispatchOutcome::Sent { rows: 1, pages: 1 });
        assert_eq!(transport.sent()[0].attachment_name, "Consolidated_Report.pdf");
    }

    #[tokio::test]
    async fn every_invocation_sends_again() {
        let now = Utc::now();
        let store = seeded_store(now);
        let transport = MemoryTransport::new();
        let dispatcher = dispatcher(&store, Arc::new(transport.clone()));

        dispatcher.dispatch_at(Scope::All, now).await;
        dispatcher.dispatch_at(Scope::All, now).await;

        assert_eq!(transport.sent().len(), 2);
        assert_eq!(store.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn transmission_fault_is_a_failed_outcome() {
        let now = Utc::now();
        let store = seeded_store(now);
        let transport = MemoryTransport::new();
        transport.set_failing(true);
        let dispatcher = dispatcher(&store, Arc::new(transport.clone()));

        let outcome = dispatcher.dispatch_at(Scope::All, now).await;

        assert!(!outcome.is_success());
        assert!(outcome.message().contains("relay unavailable"));
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn data_fault_is_a_failed_outcome_and_sends_nothing() {
        let store = seeded_store(Utc::now());
        store.set_unavailable(true);
        let transport = MemoryTransport::new();
        let dispatcher = dispatcher(&store, Arc::new(transport.clone()));

        let outcome = dispatcher.dispatch(Scope::All).await;

        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
        assert!(transport.sent().is_empty());
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn unknown_user_is_a_failed_outcome() {
        let store = MemoryStore::new();
        let dispatcher = dispatcher(&store, Arc::new(MemoryTransport::new()));

        let outcome = dispatcher.dispatch(Scope::Single(Uuid::new_v4())).await;

        assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn run_contained_turns_a_panic_into_failed() {
        let store = seeded_store(Utc::now());
        let dispatcher = dispatcher(&store, Arc::new(PanickingTransport));

        let outcome = dispatcher.run_contained(Scope::All).await;

        assert!(matches!(outcome, DispatchOutcome::Failed { reason } if reason.contains("aborted")));
    }
}
