//! Notification orchestration.
//!
//! Decides, per the shop's settings, whether a check result becomes an
//! alert email, a dashboard inbox entry, both, or nothing. Delivery
//! failures are logged and never fail the originating check or request.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use stockwatch_core::{HistoryEntry, NotificationSettings, ReportPeriod};

use crate::db::{DbError, EmailLogStore, NewEmailRecord, SettingsStore};
use crate::services::email::{
    render_low_stock_alert, render_summary_report, EmailError, EmailService, RenderedEmail,
};

/// What happened to one alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifyOutcome {
    /// An email was handed to the SMTP relay.
    pub emailed: bool,
    /// The email was mirrored into the dashboard inbox.
    pub logged: bool,
}

/// Errors from explicitly requested report delivery.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No SMTP transport is configured.
    #[error("email delivery is not configured")]
    EmailNotConfigured,

    /// No recipient in settings or configuration.
    #[error("no recipient address configured")]
    NoRecipient,

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Db(#[from] DbError),
}

#[derive(Clone)]
pub struct Notifier {
    email: Option<EmailService>,
    settings: Arc<dyn SettingsStore>,
    email_log: Arc<dyn EmailLogStore>,
    /// Fallback recipient from the environment, used when settings hold
    /// no address.
    fallback_recipient: Option<String>,
}

impl Notifier {
    #[must_use]
    pub fn new(
        email: Option<EmailService>,
        settings: Arc<dyn SettingsStore>,
        email_log: Arc<dyn EmailLogStore>,
        fallback_recipient: Option<String>,
    ) -> Self {
        Self {
            email,
            settings,
            email_log,
            fallback_recipient,
        }
    }

    /// Current settings, degrading to defaults when the store is down.
    pub async fn settings(&self) -> NotificationSettings {
        match self.settings.get().await {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "failed to load notification settings, using defaults");
                NotificationSettings::default()
            }
        }
    }

    fn recipient(&self, settings: &NotificationSettings) -> Option<String> {
        if settings.email.is_empty() {
            self.fallback_recipient.clone()
        } else {
            Some(settings.email.clone())
        }
    }

    /// Dispatch notifications for one check result.
    ///
    /// Nothing happens for an all-clear result. Otherwise the alert is
    /// emailed when delivery is configured and enabled, and mirrored to
    /// the dashboard inbox unless `disable_dashboard` is set.
    pub async fn notify_low_stock(&self, entry: &HistoryEntry) -> NotifyOutcome {
        if entry.items.is_empty() {
            return NotifyOutcome::default();
        }

        let settings = self.settings().await;

        let rendered = match render_low_stock_alert(entry) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!(error = %err, "failed to render low-stock alert");
                return NotifyOutcome::default();
            }
        };

        let recipient = self.recipient(&settings);

        let mut outcome = NotifyOutcome::default();

        if !settings.disable_email {
            match (&self.email, &recipient) {
                (Some(service), Some(to)) => match service.send(to, &rendered).await {
                    Ok(()) => outcome.emailed = true,
                    Err(err) => warn!(error = %err, "failed to send low-stock alert"),
                },
                _ => info!("alert email skipped, delivery not configured"),
            }
        }

        if !settings.disable_dashboard {
            let record = NewEmailRecord {
                subject: rendered.subject.clone(),
                recipient: recipient.unwrap_or_default(),
                body_html: rendered.html.clone(),
            };
            match self.email_log.append(&record).await {
                Ok(id) => {
                    outcome.logged = true;
                    info!(email_id = %id, "alert mirrored to dashboard inbox");
                }
                Err(err) => warn!(error = %err, "failed to log alert to dashboard inbox"),
            }
        }

        outcome
    }

    /// Email a summary report over the given entries. Unlike alerts,
    /// reports are never mirrored to the inbox and failures surface to
    /// the caller.
    ///
    /// # Errors
    ///
    /// Fails when delivery is unconfigured, no recipient exists, or
    /// rendering or sending fails.
    pub async fn send_report(
        &self,
        period: ReportPeriod,
        entries: &[HistoryEntry],
    ) -> Result<RenderedEmail, ReportError> {
        let service = self.email.as_ref().ok_or(ReportError::EmailNotConfigured)?;
        let settings = self.settings.get().await?;
        let to = self.recipient(&settings).ok_or(ReportError::NoRecipient)?;

        let rendered = render_summary_report(period, entries)?;
        service.send(&to, &rendered).await?;

        Ok(rendered)
    }
}
