//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring check and report jobs. Every tick re-reads the shop's
//! settings, so a dashboard toggle takes effect before the next run
//! without a restart.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use stockwatch_core::ReportPeriod;

use crate::checker::StockChecker;
use crate::db::HistoryStore;
use crate::services::notifier::Notifier;

/// Daily low-stock check, 09:00 UTC.
const DAILY_CHECK_SCHEDULE: &str = "0 0 9 * * *";
/// Weekly summary report, Sunday 10:00 UTC.
const WEEKLY_REPORT_SCHEDULE: &str = "0 0 10 * * SUN";
/// Monthly summary report, 1st of the month 10:00 UTC.
const MONTHLY_REPORT_SCHEDULE: &str = "0 0 10 1 * *";

/// Everything the recurring jobs need, shared by `Arc`.
pub struct SchedulerContext {
    pub checker: StockChecker,
    pub notifier: Notifier,
    pub history: Arc<dyn HistoryStore>,
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept
/// alive for the lifetime of the process; dropping it shuts down all
/// jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be
/// initialised, a job cannot be registered, or the scheduler fails to
/// start.
pub async fn build_scheduler(ctx: Arc<SchedulerContext>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_daily_check_job(&scheduler, Arc::clone(&ctx)).await?;
    register_report_job(
        &scheduler,
        Arc::clone(&ctx),
        ReportPeriod::Weekly,
        WEEKLY_REPORT_SCHEDULE,
    )
    .await?;
    register_report_job(&scheduler, ctx, ReportPeriod::Monthly, MONTHLY_REPORT_SCHEDULE).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily automatic low-stock check.
async fn register_daily_check_job(
    scheduler: &JobScheduler,
    ctx: Arc<SchedulerContext>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(DAILY_CHECK_SCHEDULE, move |_uuid, _lock| {
        let ctx = Arc::clone(&ctx);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily low-stock check");
            run_daily_check(&ctx).await;
            tracing::info!("scheduler: daily low-stock check complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive one scheduled check, honoring the current settings.
async fn run_daily_check(ctx: &SchedulerContext) {
    let settings = ctx.notifier.settings().await;

    if !settings.enable_auto_check {
        tracing::info!("scheduler: automatic checks disabled in settings; skipping");
        return;
    }

    let outcome = match ctx.checker.check_low_stock(settings.default_threshold).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: scheduled check failed");
            return;
        }
    };

    let notify = ctx.notifier.notify_low_stock(&outcome.entry).await;
    tracing::info!(
        flagged = outcome.entry.item_count,
        emailed = notify.emailed,
        logged = notify.logged,
        "scheduler: scheduled check dispatched"
    );
}

/// Register a recurring summary report job.
async fn register_report_job(
    scheduler: &JobScheduler,
    ctx: Arc<SchedulerContext>,
    period: ReportPeriod,
    schedule: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let ctx = Arc::clone(&ctx);

        Box::pin(async move {
            tracing::info!(period = period.as_str(), "scheduler: starting summary report");
            run_report(&ctx, period).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Send one scheduled summary report for the period containing today.
async fn run_report(ctx: &SchedulerContext, period: ReportPeriod) {
    let settings = ctx.notifier.settings().await;

    // Recipient resolution (settings address or the configured
    // fallback) happens inside send_report; only an explicit opt-out
    // skips the report here.
    if settings.disable_email {
        tracing::info!(
            period = period.as_str(),
            "scheduler: email disabled in settings; skipping report"
        );
        return;
    }

    let today = Utc::now().date_naive();
    let entries = match ctx.history.for_period(period, Some(today)).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, period = period.as_str(), "scheduler: failed to load history");
            return;
        }
    };

    match ctx.notifier.send_report(period, &entries).await {
        Ok(rendered) => {
            tracing::info!(
                period = period.as_str(),
                checks = entries.len(),
                subject = %rendered.subject,
                "scheduler: summary report sent"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, period = period.as_str(), "scheduler: summary report failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use stockwatch_core::{
        EmailLogId, HistoryEntry, NotificationSettings, ThresholdMap,
    };

    use crate::config::FixturePolicy;
    use crate::db::{
        DbError, EmailLogStore, EmailRecord, NewEmailRecord, SettingsStore, ThresholdStore,
    };
    use crate::shopify::FixtureSource;

    struct MemSettings(NotificationSettings);

    #[async_trait]
    impl SettingsStore for MemSettings {
        async fn get(&self) -> Result<NotificationSettings, DbError> {
            Ok(self.0.clone())
        }

        async fn save(&self, _: &NotificationSettings) -> Result<(), DbError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemEmailLog;

    #[async_trait]
    impl EmailLogStore for MemEmailLog {
        async fn append(&self, _: &NewEmailRecord) -> Result<EmailLogId, DbError> {
            Ok(EmailLogId::new(1))
        }

        async fn list(&self) -> Result<Vec<EmailRecord>, DbError> {
            Ok(Vec::new())
        }

        async fn mark_read(&self, _: EmailLogId) -> Result<bool, DbError> {
            Ok(true)
        }

        async fn delete_many(&self, _: &[EmailLogId]) -> Result<u64, DbError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct MemThresholds;

    #[async_trait]
    impl ThresholdStore for MemThresholds {
        async fn get(&self) -> Result<ThresholdMap, DbError> {
            Ok(ThresholdMap::new())
        }

        async fn replace(&self, _: &ThresholdMap) -> Result<(), DbError> {
            Ok(())
        }
    }

    /// Records whether history was read at all.
    #[derive(Default)]
    struct MemHistory {
        queried: AtomicBool,
    }

    #[async_trait]
    impl HistoryStore for MemHistory {
        async fn append(&self, _: &HistoryEntry) -> Result<(), DbError> {
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<HistoryEntry>, DbError> {
            self.queried.store(true, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn for_period(
            &self,
            _: ReportPeriod,
            _: Option<NaiveDate>,
        ) -> Result<Vec<HistoryEntry>, DbError> {
            self.queried.store(true, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn context(settings: NotificationSettings, history: Arc<MemHistory>) -> SchedulerContext {
        let checker = StockChecker::new(
            Arc::new(FixtureSource),
            Arc::new(MemThresholds),
            Arc::clone(&history) as Arc<dyn HistoryStore>,
            FixturePolicy::Always,
        );
        let notifier = Notifier::new(
            None,
            Arc::new(MemSettings(settings)),
            Arc::new(MemEmailLog),
            Some("ops@example.com".to_owned()),
        );
        SchedulerContext {
            checker,
            notifier,
            history,
        }
    }

    #[tokio::test]
    async fn test_report_runs_with_only_the_fallback_recipient() {
        // Settings hold no address; the fallback recipient must still
        // drive the scheduled report past the opt-out gate.
        let history = Arc::new(MemHistory::default());
        let ctx = context(NotificationSettings::default(), Arc::clone(&history));

        run_report(&ctx, ReportPeriod::Weekly).await;

        assert!(history.queried.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_report_skipped_when_email_disabled() {
        let history = Arc::new(MemHistory::default());
        let settings = NotificationSettings {
            disable_email: true,
            email: "ops@example.com".to_owned(),
            ..Default::default()
        };
        let ctx = context(settings, Arc::clone(&history));

        run_report(&ctx, ReportPeriod::Monthly).await;

        assert!(!history.queried.load(Ordering::SeqCst));
    }
}
