//! Email delivery for alerts and summary reports.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates.
//! Rendering is separated from delivery so the dashboard inbox can log
//! the exact body that went out.

use std::collections::BTreeMap;

use askama::Template;
use chrono::NaiveDate;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use stockwatch_core::{HistoryEntry, LowStockItem, ReportPeriod};

use crate::config::EmailConfig;

/// HTML template for the low-stock alert email.
#[derive(Template)]
#[template(path = "email/low_stock_alert.html")]
struct LowStockAlertHtml<'a> {
    items: &'a [LowStockItem],
    threshold: i64,
    checked_at: &'a str,
}

/// Plain text template for the low-stock alert email.
#[derive(Template)]
#[template(path = "email/low_stock_alert.txt")]
struct LowStockAlertText<'a> {
    items: &'a [LowStockItem],
    threshold: i64,
    checked_at: &'a str,
}

/// HTML template for the summary report email.
#[derive(Template)]
#[template(path = "email/summary_report.html")]
struct SummaryReportHtml<'a> {
    period_name: &'a str,
    days: &'a [ReportDay],
    check_count: usize,
}

/// Plain text template for the summary report email.
#[derive(Template)]
#[template(path = "email/summary_report.txt")]
struct SummaryReportText<'a> {
    period_name: &'a str,
    days: &'a [ReportDay],
    check_count: usize,
}

/// One calendar day of a summary report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDay {
    /// The day, formatted `YYYY-MM-DD`.
    pub date: String,
    /// Checks that ran on this day.
    pub check_count: usize,
    /// Highest flagged-item count any single check saw.
    pub max_item_count: i64,
    /// Titles of every product flagged at least once, sorted.
    pub titles: Vec<String>,
}

/// Group history entries by calendar day for a report, oldest day first.
#[must_use]
pub fn group_by_day(entries: &[HistoryEntry]) -> Vec<ReportDay> {
    let mut days: BTreeMap<NaiveDate, ReportDay> = BTreeMap::new();
    for entry in entries {
        let date = entry.checked_at.date_naive();
        let day = days.entry(date).or_insert_with(|| ReportDay {
            date: date.format("%Y-%m-%d").to_string(),
            check_count: 0,
            max_item_count: 0,
            titles: Vec::new(),
        });
        day.check_count += 1;
        day.max_item_count = day.max_item_count.max(entry.item_count);
        for item in &entry.items {
            if !day.titles.contains(&item.title) {
                day.titles.push(item.title.clone());
            }
        }
    }
    days.into_values()
        .map(|mut day| {
            day.titles.sort();
            day
        })
        .collect()
}

/// A fully rendered email, ready to send or to mirror into the
/// dashboard inbox.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the alert email for one check result.
///
/// # Errors
///
/// Returns an error if a template fails to render.
pub fn render_low_stock_alert(entry: &HistoryEntry) -> Result<RenderedEmail, EmailError> {
    let checked_at = entry.checked_at.format("%Y-%m-%d %H:%M UTC").to_string();
    let html = LowStockAlertHtml {
        items: &entry.items,
        threshold: entry.threshold,
        checked_at: &checked_at,
    }
    .render()?;
    let text = LowStockAlertText {
        items: &entry.items,
        threshold: entry.threshold,
        checked_at: &checked_at,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!(
            "Low Stock Alert: {} {}",
            entry.item_count,
            if entry.item_count == 1 {
                "product needs attention"
            } else {
                "products need attention"
            }
        ),
        text,
        html,
    })
}

/// Render a summary report over the given period's history entries.
///
/// # Errors
///
/// Returns an error if a template fails to render.
pub fn render_summary_report(
    period: ReportPeriod,
    entries: &[HistoryEntry],
) -> Result<RenderedEmail, EmailError> {
    let days = group_by_day(entries);
    let period_name = period.display_name();
    let html = SummaryReportHtml {
        period_name,
        days: &days,
        check_count: entries.len(),
    }
    .render()?;
    let text = SummaryReportText {
        period_name,
        days: &days,
        check_count: entries.len(),
    }
    .render()?;

    Ok(RenderedEmail {
        subject: format!("{period_name} Low Stock Report"),
        text,
        html,
    })
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// SMTP delivery for rendered emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a rendered email as multipart plain text plus HTML.
    ///
    /// # Errors
    ///
    /// Returns an error if an address fails to parse or delivery fails.
    pub async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        self.mailer.send(message).await?;

        tracing::info!(to = %to, subject = %email.subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};
    use stockwatch_core::ProductId;

    fn item(title: &str, total: i64) -> LowStockItem {
        LowStockItem {
            id: ProductId::new(1),
            title: title.to_owned(),
            total_available: total,
            variants: Vec::new(),
        }
    }

    fn entry_on(day: u32, items: Vec<LowStockItem>) -> HistoryEntry {
        HistoryEntry::at(
            Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap(),
            5,
            items,
        )
    }

    #[test]
    fn test_group_by_day_merges_same_day() {
        let entries = vec![
            entry_on(10, vec![item("Hoodie", 2)]),
            entry_on(10, vec![item("Hoodie", 1), item("Tee", 0)]),
            entry_on(11, vec![]),
        ];

        let days = group_by_day(&entries);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, "2025-03-10");
        assert_eq!(days[0].check_count, 2);
        assert_eq!(days[0].max_item_count, 2);
        assert_eq!(days[0].titles, vec!["Hoodie", "Tee"]);
        assert_eq!(days[1].check_count, 1);
        assert_eq!(days[1].max_item_count, 0);
    }

    #[test]
    fn test_alert_subject_pluralizes() {
        let one = render_low_stock_alert(&entry_on(10, vec![item("Hoodie", 2)])).unwrap();
        assert_eq!(one.subject, "Low Stock Alert: 1 product needs attention");

        let two =
            render_low_stock_alert(&entry_on(10, vec![item("Hoodie", 2), item("Tee", 0)])).unwrap();
        assert_eq!(two.subject, "Low Stock Alert: 2 products need attention");
    }

    #[test]
    fn test_alert_bodies_list_items() {
        let rendered = render_low_stock_alert(&entry_on(10, vec![item("Hoodie", 2)])).unwrap();
        assert!(rendered.html.contains("Hoodie"));
        assert!(rendered.text.contains("Hoodie"));
        assert!(rendered.text.contains('2'));
    }

    #[test]
    fn test_report_subject_carries_period() {
        let rendered = render_summary_report(ReportPeriod::Weekly, &[]).unwrap();
        assert_eq!(rendered.subject, "Weekly Low Stock Report");
    }
}
