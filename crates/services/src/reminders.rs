use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use anbud_db::models::{InvitationStatus, NotificationKind, NotificationSource, Tender};

use crate::dao::TenderDao;
use crate::error::ServiceResult;
use crate::notify::{EmailRecipient, NotificationService, templates};

/// Whole calendar days between now and the deadline. Clock times are
/// ignored so a reminder offset of 3 matches the entire third day
/// before the deadline.
pub fn days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline.date_naive() - now.date_naive()).num_days()
}

pub fn reminder_offset(
    offsets: &[i64],
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<i64> {
    let days = days_until(deadline, now);
    if days >= 0 && offsets.contains(&days) {
        Some(days)
    } else {
        None
    }
}

#[derive(Debug, Default)]
pub struct ReminderSweep {
    pub tenders_matched: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub suppressed: usize,
    pub failed: usize,
}

pub struct ReminderService {
    tenders: Arc<TenderDao>,
    notify: Arc<NotificationService>,
    offsets: Vec<i64>,
}

impl ReminderService {
    pub fn new(tenders: Arc<TenderDao>, notify: Arc<NotificationService>, offsets: Vec<i64>) -> Self {
        Self {
            tenders,
            notify,
            offsets,
        }
    }

    /// Pull-based sweep over open tenders: every invited supplier who
    /// has not submitted gets a reminder when the deadline is exactly
    /// one of the configured offsets away. Re-running within the same
    /// day can re-send; that duplication is accepted as best-effort.
    pub async fn check_deadline_reminders(&self) -> ServiceResult<ReminderSweep> {
        let now = Utc::now();
        let open = self.tenders.find_open().await?;

        let mut sweep = ReminderSweep::default();
        for tender in &open {
            let Some(days_left) = reminder_offset(&self.offsets, tender.deadline.to_chrono(), now)
            else {
                continue;
            };
            sweep.tenders_matched += 1;
            self.remind_tender(tender, days_left, &mut sweep).await;
        }

        info!(
            matched = sweep.tenders_matched,
            delivered = sweep.delivered,
            failed = sweep.failed,
            "Deadline reminder sweep finished"
        );
        Ok(sweep)
    }

    async fn remind_tender(&self, tender: &Tender, days_left: i64, sweep: &mut ReminderSweep) {
        let pending: Vec<_> = tender
            .invitations
            .iter()
            .filter(|inv| inv.status != InvitationStatus::Submitted)
            .collect();

        let source = NotificationSource {
            entity_type: "tender".to_string(),
            entity_id: tender.id.unwrap_or_else(bson::oid::ObjectId::new),
            actor_id: None,
        };

        for inv in &pending {
            let Some(user_id) = inv.user_id else { continue };
            if let Err(err) = self
                .notify
                .notify_in_app(
                    user_id,
                    NotificationKind::DeadlineReminder,
                    format!("{days_left} day(s) left to bid on \"{}\"", tender.title),
                    format!("Deadline: {}.", templates::format_date(tender.deadline)),
                    None,
                    source.clone(),
                )
                .await
            {
                warn!(%err, "Reminder in-app notification failed");
            }
        }

        let recipients: Vec<EmailRecipient> = pending
            .iter()
            .filter(|inv| inv.email.is_some() || inv.user_id.is_some())
            .map(|inv| EmailRecipient {
                user_id: inv.user_id,
                email: inv.email.clone(),
            })
            .collect();

        let report = self
            .notify
            .send_batch(NotificationKind::DeadlineReminder, &recipients, |_| {
                templates::deadline_reminder(&tender.title, tender.deadline, days_left)
            })
            .await;
        sweep.delivered += report.delivered;
        sweep.skipped += report.skipped;
        sweep.suppressed += report.suppressed;
        sweep.failed += report.failures.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn days_until_counts_calendar_days_not_hours() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap();
        let deadline = Utc.with_ymd_and_hms(2026, 3, 13, 1, 0, 0).unwrap();
        assert_eq!(days_until(deadline, now), 3);
    }

    #[test]
    fn offset_matches_only_configured_days() {
        let offsets = [7, 3, 1];
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();

        let in_three = Utc.with_ymd_and_hms(2026, 3, 13, 12, 0, 0).unwrap();
        assert_eq!(reminder_offset(&offsets, in_three, now), Some(3));

        let in_five = Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(reminder_offset(&offsets, in_five, now), None);
    }

    #[test]
    fn passed_deadlines_never_match() {
        let offsets = [7, 3, 1, 0];
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(reminder_offset(&offsets, yesterday, now), None);

        // Same-day deadline still matches an explicit 0 offset.
        let today = Utc.with_ymd_and_hms(2026, 3, 10, 20, 0, 0).unwrap();
        assert_eq!(reminder_offset(&offsets, today, now), Some(0));
    }
}
