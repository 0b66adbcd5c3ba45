pub mod mailer;
pub mod templates;

use std::sync::Arc;

use bson::oid::ObjectId;
use dashmap::DashMap;
use tracing::{debug, warn};

use anbud_db::models::{Notification, NotificationKind, NotificationPrefs, NotificationSource};

use crate::dao::{NotificationDao, UserDao};
use crate::error::{ServiceError, ServiceResult};

pub use mailer::{
    DisabledMailer, EmailMessage, EmailOutcome, Mailer, MailerError, SmtpMailer,
    mailer_from_settings,
};

/// One email target. `user_id` drives the preference gate and, when no
/// address was captured up front, the address lookup. A recipient with
/// only an address (no user id) is sent to unconditionally: the address
/// was supplied out-of-band and there is no preference document to
/// consult.
#[derive(Debug, Clone)]
pub struct EmailRecipient {
    pub user_id: Option<ObjectId>,
    pub email: Option<String>,
}

impl EmailRecipient {
    pub fn user(user_id: ObjectId) -> Self {
        Self {
            user_id: Some(user_id),
            email: None,
        }
    }

    pub fn address(email: impl Into<String>) -> Self {
        Self {
            user_id: None,
            email: Some(email.into()),
        }
    }

    pub fn with_email(user_id: ObjectId, email: Option<String>) -> Self {
        Self {
            user_id: Some(user_id),
            email,
        }
    }

    fn label(&self) -> String {
        match (&self.email, self.user_id) {
            (Some(email), _) => email.clone(),
            (None, Some(user_id)) => format!("user:{}", user_id.to_hex()),
            (None, None) => "<unaddressed>".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FanoutReport {
    pub delivered: usize,
    pub skipped: usize,
    pub suppressed: usize,
    pub failures: Vec<FanoutFailure>,
}

#[derive(Debug)]
pub struct FanoutFailure {
    pub recipient: String,
    pub reason: String,
}

impl FanoutReport {
    /// Delivered plus transport-skipped; suppression by preference is
    /// neither success nor failure.
    pub fn successes(&self) -> usize {
        self.delivered + self.skipped
    }

    pub fn attempted(&self) -> usize {
        self.delivered + self.skipped + self.suppressed + self.failures.len()
    }
}

enum SendDisposition {
    Delivered,
    Skipped,
    Suppressed,
}

pub struct NotificationService {
    users: Arc<UserDao>,
    notifications: Arc<NotificationDao>,
    mailer: Arc<dyn Mailer>,
    // Read-through, process-lifetime. A `None` entry records a failed
    // lookup: that user stays muted until restart (fail-closed).
    pref_cache: DashMap<ObjectId, Option<NotificationPrefs>>,
}

impl NotificationService {
    pub fn new(
        users: Arc<UserDao>,
        notifications: Arc<NotificationDao>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            users,
            notifications,
            mailer,
            pref_cache: DashMap::new(),
        }
    }

    /// Preference gate. No user id means the caller's only channel is a
    /// literal address supplied out-of-band, which is always allowed.
    pub async fn should_send(&self, user_id: Option<ObjectId>, kind: NotificationKind) -> bool {
        let Some(user_id) = user_id else {
            return true;
        };

        if let Some(cached) = self.pref_cache.get(&user_id) {
            return cached.as_ref().is_some_and(|p| p.allows(kind));
        }

        let entry = match self.users.find_by_id(user_id).await {
            Ok(user) => Some(user.notification_preferences),
            Err(err) => {
                warn!(user_id = %user_id.to_hex(), %err,
                    "Preference lookup failed, muting user for the rest of this run");
                None
            }
        };
        let allowed = entry.as_ref().is_some_and(|p| p.allows(kind));
        self.pref_cache.insert(user_id, entry);
        allowed
    }

    async fn send_one(
        &self,
        kind: NotificationKind,
        recipient: &EmailRecipient,
        subject: &str,
        html: &str,
    ) -> Result<SendDisposition, String> {
        if !self.should_send(recipient.user_id, kind).await {
            return Ok(SendDisposition::Suppressed);
        }

        let to = match &recipient.email {
            Some(email) => email.clone(),
            None => match recipient.user_id {
                Some(user_id) => self
                    .users
                    .email_of(user_id)
                    .await
                    .map_err(|e| format!("address lookup failed: {e}"))?
                    .ok_or_else(|| "no email address on file".to_string())?,
                None => return Err("recipient has neither user id nor address".to_string()),
            },
        };

        let message = EmailMessage {
            to,
            subject: subject.to_string(),
            html_body: html.to_string(),
        };

        match self.mailer.send(&message).await {
            Ok(EmailOutcome::Delivered) => Ok(SendDisposition::Delivered),
            Ok(EmailOutcome::Skipped) => Ok(SendDisposition::Skipped),
            Err(err) => Err(err.to_string()),
        }
    }

    /// Single gated email to a known user. Callers that must not fail on
    /// notification trouble catch and log the result themselves.
    pub async fn email_user(
        &self,
        user_id: ObjectId,
        kind: NotificationKind,
        subject: &str,
        html: &str,
    ) -> ServiceResult<()> {
        self.send_one(kind, &EmailRecipient::user(user_id), subject, html)
            .await
            .map(|_| ())
            .map_err(ServiceError::Dependency)
    }

    /// Fans one event out to a batch of recipients. Always walks the
    /// whole list; a failing recipient is recorded and never blocks the
    /// rest.
    pub async fn send_batch<F>(
        &self,
        kind: NotificationKind,
        recipients: &[EmailRecipient],
        build: F,
    ) -> FanoutReport
    where
        F: Fn(&EmailRecipient) -> (String, String),
    {
        let mut report = FanoutReport::default();

        for recipient in recipients {
            let (subject, html) = build(recipient);
            match self.send_one(kind, recipient, &subject, &html).await {
                Ok(SendDisposition::Delivered) => report.delivered += 1,
                Ok(SendDisposition::Skipped) => report.skipped += 1,
                Ok(SendDisposition::Suppressed) => {
                    debug!(recipient = %recipient.label(), ?kind, "Suppressed by preferences");
                    report.suppressed += 1;
                }
                Err(reason) => {
                    warn!(recipient = %recipient.label(), ?kind, %reason, "Email send failed");
                    report.failures.push(FanoutFailure {
                        recipient: recipient.label(),
                        reason,
                    });
                }
            }
        }

        report
    }

    pub async fn notify_in_app(
        &self,
        user_id: ObjectId,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        link: Option<String>,
        source: NotificationSource,
    ) -> ServiceResult<()> {
        let notification = Notification {
            id: None,
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            link,
            source,
            is_read: false,
            read_at: None,
            created_at: bson::DateTime::now(),
        };
        self.notifications.create(&notification).await?;
        Ok(())
    }

    #[cfg(test)]
    fn prime_preferences(&self, user_id: ObjectId, prefs: Option<NotificationPrefs>) {
        self.pref_cache.insert(user_id, prefs);
    }
}
