use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::notification::NotificationKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub name: String,
    pub company_id: Option<ObjectId>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub notification_preferences: NotificationPrefs,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

/// Per-user email toggles. `email_notifications` is the master switch;
/// a toggle missing from the stored document counts as enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPrefs {
    #[serde(default = "bool_true")]
    pub email_notifications: bool,
    #[serde(default = "bool_true")]
    pub tender_invitation: bool,
    #[serde(default = "bool_true")]
    pub question_answered: bool,
    #[serde(default = "bool_true")]
    pub bid_submitted: bool,
    #[serde(default = "bool_true")]
    pub tender_awarded: bool,
    #[serde(default = "bool_true")]
    pub bid_rejected: bool,
    #[serde(default = "bool_true")]
    pub deadline_reminder: bool,
    #[serde(default = "bool_true")]
    pub contract_signing_requested: bool,
    #[serde(default = "bool_true")]
    pub contract_signed: bool,
    #[serde(default = "bool_true")]
    pub contract_amended: bool,
}

impl NotificationPrefs {
    /// Master switch first, then the per-category toggle.
    pub fn allows(&self, kind: NotificationKind) -> bool {
        if !self.email_notifications {
            return false;
        }
        match kind {
            NotificationKind::TenderInvitation => self.tender_invitation,
            NotificationKind::QuestionAnswered => self.question_answered,
            NotificationKind::BidSubmitted => self.bid_submitted,
            NotificationKind::TenderAwarded => self.tender_awarded,
            NotificationKind::BidRejected => self.bid_rejected,
            NotificationKind::DeadlineReminder => self.deadline_reminder,
            NotificationKind::ContractSigningRequested => self.contract_signing_requested,
            NotificationKind::ContractSigned => self.contract_signed,
            NotificationKind::ContractAmended => self.contract_amended,
        }
    }
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email_notifications: true,
            tender_invitation: true,
            question_answered: true,
            bid_submitted: true,
            tender_awarded: true,
            bid_rejected: true,
            deadline_reminder: true,
            contract_signing_requested: true,
            contract_signed: true,
            contract_amended: true,
        }
    }
}

fn bool_true() -> bool {
    true
}

fn default_locale() -> String {
    "nb-NO".to_string()
}

impl User {
    pub const COLLECTION: &'static str = "users";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_everything() {
        let prefs = NotificationPrefs::default();
        assert!(prefs.allows(NotificationKind::TenderInvitation));
        assert!(prefs.allows(NotificationKind::ContractAmended));
    }

    #[test]
    fn master_switch_overrides_category_toggles() {
        let prefs = NotificationPrefs {
            email_notifications: false,
            ..NotificationPrefs::default()
        };
        assert!(!prefs.allows(NotificationKind::TenderAwarded));
        assert!(!prefs.allows(NotificationKind::DeadlineReminder));
    }

    #[test]
    fn category_toggle_only_affects_its_own_kind() {
        let prefs = NotificationPrefs {
            bid_rejected: false,
            ..NotificationPrefs::default()
        };
        assert!(!prefs.allows(NotificationKind::BidRejected));
        assert!(prefs.allows(NotificationKind::TenderAwarded));
    }

    #[test]
    fn missing_toggles_deserialize_as_enabled() {
        let prefs: NotificationPrefs = serde_json::from_str("{}").unwrap();
        assert!(prefs.email_notifications);
        assert!(prefs.allows(NotificationKind::QuestionAnswered));
    }
}
