use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use anbud_db::models::{
    AwardLetter, AwardLetterStatus, Bid, BidStatus, NotificationKind, NotificationSource, Tender,
    TenderStatus,
};

use crate::dao::TenderDao;
use crate::dao::base::DaoError;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{EmailRecipient, NotificationService, templates};

/// End of the standstill window: the award date advanced by
/// `period_days` calendar days, at the last instant of that day. The
/// window is full-day-inclusive, so a same-day award still grants the
/// complete Nth day.
pub fn standstill_end(award_date: DateTime<Utc>, period_days: i64) -> DateTime<Utc> {
    (award_date + Duration::days(period_days))
        .date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("constant wall-clock time is valid")
        .and_utc()
}

/// An absent end date means the tender was awarded outside this
/// workflow; such contracts are not blocked.
pub fn is_standstill_over(end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    end.is_none_or(|end| now >= end)
}

/// Applies the award to an in-memory tender: winner marked `awarded`,
/// every sibling bid `rejected` (unless already in a terminal rejected
/// state), standstill window computed, letter snapshot attached.
fn apply_award(
    tender: &mut Tender,
    bid_id: ObjectId,
    project_id: ObjectId,
    now: DateTime<Utc>,
    period_days: i64,
) -> ServiceResult<AwardLetter> {
    if tender.status == TenderStatus::Awarded || tender.awarded_bid_id.is_some() {
        return Err(ServiceError::Policy(
            "tender has already been awarded".to_string(),
        ));
    }
    if tender.status == TenderStatus::Draft {
        return Err(ServiceError::Policy(
            "a draft tender cannot be awarded".to_string(),
        ));
    }

    let tender_id = tender.id.ok_or(ServiceError::NotFound("tender"))?;
    let winner = tender
        .bids
        .iter()
        .find(|b| b.id == bid_id)
        .ok_or(ServiceError::NotFound("bid"))?;

    let awarded_at = bson::DateTime::from_chrono(now);
    let end = bson::DateTime::from_chrono(standstill_end(now, period_days));

    let letter = AwardLetter {
        tender_id,
        bid_id,
        project_id,
        awardee_user_id: winner.bidder_id,
        awardee_company_id: winner.company_id,
        awardee_email: invitation_email(tender, winner),
        awarded_at,
        standstill_start: awarded_at,
        standstill_end: end,
        price: winner.price.clone(),
        status: AwardLetterStatus::Standstill,
    };

    for bid in &mut tender.bids {
        if bid.id == bid_id {
            bid.status = BidStatus::Awarded;
        } else if bid.status != BidStatus::Rejected {
            bid.status = BidStatus::Rejected;
        }
    }

    tender.status = TenderStatus::Awarded;
    tender.awarded_bid_id = Some(bid_id);
    tender.awarded_at = Some(awarded_at);
    tender.standstill_start_date = Some(awarded_at);
    tender.standstill_end_date = Some(end);
    tender.award_letter = Some(letter.clone());

    Ok(letter)
}

/// The bidder's address as captured on their invitation, if any. The
/// profile email is the fallback, resolved at send time.
fn invitation_email(tender: &Tender, bid: &Bid) -> Option<String> {
    tender
        .invitations
        .iter()
        .find(|i| {
            i.user_id == Some(bid.bidder_id)
                || (bid.company_id.is_some() && i.company_id == bid.company_id)
        })
        .and_then(|i| i.email.clone())
}

pub struct AwardService {
    tenders: Arc<TenderDao>,
    notify: Arc<NotificationService>,
    standstill_days: i64,
}

impl AwardService {
    pub fn new(
        tenders: Arc<TenderDao>,
        notify: Arc<NotificationService>,
        standstill_days: i64,
    ) -> Self {
        Self {
            tenders,
            notify,
            standstill_days,
        }
    }

    /// Awards `bid_id` on `tender_id`. The tender write is one
    /// conditional update; notifications afterwards are best-effort and
    /// never roll the award back.
    pub async fn award(
        &self,
        tender_id: ObjectId,
        bid_id: ObjectId,
        project_id: ObjectId,
    ) -> ServiceResult<Tender> {
        let mut tender = self
            .tenders
            .find_by_id(tender_id)
            .await
            .map_err(|e| match e {
                DaoError::NotFound => ServiceError::NotFound("tender"),
                other => other.into(),
            })?;

        apply_award(
            &mut tender,
            bid_id,
            project_id,
            Utc::now(),
            self.standstill_days,
        )?;

        self.tenders.commit_award(&tender).await.map_err(|e| match e {
            DaoError::Validation(msg) => ServiceError::Policy(msg),
            other => other.into(),
        })?;

        info!(
            tender_id = %tender_id.to_hex(),
            bid_id = %bid_id.to_hex(),
            standstill_end = ?tender.standstill_end_date,
            "Tender awarded"
        );

        self.send_award_notifications(&tender, bid_id).await;

        Ok(tender)
    }

    async fn send_award_notifications(&self, tender: &Tender, winning_bid_id: ObjectId) {
        let Some(letter) = &tender.award_letter else {
            return;
        };
        let source = NotificationSource {
            entity_type: "tender".to_string(),
            entity_id: letter.tender_id,
            actor_id: Some(tender.creator_id),
        };

        if let Err(err) = self
            .notify
            .notify_in_app(
                letter.awardee_user_id,
                NotificationKind::TenderAwarded,
                format!("Your bid on \"{}\" was selected", tender.title),
                format!(
                    "The standstill period runs until {}.",
                    templates::format_date(letter.standstill_end)
                ),
                None,
                source.clone(),
            )
            .await
        {
            warn!(%err, "Award in-app notification failed");
        }

        let winner = EmailRecipient::with_email(letter.awardee_user_id, letter.awardee_email.clone());
        let (subject, html) = templates::awarded(&tender.title, letter.standstill_end);
        let report = self
            .notify
            .send_batch(NotificationKind::TenderAwarded, &[winner], |_| {
                (subject.clone(), html.clone())
            })
            .await;
        if !report.failures.is_empty() {
            warn!(failures = report.failures.len(), "Award email not delivered");
        }

        let losers: Vec<EmailRecipient> = tender
            .bids
            .iter()
            .filter(|b| b.id != winning_bid_id)
            .map(|b| EmailRecipient::with_email(b.bidder_id, invitation_email(tender, b)))
            .collect();

        for bid in tender.bids.iter().filter(|b| b.id != winning_bid_id) {
            if let Err(err) = self
                .notify
                .notify_in_app(
                    bid.bidder_id,
                    NotificationKind::BidRejected,
                    format!("Outcome of \"{}\"", tender.title),
                    "Another bid was selected.".to_string(),
                    None,
                    source.clone(),
                )
                .await
            {
                warn!(%err, "Rejection in-app notification failed");
            }
        }

        let report = self
            .notify
            .send_batch(NotificationKind::BidRejected, &losers, |_| {
                templates::rejected(&tender.title)
            })
            .await;
        info!(
            delivered = report.delivered,
            skipped = report.skipped,
            suppressed = report.suppressed,
            failed = report.failures.len(),
            "Rejection fan-out finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anbud_db::models::{PriceStructure, PriceTerms, StandardTerms, Ns8406Terms};
    use chrono::TimeZone;

    fn bid(tender_id: ObjectId, total_ore: i64) -> Bid {
        Bid {
            id: ObjectId::new(),
            tender_id,
            bidder_id: ObjectId::new(),
            company_id: Some(ObjectId::new()),
            submitted_at: bson::DateTime::now(),
            price: PriceTerms {
                total_ore,
                structure: PriceStructure::FixedPrice,
                hourly_rates: Vec::new(),
            },
            documents: Vec::new(),
            status: BidStatus::Submitted,
            score: None,
        }
    }

    fn open_tender_with_bids(totals: &[i64]) -> Tender {
        let id = ObjectId::new();
        Tender {
            id: Some(id),
            title: "Groundworks, lot 2".to_string(),
            description: "Excavation and foundations".to_string(),
            terms: StandardTerms::Ns8406(Ns8406Terms {
                security_percent: 10,
                defect_liability_years: 5,
            }),
            creator_id: ObjectId::new(),
            deadline: bson::DateTime::now(),
            publish_date: Some(bson::DateTime::now()),
            question_deadline: None,
            budget_ore: None,
            evaluation: Default::default(),
            status: TenderStatus::Open,
            invitations: Vec::new(),
            bids: totals.iter().map(|t| bid(id, *t)).collect(),
            questions: Vec::new(),
            documents: Vec::new(),
            awarded_bid_id: None,
            awarded_at: None,
            standstill_start_date: None,
            standstill_end_date: None,
            award_letter: None,
            created_at: bson::DateTime::now(),
            updated_at: bson::DateTime::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn standstill_end_is_end_of_day_n_days_out() {
        let award = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        let end = standstill_end(award, 10);
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2026, 3, 12, 23, 59, 59).unwrap()
                + Duration::milliseconds(999)
        );
    }

    #[test]
    fn same_day_award_still_grants_the_full_last_day() {
        // An award one minute before midnight ends on the same calendar
        // day as one made at 00:01.
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 23, 59, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2026, 3, 2, 0, 1, 0).unwrap();
        assert_eq!(standstill_end(late, 10), standstill_end(early, 10));
    }

    #[test]
    fn standstill_is_over_only_at_or_after_the_end() {
        let end = Utc.with_ymd_and_hms(2026, 3, 12, 23, 59, 59).unwrap();
        assert!(!is_standstill_over(
            Some(end),
            end - Duration::milliseconds(1)
        ));
        assert!(is_standstill_over(Some(end), end));
        assert!(is_standstill_over(Some(end), end + Duration::seconds(1)));
    }

    #[test]
    fn absent_end_date_means_unrestricted() {
        assert!(is_standstill_over(None, Utc::now()));
    }

    #[test]
    fn award_marks_winner_and_rejects_siblings() {
        let mut tender = open_tender_with_bids(&[100_000_00, 120_000_00, 150_000_00]);
        let cheapest = tender.bids[0].id;
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();

        let letter = apply_award(&mut tender, cheapest, ObjectId::new(), now, 10).unwrap();

        assert_eq!(tender.status, TenderStatus::Awarded);
        assert_eq!(tender.awarded_bid_id, Some(cheapest));
        assert_eq!(tender.bids[0].status, BidStatus::Awarded);
        assert_eq!(tender.bids[1].status, BidStatus::Rejected);
        assert_eq!(tender.bids[2].status, BidStatus::Rejected);
        assert_eq!(letter.status, AwardLetterStatus::Standstill);
        assert_eq!(letter.price.total_ore, 100_000_00);
        assert_eq!(
            letter.standstill_end.to_chrono(),
            standstill_end(now, 10)
        );
        assert!(tender.award_letter.is_some());
    }

    #[test]
    fn second_award_attempt_is_a_policy_violation() {
        let mut tender = open_tender_with_bids(&[100_000_00, 120_000_00]);
        let first = tender.bids[0].id;
        let second = tender.bids[1].id;
        let now = Utc::now();

        apply_award(&mut tender, first, ObjectId::new(), now, 10).unwrap();
        let err = apply_award(&mut tender, second, ObjectId::new(), now, 10).unwrap_err();
        assert!(matches!(err, ServiceError::Policy(_)));
    }

    #[test]
    fn awarding_an_unknown_bid_is_not_found() {
        let mut tender = open_tender_with_bids(&[100_000_00]);
        let err =
            apply_award(&mut tender, ObjectId::new(), ObjectId::new(), Utc::now(), 10).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("bid")));
    }

    #[test]
    fn draft_tender_cannot_be_awarded() {
        let mut tender = open_tender_with_bids(&[100_000_00]);
        tender.status = TenderStatus::Draft;
        let first = tender.bids[0].id;
        let err = apply_award(&mut tender, first, ObjectId::new(), Utc::now(), 10).unwrap_err();
        assert!(matches!(err, ServiceError::Policy(_)));
    }
}
