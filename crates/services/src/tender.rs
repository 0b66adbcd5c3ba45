use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::Utc;
use tracing::{info, warn};

use anbud_db::models::{
    DocumentChangeReason, EvaluationModel, Invitation, InvitationStatus, NotificationKind,
    NotificationSource, Question, StandardTerms, Tender, TenderDocument, TenderStatus,
};

use crate::dao::TenderDao;
use crate::dao::base::DaoError;
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{EmailRecipient, NotificationService, templates};
use crate::storage::{BlobStorage, blob_key};

pub struct NewTender {
    pub title: String,
    pub description: String,
    pub terms: StandardTerms,
    pub creator_id: ObjectId,
    pub deadline: bson::DateTime,
    pub question_deadline: Option<bson::DateTime>,
    pub budget_ore: Option<i64>,
    pub evaluation: EvaluationModel,
}

pub struct NewInvitation {
    pub user_id: Option<ObjectId>,
    pub company_id: Option<ObjectId>,
    pub email: Option<String>,
}

pub struct DocumentUpload {
    /// Logical document to overwrite; `None` starts a new one.
    pub doc_id: Option<ObjectId>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq)]
enum UpsertOutcome {
    Added,
    Updated,
}

/// Upsert by supplier identity: user id first, then company id, then
/// case-insensitive email. Updates never clobber history fields
/// (`invited_at`, `status`); they only fill in identifiers that were
/// missing and refresh the contact address.
fn upsert_invitation(
    invitations: &mut Vec<Invitation>,
    new: &NewInvitation,
    now: bson::DateTime,
) -> UpsertOutcome {
    let matches = |inv: &Invitation| {
        if new.user_id.is_some() && inv.user_id == new.user_id {
            return true;
        }
        if new.company_id.is_some() && inv.company_id == new.company_id {
            return true;
        }
        match (&inv.email, &new.email) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    };

    if let Some(existing) = invitations.iter_mut().find(|inv| matches(inv)) {
        if existing.user_id.is_none() {
            existing.user_id = new.user_id;
        }
        if existing.company_id.is_none() {
            existing.company_id = new.company_id;
        }
        if new.email.is_some() {
            existing.email = new.email.clone();
        }
        return UpsertOutcome::Updated;
    }

    invitations.push(Invitation {
        user_id: new.user_id,
        company_id: new.company_id,
        email: new.email.clone(),
        invited_at: now,
        status: InvitationStatus::Invited,
    });
    UpsertOutcome::Added
}

/// Flips the submitting supplier's invitation to `submitted`.
pub(crate) fn mark_invitation_submitted(
    invitations: &mut [Invitation],
    bidder_id: ObjectId,
    company_id: Option<ObjectId>,
) -> bool {
    for inv in invitations.iter_mut() {
        let matched = inv.user_id == Some(bidder_id)
            || (company_id.is_some() && inv.company_id == company_id);
        if matched && inv.status != InvitationStatus::Submitted {
            inv.status = InvitationStatus::Submitted;
            return true;
        }
    }
    false
}

/// Picks the logical id, version and change reason for an upload.
fn next_document_version(
    documents: &[TenderDocument],
    doc_id: Option<ObjectId>,
) -> (ObjectId, u32, DocumentChangeReason) {
    match doc_id {
        Some(id) => {
            let latest = documents
                .iter()
                .filter(|d| d.doc_id == id)
                .map(|d| d.version)
                .max();
            match latest {
                Some(version) => (id, version + 1, DocumentChangeReason::Updated),
                None => (id, 1, DocumentChangeReason::Created),
            }
        }
        None => (ObjectId::new(), 1, DocumentChangeReason::Created),
    }
}

pub struct TenderService {
    tenders: Arc<TenderDao>,
    notify: Arc<NotificationService>,
    storage: Arc<dyn BlobStorage>,
    public_url: String,
}

impl TenderService {
    pub fn new(
        tenders: Arc<TenderDao>,
        notify: Arc<NotificationService>,
        storage: Arc<dyn BlobStorage>,
        public_url: String,
    ) -> Self {
        Self {
            tenders,
            notify,
            storage,
            public_url,
        }
    }

    fn tender_link(&self, tender_id: ObjectId) -> String {
        format!("{}/tenders/{}", self.public_url, tender_id.to_hex())
    }

    pub async fn create(&self, new: NewTender) -> ServiceResult<Tender> {
        if new.title.trim().is_empty() {
            return Err(ServiceError::Validation("title is required".to_string()));
        }
        if new.description.trim().is_empty() {
            return Err(ServiceError::Validation(
                "description is required".to_string(),
            ));
        }
        if new.deadline.to_chrono() <= Utc::now() {
            return Err(ServiceError::Validation(
                "deadline must be in the future".to_string(),
            ));
        }

        let now = bson::DateTime::now();
        let tender = Tender {
            id: None,
            title: new.title,
            description: new.description,
            terms: new.terms,
            creator_id: new.creator_id,
            deadline: new.deadline,
            publish_date: None,
            question_deadline: new.question_deadline,
            budget_ore: new.budget_ore,
            evaluation: new.evaluation,
            status: TenderStatus::Draft,
            invitations: Vec::new(),
            bids: Vec::new(),
            questions: Vec::new(),
            documents: Vec::new(),
            awarded_bid_id: None,
            awarded_at: None,
            standstill_start_date: None,
            standstill_end_date: None,
            award_letter: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        Ok(self.tenders.create(&tender).await?)
    }

    pub async fn get(&self, tender_id: ObjectId) -> ServiceResult<Tender> {
        self.tenders.find_by_id(tender_id).await.map_err(|e| match e {
            DaoError::NotFound => ServiceError::NotFound("tender"),
            other => other.into(),
        })
    }

    pub async fn list_by_creator(&self, creator_id: ObjectId) -> ServiceResult<Vec<Tender>> {
        Ok(self.tenders.find_by_creator(creator_id).await?)
    }

    /// `draft → open`. Fires the invitation fan-out to every invited
    /// supplier with an address; publishing an already-open tender is a
    /// no-op.
    pub async fn publish(&self, tender_id: ObjectId) -> ServiceResult<Tender> {
        let tender = self.get(tender_id).await?;

        match tender.status {
            TenderStatus::Draft => {}
            TenderStatus::Open => return Ok(tender),
            _ => {
                return Err(ServiceError::Policy(
                    "only a draft tender can be published".to_string(),
                ));
            }
        }

        self.tenders
            .publish(tender_id, bson::DateTime::now())
            .await?;
        info!(tender_id = %tender_id.to_hex(), "Tender published");

        let tender = self.get(tender_id).await?;
        self.fan_out_invitations(&tender, &tender.invitations).await;
        Ok(tender)
    }

    async fn fan_out_invitations(&self, tender: &Tender, invitations: &[Invitation]) {
        let source = NotificationSource {
            entity_type: "tender".to_string(),
            entity_id: tender.id.unwrap_or_else(ObjectId::new),
            actor_id: Some(tender.creator_id),
        };

        for inv in invitations {
            let Some(user_id) = inv.user_id else { continue };
            if let Err(err) = self
                .notify
                .notify_in_app(
                    user_id,
                    NotificationKind::TenderInvitation,
                    format!("Invitation to bid on \"{}\"", tender.title),
                    format!("Bid deadline: {}.", templates::format_date(tender.deadline)),
                    Some(self.tender_link(tender.id.unwrap_or_else(ObjectId::new))),
                    source.clone(),
                )
                .await
            {
                warn!(%err, "Invitation in-app notification failed");
            }
        }

        let recipients: Vec<EmailRecipient> = invitations
            .iter()
            .filter(|inv| inv.email.is_some())
            .map(|inv| EmailRecipient {
                user_id: inv.user_id,
                email: inv.email.clone(),
            })
            .collect();

        if recipients.is_empty() {
            return;
        }

        let link = self.tender_link(tender.id.unwrap_or_else(ObjectId::new));
        let report = self
            .notify
            .send_batch(NotificationKind::TenderInvitation, &recipients, |_| {
                templates::invitation(&tender.title, tender.deadline, &link)
            })
            .await;
        info!(
            delivered = report.delivered,
            skipped = report.skipped,
            suppressed = report.suppressed,
            failed = report.failures.len(),
            "Invitation fan-out finished"
        );
    }

    /// Upserts a supplier invitation. Only a genuinely new entry fires
    /// the invitation notification, and only once the tender is
    /// published — invitations added while drafting are covered by the
    /// publish fan-out.
    pub async fn invite_supplier(
        &self,
        tender_id: ObjectId,
        new: NewInvitation,
    ) -> ServiceResult<Tender> {
        if new.user_id.is_none() && new.company_id.is_none() && new.email.is_none() {
            return Err(ServiceError::Validation(
                "invitation needs a supplier id or an email address".to_string(),
            ));
        }

        let mut tender = self.get(tender_id).await?;
        if tender.status == TenderStatus::Awarded {
            return Err(ServiceError::Policy(
                "an awarded tender cannot take new invitations".to_string(),
            ));
        }

        let outcome = upsert_invitation(&mut tender.invitations, &new, bson::DateTime::now());
        self.tenders
            .set_invitations(tender_id, &tender.invitations)
            .await?;

        if outcome == UpsertOutcome::Added && tender.status == TenderStatus::Open {
            if let Some(added) = tender.invitations.last() {
                self.fan_out_invitations(&tender, std::slice::from_ref(added))
                    .await;
            }
        }

        Ok(tender)
    }

    pub async fn mark_invitation_viewed(
        &self,
        tender_id: ObjectId,
        user_id: ObjectId,
    ) -> ServiceResult<()> {
        let mut tender = self.get(tender_id).await?;
        let mut changed = false;
        for inv in tender.invitations.iter_mut() {
            if inv.user_id == Some(user_id) && inv.status == InvitationStatus::Invited {
                inv.status = InvitationStatus::Viewed;
                changed = true;
            }
        }
        if changed {
            self.tenders
                .set_invitations(tender_id, &tender.invitations)
                .await?;
        }
        Ok(())
    }

    pub async fn ask_question(
        &self,
        tender_id: ObjectId,
        asker_id: ObjectId,
        text: String,
    ) -> ServiceResult<Question> {
        if text.trim().is_empty() {
            return Err(ServiceError::Validation("question is empty".to_string()));
        }

        let mut tender = self.get(tender_id).await?;
        if tender.status == TenderStatus::Draft {
            return Err(ServiceError::Policy(
                "questions require a published tender".to_string(),
            ));
        }
        if let Some(deadline) = tender.question_deadline {
            if deadline.to_chrono() < Utc::now() {
                return Err(ServiceError::Policy(
                    "the question deadline has passed".to_string(),
                ));
            }
        }

        let question = Question {
            id: ObjectId::new(),
            asker_id,
            text,
            asked_at: bson::DateTime::now(),
            answer: None,
            answered_by: None,
            answered_at: None,
        };
        tender.questions.push(question.clone());
        self.tenders
            .set_questions(tender_id, &tender.questions)
            .await?;
        Ok(question)
    }

    /// Records the answer and notifies the asker (best-effort).
    pub async fn answer_question(
        &self,
        tender_id: ObjectId,
        question_id: ObjectId,
        answerer_id: ObjectId,
        answer: String,
    ) -> ServiceResult<Question> {
        if answer.trim().is_empty() {
            return Err(ServiceError::Validation("answer is empty".to_string()));
        }

        let mut tender = self.get(tender_id).await?;
        if tender.status == TenderStatus::Draft {
            return Err(ServiceError::Policy(
                "questions require a published tender".to_string(),
            ));
        }

        let question = tender
            .questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or(ServiceError::NotFound("question"))?;

        question.answer = Some(answer.clone());
        question.answered_by = Some(answerer_id);
        question.answered_at = Some(bson::DateTime::now());
        let question = question.clone();

        self.tenders
            .set_questions(tender_id, &tender.questions)
            .await?;

        let source = NotificationSource {
            entity_type: "tender".to_string(),
            entity_id: tender_id,
            actor_id: Some(answerer_id),
        };
        if let Err(err) = self
            .notify
            .notify_in_app(
                question.asker_id,
                NotificationKind::QuestionAnswered,
                format!("Your question on \"{}\" was answered", tender.title),
                answer.clone(),
                Some(self.tender_link(tender_id)),
                source,
            )
            .await
        {
            warn!(%err, "Question-answered in-app notification failed");
        }
        let (subject, html) = templates::question_answered(&tender.title, &question.text, &answer);
        if let Err(err) = self
            .notify
            .email_user(
                question.asker_id,
                NotificationKind::QuestionAnswered,
                &subject,
                &html,
            )
            .await
        {
            warn!(%err, "Question-answered email failed");
        }

        Ok(question)
    }

    /// Stores the blob, then appends a version record: `created` for a
    /// new logical document, `updated` for an overwrite.
    pub async fn add_document(
        &self,
        tender_id: ObjectId,
        uploader_id: ObjectId,
        upload: DocumentUpload,
    ) -> ServiceResult<TenderDocument> {
        if upload.file_name.trim().is_empty() {
            return Err(ServiceError::Validation("file name is required".to_string()));
        }

        let tender = self.get(tender_id).await?;
        let (doc_id, version, reason) = next_document_version(&tender.documents, upload.doc_id);

        let storage_key = blob_key(&format!("tenders/{}", tender_id.to_hex()));
        self.storage
            .put(&storage_key, &upload.bytes)
            .await
            .map_err(|e| ServiceError::Dependency(e.to_string()))?;

        let record = TenderDocument {
            doc_id,
            file_name: upload.file_name,
            storage_key: storage_key.clone(),
            url: format!("{}/files/{}", self.public_url, storage_key),
            content_type: upload.content_type,
            size: upload.bytes.len() as u64,
            version,
            reason,
            uploaded_by: uploader_id,
            uploaded_at: bson::DateTime::now(),
        };
        self.tenders.push_document(tender_id, &record).await?;
        Ok(record)
    }

    /// Removes every version of a logical document. Blob deletion is
    /// best-effort: storage failure never fails the domain operation.
    pub async fn remove_document(
        &self,
        tender_id: ObjectId,
        doc_id: ObjectId,
    ) -> ServiceResult<usize> {
        let tender = self.get(tender_id).await?;
        let versions: Vec<TenderDocument> = tender
            .documents
            .iter()
            .filter(|d| d.doc_id == doc_id)
            .cloned()
            .collect();
        if versions.is_empty() {
            return Err(ServiceError::NotFound("document"));
        }

        self.tenders.pull_document(tender_id, doc_id).await?;

        for record in &versions {
            if let Err(err) = self.storage.delete(&record.storage_key).await {
                warn!(key = %record.storage_key, %err, "Blob delete failed, leaving orphan");
            }
        }

        Ok(versions.len())
    }

    /// Manual close. Closing an already-closed tender is a no-op.
    pub async fn close(&self, tender_id: ObjectId) -> ServiceResult<Tender> {
        let tender = self.get(tender_id).await?;
        match tender.status {
            TenderStatus::Closed => Ok(tender),
            TenderStatus::Open => {
                self.tenders
                    .set_status(tender_id, TenderStatus::Closed)
                    .await?;
                self.get(tender_id).await
            }
            _ => Err(ServiceError::Policy(
                "only an open tender can be closed".to_string(),
            )),
        }
    }

    pub async fn reopen(&self, tender_id: ObjectId) -> ServiceResult<Tender> {
        let tender = self.get(tender_id).await?;
        match tender.status {
            TenderStatus::Open => Ok(tender),
            TenderStatus::Closed => {
                self.tenders
                    .set_status(tender_id, TenderStatus::Open)
                    .await?;
                self.get(tender_id).await
            }
            _ => Err(ServiceError::Policy(
                "only a closed tender can be reopened".to_string(),
            )),
        }
    }

    /// Pull-based auto-close: closes every open tender whose deadline
    /// has passed. Safe to run repeatedly or from several invokers.
    pub async fn sweep_expired(&self) -> ServiceResult<usize> {
        let expired = self
            .tenders
            .find_open_expired(bson::DateTime::now())
            .await?;
        let mut closed = 0;
        for tender in &expired {
            let Some(id) = tender.id else { continue };
            match self.tenders.set_status(id, TenderStatus::Closed).await {
                Ok(_) => closed += 1,
                Err(err) => warn!(tender_id = %id.to_hex(), %err, "Auto-close failed"),
            }
        }
        if closed > 0 {
            info!(closed, "Auto-closed expired tenders");
        }
        Ok(closed)
    }
}
