use bson::{doc, oid::ObjectId};
use mongodb::Database;

use anbud_db::models::{
    AwardLetterStatus, Bid, Invitation, Question, Tender, TenderDocument, TenderStatus,
};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct TenderDao {
    pub base: BaseDao<Tender>,
}

impl TenderDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Tender::COLLECTION),
        }
    }

    pub async fn create(&self, tender: &Tender) -> DaoResult<Tender> {
        let id = self.base.insert_one(tender).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<Tender> {
        self.base.find_by_id(id).await
    }

    pub async fn find_by_creator(&self, creator_id: ObjectId) -> DaoResult<Vec<Tender>> {
        self.base
            .find_many(
                doc! { "creator_id": creator_id, "deleted_at": null },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }

    pub async fn find_open(&self) -> DaoResult<Vec<Tender>> {
        self.base
            .find_many(doc! { "status": "open", "deleted_at": null }, None)
            .await
    }

    /// Open tenders whose deadline has passed, candidates for auto-close.
    pub async fn find_open_expired(&self, now: bson::DateTime) -> DaoResult<Vec<Tender>> {
        self.base
            .find_many(
                doc! { "status": "open", "deadline": { "$lt": now }, "deleted_at": null },
                None,
            )
            .await
    }

    pub async fn set_status(&self, id: ObjectId, status: TenderStatus) -> DaoResult<bool> {
        let status = bson::to_bson(&status)?;
        self.base
            .update_by_id(id, doc! { "$set": { "status": status } })
            .await
    }

    pub async fn publish(&self, id: ObjectId, publish_date: bson::DateTime) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": id, "status": "draft" },
                doc! { "$set": { "status": "open", "publish_date": publish_date } },
            )
            .await
    }

    pub async fn set_invitations(
        &self,
        id: ObjectId,
        invitations: &[Invitation],
    ) -> DaoResult<bool> {
        let invitations = bson::to_bson(invitations)?;
        self.base
            .update_by_id(id, doc! { "$set": { "invitations": invitations } })
            .await
    }

    pub async fn set_questions(&self, id: ObjectId, questions: &[Question]) -> DaoResult<bool> {
        let questions = bson::to_bson(questions)?;
        self.base
            .update_by_id(id, doc! { "$set": { "questions": questions } })
            .await
    }

    /// Appends a bid and refreshes the invitation list in one write, so
    /// the submitted-flag flip cannot land without the bid.
    pub async fn append_bid(
        &self,
        id: ObjectId,
        bid: &Bid,
        invitations: &[Invitation],
    ) -> DaoResult<bool> {
        let bid = bson::to_bson(bid)?;
        let invitations = bson::to_bson(invitations)?;
        self.base
            .update_by_id(
                id,
                doc! {
                    "$push": { "bids": bid },
                    "$set": { "invitations": invitations },
                },
            )
            .await
    }

    pub async fn push_document(&self, id: ObjectId, document: &TenderDocument) -> DaoResult<bool> {
        let document = bson::to_bson(document)?;
        self.base
            .update_by_id(id, doc! { "$push": { "documents": document } })
            .await
    }

    /// Drops every version record of one logical document.
    pub async fn pull_document(&self, id: ObjectId, doc_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(id, doc! { "$pull": { "documents": { "doc_id": doc_id } } })
            .await
    }

    pub async fn set_award_letter_status(
        &self,
        id: ObjectId,
        status: AwardLetterStatus,
    ) -> DaoResult<bool> {
        let status = bson::to_bson(&status)?;
        self.base
            .update_one(
                doc! { "_id": id, "award_letter": { "$ne": null } },
                doc! { "$set": { "award_letter.status": status } },
            )
            .await
    }

    /// Persists an award as one conditional write: the tender must still
    /// be awardable (open or closed, no winner recorded). A concurrent
    /// award that lost the race matches nothing and surfaces as a
    /// duplicate-award error for the caller to map.
    pub async fn commit_award(&self, tender: &Tender) -> DaoResult<()> {
        let id = tender.id.ok_or(DaoError::NotFound)?;
        let bids = bson::to_bson(&tender.bids)?;
        let award_letter = bson::to_bson(&tender.award_letter)?;

        let modified = self
            .base
            .update_one(
                doc! {
                    "_id": id,
                    "status": { "$in": ["open", "closed"] },
                    "awarded_bid_id": null,
                },
                doc! {
                    "$set": {
                        "status": "awarded",
                        "awarded_bid_id": tender.awarded_bid_id,
                        "awarded_at": tender.awarded_at,
                        "standstill_start_date": tender.standstill_start_date,
                        "standstill_end_date": tender.standstill_end_date,
                        "award_letter": award_letter,
                        "bids": bids,
                    }
                },
            )
            .await?;

        if !modified {
            return Err(DaoError::Validation(
                "tender is no longer awardable".to_string(),
            ));
        }
        Ok(())
    }
}
