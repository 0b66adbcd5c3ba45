use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::{info, warn};

use anbud_db::models::{
    Bid, BidDocument, BidStatus, NotificationKind, NotificationSource, PriceTerms, TenderStatus,
};

use crate::dao::base::DaoError;
use crate::dao::{TenderDao, UserDao};
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{NotificationService, templates};
use crate::storage::{BlobStorage, blob_key};
use crate::tender::mark_invitation_submitted;

pub struct NewBid {
    pub bidder_id: ObjectId,
    pub company_id: Option<ObjectId>,
    pub price: PriceTerms,
    pub attachments: Vec<BidAttachment>,
}

pub struct BidAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct BidService {
    tenders: Arc<TenderDao>,
    users: Arc<UserDao>,
    notify: Arc<NotificationService>,
    storage: Arc<dyn BlobStorage>,
    public_url: String,
}

impl BidService {
    pub fn new(
        tenders: Arc<TenderDao>,
        users: Arc<UserDao>,
        notify: Arc<NotificationService>,
        storage: Arc<dyn BlobStorage>,
        public_url: String,
    ) -> Self {
        Self {
            tenders,
            users,
            notify,
            storage,
            public_url,
        }
    }

    /// Appends a bid to an open tender. Attachments are uploaded before
    /// anything is written to the tender; the creator notification runs
    /// after persistence and never fails the submission.
    pub async fn submit_bid(&self, tender_id: ObjectId, new: NewBid) -> ServiceResult<Bid> {
        if new.price.total_ore <= 0 {
            return Err(ServiceError::Validation(
                "bid total must be positive".to_string(),
            ));
        }

        let mut tender = self
            .tenders
            .find_by_id(tender_id)
            .await
            .map_err(|e| match e {
                DaoError::NotFound => ServiceError::NotFound("tender"),
                other => other.into(),
            })?;

        if tender.status != TenderStatus::Open {
            return Err(ServiceError::Policy(
                "tender is not open for bids".to_string(),
            ));
        }

        let mut documents = Vec::with_capacity(new.attachments.len());
        for attachment in &new.attachments {
            let storage_key = blob_key(&format!("bids/{}", tender_id.to_hex()));
            self.storage
                .put(&storage_key, &attachment.bytes)
                .await
                .map_err(|e| ServiceError::Dependency(e.to_string()))?;
            documents.push(BidDocument {
                file_name: attachment.file_name.clone(),
                storage_key: storage_key.clone(),
                url: format!("{}/files/{}", self.public_url, storage_key),
                content_type: attachment.content_type.clone(),
                size: attachment.bytes.len() as u64,
                uploaded_at: bson::DateTime::now(),
            });
        }

        let bid = Bid {
            id: ObjectId::new(),
            tender_id,
            bidder_id: new.bidder_id,
            company_id: new.company_id,
            submitted_at: bson::DateTime::now(),
            price: new.price,
            documents,
            status: BidStatus::Submitted,
            score: None,
        };

        mark_invitation_submitted(&mut tender.invitations, new.bidder_id, new.company_id);
        self.tenders
            .append_bid(tender_id, &bid, &tender.invitations)
            .await?;

        info!(
            tender_id = %tender_id.to_hex(),
            bid_id = %bid.id.to_hex(),
            total_ore = bid.price.total_ore,
            "Bid submitted"
        );

        self.notify_creator(&tender.title, tender.creator_id, &bid).await;

        Ok(bid)
    }

    async fn notify_creator(&self, tender_title: &str, creator_id: ObjectId, bid: &Bid) {
        let bidder_name = match self.users.find_by_id(bid.bidder_id).await {
            Ok(user) => user.name,
            Err(_) => "A supplier".to_string(),
        };

        let source = NotificationSource {
            entity_type: "tender".to_string(),
            entity_id: bid.tender_id,
            actor_id: Some(bid.bidder_id),
        };
        if let Err(err) = self
            .notify
            .notify_in_app(
                creator_id,
                NotificationKind::BidSubmitted,
                format!("New bid on \"{tender_title}\""),
                format!(
                    "{bidder_name} submitted a bid of {}.",
                    templates::format_nok(bid.price.total_ore)
                ),
                None,
                source,
            )
            .await
        {
            warn!(%err, "Bid-submitted in-app notification failed");
        }

        let (subject, html) =
            templates::bid_submitted(tender_title, &bidder_name, bid.price.total_ore);
        if let Err(err) = self
            .notify
            .email_user(creator_id, NotificationKind::BidSubmitted, &subject, &html)
            .await
        {
            warn!(%err, "Bid-submitted email failed");
        }
    }
}
