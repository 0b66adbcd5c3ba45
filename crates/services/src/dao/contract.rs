use bson::{doc, oid::ObjectId};
use mongodb::Database;

use anbud_db::models::{Contract, ContractChange, ContractStatus};

use super::base::{BaseDao, DaoResult};

pub struct ContractDao {
    pub base: BaseDao<Contract>,
}

impl ContractDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Contract::COLLECTION),
        }
    }

    pub async fn create(&self, contract: &Contract) -> DaoResult<Contract> {
        let id = self.base.insert_one(contract).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<Contract> {
        self.base.find_by_id(id).await
    }

    pub async fn find_by_tender(&self, tender_id: ObjectId) -> DaoResult<Option<Contract>> {
        self.base
            .find_one(doc! { "tender_id": tender_id, "deleted_at": null })
            .await
    }

    pub async fn set_status(&self, id: ObjectId, status: ContractStatus) -> DaoResult<bool> {
        let status = bson::to_bson(&status)?;
        self.base
            .update_by_id(id, doc! { "$set": { "status": status } })
            .await
    }

    pub async fn sign(
        &self,
        id: ObjectId,
        signed_by: ObjectId,
        signed_at: bson::DateTime,
    ) -> DaoResult<bool> {
        self.base
            .update_by_id(
                id,
                doc! {
                    "$set": {
                        "status": "signed",
                        "signed_at": signed_at,
                        "signed_by": signed_by,
                    }
                },
            )
            .await
    }

    /// Appends one change record and bumps the version in the same write.
    pub async fn append_change(&self, id: ObjectId, change: &ContractChange) -> DaoResult<bool> {
        let change_bson = bson::to_bson(change)?;
        self.base
            .update_by_id(
                id,
                doc! {
                    "$push": { "changes": change_bson },
                    "$set": {
                        "version": change.version as i64,
                        "status": "amended",
                    }
                },
            )
            .await
    }
}
