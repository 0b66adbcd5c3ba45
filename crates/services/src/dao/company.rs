use bson::oid::ObjectId;
use mongodb::Database;

use anbud_db::models::Company;

use super::base::{BaseDao, DaoResult};

pub struct CompanyDao {
    pub base: BaseDao<Company>,
}

impl CompanyDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Company::COLLECTION),
        }
    }

    pub async fn create(&self, company: &Company) -> DaoResult<Company> {
        let id = self.base.insert_one(company).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<Company> {
        self.base.find_by_id(id).await
    }
}
