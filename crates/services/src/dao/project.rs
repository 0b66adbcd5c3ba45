use bson::oid::ObjectId;
use mongodb::Database;

use anbud_db::models::Project;

use super::base::{BaseDao, DaoResult};

pub struct ProjectDao {
    pub base: BaseDao<Project>,
}

impl ProjectDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Project::COLLECTION),
        }
    }

    pub async fn create(&self, project: &Project) -> DaoResult<Project> {
        let id = self.base.insert_one(project).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<Project> {
        self.base.find_by_id(id).await
    }
}
