use bson::{doc, oid::ObjectId};
use mongodb::Database;

use anbud_db::models::{NotificationPrefs, User};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(&self, user: &User) -> DaoResult<User> {
        let id = self.base.insert_one(user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> DaoResult<User> {
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email.to_lowercase(), "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    /// Resolves a user's email address, for senders that only know ids.
    pub async fn email_of(&self, id: ObjectId) -> DaoResult<Option<String>> {
        let user = self.base.find_one(doc! { "_id": id }).await?;
        Ok(user.map(|u| u.email))
    }

    pub async fn update_preferences(
        &self,
        id: ObjectId,
        prefs: &NotificationPrefs,
    ) -> DaoResult<bool> {
        let prefs = bson::to_bson(prefs)?;
        self.base
            .update_by_id(id, doc! { "$set": { "notification_preferences": prefs } })
            .await
    }
}
