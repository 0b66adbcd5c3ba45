use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub customer_company_id: Option<ObjectId>,
    pub address: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Project {
    pub const COLLECTION: &'static str = "projects";
}
