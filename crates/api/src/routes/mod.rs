pub mod admin;
pub mod bid;
pub mod contract;
pub mod notification;
pub mod tender;
pub mod user;

use bson::oid::ObjectId;

use crate::error::ApiError;

pub(crate) fn parse_oid(value: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid {what}")))
}

pub(crate) fn rfc3339(date: bson::DateTime) -> String {
    date.try_to_rfc3339_string().unwrap_or_default()
}
