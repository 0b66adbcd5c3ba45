pub mod award;
pub mod bid;
pub mod contract;
pub mod dao;
pub mod error;
pub mod notify;
pub mod reminders;
pub mod storage;
pub mod tender;

pub use award::AwardService;
pub use bid::BidService;
pub use contract::ContractService;
pub use dao::*;
pub use error::{ServiceError, ServiceResult};
pub use notify::NotificationService;
pub use reminders::ReminderService;
pub use tender::TenderService;
