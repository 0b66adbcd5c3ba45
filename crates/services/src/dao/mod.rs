pub mod base;
pub mod company;
pub mod contract;
pub mod notification;
pub mod project;
pub mod tender;
pub mod user;

pub use company::CompanyDao;
pub use contract::ContractDao;
pub use notification::NotificationDao;
pub use project::ProjectDao;
pub use tender::TenderDao;
pub use user::UserDao;
