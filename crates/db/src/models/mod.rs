pub mod bid;
pub mod company;
pub mod contract;
pub mod notification;
pub mod project;
pub mod tender;
pub mod user;

pub use bid::{Bid, BidDocument, BidStatus, HourlyRate, PriceStructure, PriceTerms};
pub use company::Company;
pub use contract::{Contract, ContractChange, ContractStatus, PartySnapshot};
pub use notification::{Notification, NotificationKind, NotificationSource};
pub use project::Project;
pub use tender::{
    AwardLetter, AwardLetterStatus, ContractStandard, DocumentChangeReason, EvaluationModel,
    Invitation, InvitationStatus, Ns8405Terms, Ns8406Terms, Ns8407Terms, Question, StandardTerms,
    Tender, TenderDocument, TenderStatus,
};
pub use user::{NotificationPrefs, User};
