use std::sync::Arc;

use mongodb::Database;

use anbud_config::Settings;
use anbud_services::{
    AwardService, BidService, ContractService, NotificationService, ReminderService,
    TenderService,
    dao::{CompanyDao, ContractDao, NotificationDao, ProjectDao, TenderDao, UserDao},
    notify::mailer_from_settings,
    storage::FsStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub users: Arc<UserDao>,
    pub companies: Arc<CompanyDao>,
    pub projects: Arc<ProjectDao>,
    pub notifications: Arc<NotificationDao>,
    pub notify: Arc<NotificationService>,
    pub tenders: Arc<TenderService>,
    pub bids: Arc<BidService>,
    pub awards: Arc<AwardService>,
    pub contracts: Arc<ContractService>,
    pub reminders: Arc<ReminderService>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> anyhow::Result<Self> {
        let users = Arc::new(UserDao::new(&db));
        let companies = Arc::new(CompanyDao::new(&db));
        let projects = Arc::new(ProjectDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db));
        let tender_dao = Arc::new(TenderDao::new(&db));
        let contract_dao = Arc::new(ContractDao::new(&db));

        let mailer = mailer_from_settings(&settings.smtp)?;
        let storage = Arc::new(FsStorage::new(settings.storage.upload_dir.clone()));
        let notify = Arc::new(NotificationService::new(
            Arc::clone(&users),
            Arc::clone(&notifications),
            mailer,
        ));

        let public_url = settings.app.public_url.clone();
        let tenders = Arc::new(TenderService::new(
            Arc::clone(&tender_dao),
            Arc::clone(&notify),
            storage.clone(),
            public_url.clone(),
        ));
        let bids = Arc::new(BidService::new(
            Arc::clone(&tender_dao),
            Arc::clone(&users),
            Arc::clone(&notify),
            storage,
            public_url.clone(),
        ));
        let awards = Arc::new(AwardService::new(
            Arc::clone(&tender_dao),
            Arc::clone(&notify),
            settings.procurement.standstill_period_days,
        ));
        let contracts = Arc::new(ContractService::new(
            Arc::clone(&contract_dao),
            Arc::clone(&tender_dao),
            Arc::clone(&users),
            Arc::clone(&companies),
            Arc::clone(&projects),
            Arc::clone(&notify),
            public_url,
        ));
        let reminders = Arc::new(ReminderService::new(
            tender_dao,
            Arc::clone(&notify),
            settings.procurement.reminder_offsets_days.clone(),
        ));

        Ok(Self {
            db,
            settings,
            users,
            companies,
            projects,
            notifications,
            notify,
            tenders,
            bids,
            awards,
            contracts,
            reminders,
        })
    }
}
