use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::Utc;
use tracing::{info, warn};

use anbud_db::models::{
    AwardLetterStatus, Company, Contract, ContractChange, ContractStatus, NotificationKind,
    NotificationSource, PartySnapshot, Tender, User,
};

use crate::award::is_standstill_over;
use crate::dao::base::DaoError;
use crate::dao::{CompanyDao, ContractDao, ProjectDao, TenderDao, UserDao};
use crate::error::{ServiceError, ServiceResult};
use crate::notify::{EmailRecipient, NotificationService, templates};

pub struct NewContractChange {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub reason: String,
}

fn company_snapshot(company: &Company) -> PartySnapshot {
    PartySnapshot {
        company_id: company.id,
        name: company.name.clone(),
        org_number: company.org_number.clone(),
        contact_email: company.contact_email.clone(),
    }
}

fn user_snapshot(user: &User) -> PartySnapshot {
    PartySnapshot {
        company_id: user.company_id,
        name: user.name.clone(),
        org_number: None,
        contact_email: Some(user.email.clone()),
    }
}

/// Builds the next change record: version is always current + 1, no
/// matter how many changes came before.
fn build_change(
    current_version: u32,
    new: NewContractChange,
    changed_by: ObjectId,
    changed_at: bson::DateTime,
) -> ContractChange {
    ContractChange {
        field: new.field,
        old_value: new.old_value,
        new_value: new.new_value,
        reason: new.reason,
        changed_by,
        changed_at,
        version: current_version + 1,
    }
}

fn standstill_gate(tender: &Tender) -> ServiceResult<()> {
    let end = tender.standstill_end_date.map(|d| d.to_chrono());
    if !is_standstill_over(end, Utc::now()) {
        return Err(ServiceError::Policy(
            "the standstill period has not ended".to_string(),
        ));
    }
    Ok(())
}

pub struct ContractService {
    contracts: Arc<ContractDao>,
    tenders: Arc<TenderDao>,
    users: Arc<UserDao>,
    companies: Arc<CompanyDao>,
    projects: Arc<ProjectDao>,
    notify: Arc<NotificationService>,
    public_url: String,
}

impl ContractService {
    pub fn new(
        contracts: Arc<ContractDao>,
        tenders: Arc<TenderDao>,
        users: Arc<UserDao>,
        companies: Arc<CompanyDao>,
        projects: Arc<ProjectDao>,
        notify: Arc<NotificationService>,
        public_url: String,
    ) -> Self {
        Self {
            contracts,
            tenders,
            users,
            companies,
            projects,
            notify,
            public_url,
        }
    }

    pub async fn get(&self, contract_id: ObjectId) -> ServiceResult<Contract> {
        self.contracts
            .find_by_id(contract_id)
            .await
            .map_err(|e| match e {
                DaoError::NotFound => ServiceError::NotFound("contract"),
                other => other.into(),
            })
    }

    /// Creates the draft contract once the standstill period is over.
    /// The gate runs before any write; the signing-request notification
    /// afterwards is best-effort.
    pub async fn generate_contract(
        &self,
        tender_id: ObjectId,
        bid_id: ObjectId,
        project_id: ObjectId,
    ) -> ServiceResult<Contract> {
        let tender = self
            .tenders
            .find_by_id(tender_id)
            .await
            .map_err(|e| match e {
                DaoError::NotFound => ServiceError::NotFound("tender"),
                other => other.into(),
            })?;

        standstill_gate(&tender)?;

        let bid = tender
            .bids
            .iter()
            .find(|b| b.id == bid_id)
            .ok_or(ServiceError::NotFound("bid"))?;

        if self.contracts.find_by_tender(tender_id).await?.is_some() {
            return Err(ServiceError::Policy(
                "a contract already exists for this tender".to_string(),
            ));
        }

        let project = self
            .projects
            .find_by_id(project_id)
            .await
            .map_err(|e| match e {
                DaoError::NotFound => ServiceError::NotFound("project"),
                other => other.into(),
            })?;

        let customer = self.resolve_customer(&tender).await?;
        let supplier = self.resolve_supplier(bid.company_id, bid.bidder_id).await?;

        let now = bson::DateTime::now();
        let contract = Contract {
            id: None,
            tender_id,
            bid_id,
            project_id: project.id.ok_or(ServiceError::NotFound("project"))?,
            status: ContractStatus::Draft,
            customer,
            supplier,
            standard: tender.standard(),
            price: bid.price.clone(),
            version: 1,
            changes: Vec::new(),
            signed_at: None,
            signed_by: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let mut contract = self.contracts.create(&contract).await?;
        info!(
            tender_id = %tender_id.to_hex(),
            contract_id = ?contract.id.map(|i| i.to_hex()),
            "Contract generated"
        );

        if let Err(err) = self
            .tenders
            .set_award_letter_status(tender_id, AwardLetterStatus::ReadyForSigning)
            .await
        {
            warn!(%err, "Award letter status update failed");
        }

        if self
            .request_signature(&tender, &contract, bid.bidder_id)
            .await
        {
            if let Some(id) = contract.id {
                match self
                    .contracts
                    .set_status(id, ContractStatus::PendingSignature)
                    .await
                {
                    Ok(_) => contract.status = ContractStatus::PendingSignature,
                    Err(err) => warn!(%err, "Contract status update failed"),
                }
            }
        }

        Ok(contract)
    }

    /// Signing-request notification to the supplier. Returns whether the
    /// email was dispatched; failures are logged and swallowed.
    async fn request_signature(
        &self,
        tender: &Tender,
        contract: &Contract,
        supplier_user_id: ObjectId,
    ) -> bool {
        let contract_id = contract.id.unwrap_or_else(ObjectId::new);
        let link = format!("{}/contracts/{}", self.public_url, contract_id.to_hex());
        let source = NotificationSource {
            entity_type: "contract".to_string(),
            entity_id: contract_id,
            actor_id: Some(tender.creator_id),
        };

        if let Err(err) = self
            .notify
            .notify_in_app(
                supplier_user_id,
                NotificationKind::ContractSigningRequested,
                format!("Contract ready for signing: {}", tender.title),
                "The contract has been generated and awaits your signature.".to_string(),
                Some(link.clone()),
                source,
            )
            .await
        {
            warn!(%err, "Signing-request in-app notification failed");
        }

        let (subject, html) = templates::signing_requested(&tender.title, &link);
        match self
            .notify
            .email_user(
                supplier_user_id,
                NotificationKind::ContractSigningRequested,
                &subject,
                &html,
            )
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "Signing-request email failed");
                false
            }
        }
    }

    /// Signs the contract. The standstill gate is re-checked against the
    /// owning tender's current end date, in case the contract was
    /// generated under an older window.
    pub async fn sign_contract(
        &self,
        contract_id: ObjectId,
        signer_id: ObjectId,
    ) -> ServiceResult<Contract> {
        let contract = self.get(contract_id).await?;

        if contract.status == ContractStatus::Signed {
            return Err(ServiceError::Policy(
                "contract is already signed".to_string(),
            ));
        }

        let tender = match self.tenders.find_by_id(contract.tender_id).await {
            Ok(tender) => {
                standstill_gate(&tender)?;
                Some(tender)
            }
            // A contract whose tender is gone is not standstill-bound.
            Err(DaoError::NotFound) => None,
            Err(other) => return Err(other.into()),
        };

        self.contracts
            .sign(contract_id, signer_id, bson::DateTime::now())
            .await?;
        info!(contract_id = %contract_id.to_hex(), signer = %signer_id.to_hex(), "Contract signed");

        if let Err(err) = self
            .tenders
            .set_award_letter_status(contract.tender_id, AwardLetterStatus::Signed)
            .await
        {
            warn!(%err, "Award letter status update failed");
        }
        self.notify_signed(&contract, tender.as_ref(), signer_id).await;

        self.get(contract_id).await
    }

    async fn notify_signed(&self, contract: &Contract, tender: Option<&Tender>, signer_id: ObjectId) {
        let title = tender.map_or("the project", |t| t.title.as_str());
        let signer_name = match self.users.find_by_id(signer_id).await {
            Ok(user) => user.name,
            Err(_) => "The counterparty".to_string(),
        };

        if let Some(tender) = tender {
            if tender.creator_id != signer_id {
                let source = NotificationSource {
                    entity_type: "contract".to_string(),
                    entity_id: contract.id.unwrap_or_else(ObjectId::new),
                    actor_id: Some(signer_id),
                };
                if let Err(err) = self
                    .notify
                    .notify_in_app(
                        tender.creator_id,
                        NotificationKind::ContractSigned,
                        format!("Contract signed: {}", tender.title),
                        format!("{signer_name} has signed the contract."),
                        None,
                        source,
                    )
                    .await
                {
                    warn!(%err, "Contract-signed in-app notification failed");
                }
            }
        }

        let recipients: Vec<EmailRecipient> = [&contract.customer, &contract.supplier]
            .iter()
            .filter_map(|party| party.contact_email.clone())
            .map(EmailRecipient::address)
            .collect();
        let report = self
            .notify
            .send_batch(NotificationKind::ContractSigned, &recipients, |_| {
                templates::contract_signed(title, &signer_name)
            })
            .await;
        if !report.failures.is_empty() {
            warn!(
                failed = report.failures.len(),
                "Contract-signed email fan-out had failures"
            );
        }
    }

    /// Appends an amendment: version + 1, status `amended`, change log
    /// entry kept forever.
    pub async fn add_change(
        &self,
        contract_id: ObjectId,
        new: NewContractChange,
        changed_by: ObjectId,
    ) -> ServiceResult<Contract> {
        if new.field.trim().is_empty() || new.new_value.trim().is_empty() {
            return Err(ServiceError::Validation(
                "change field and new value are required".to_string(),
            ));
        }
        if new.reason.trim().is_empty() {
            return Err(ServiceError::Validation(
                "change reason is required".to_string(),
            ));
        }

        let contract = self.get(contract_id).await?;
        let change = build_change(contract.version, new, changed_by, bson::DateTime::now());
        self.contracts.append_change(contract_id, &change).await?;
        info!(
            contract_id = %contract_id.to_hex(),
            field = %change.field,
            version = change.version,
            "Contract amended"
        );

        let title = match self.tenders.find_by_id(contract.tender_id).await {
            Ok(tender) => tender.title,
            Err(_) => "the project".to_string(),
        };
        let recipients: Vec<EmailRecipient> = [&contract.customer, &contract.supplier]
            .iter()
            .filter_map(|party| party.contact_email.clone())
            .map(EmailRecipient::address)
            .collect();
        let report = self
            .notify
            .send_batch(NotificationKind::ContractAmended, &recipients, |_| {
                templates::contract_amended(&title, &change.field, change.version)
            })
            .await;
        if !report.failures.is_empty() {
            warn!(
                failed = report.failures.len(),
                "Contract-amended email fan-out had failures"
            );
        }

        self.get(contract_id).await
    }

    async fn resolve_customer(&self, tender: &Tender) -> ServiceResult<PartySnapshot> {
        let creator = self
            .users
            .find_by_id(tender.creator_id)
            .await
            .map_err(|e| match e {
                DaoError::NotFound => ServiceError::NotFound("user"),
                other => other.into(),
            })?;

        if let Some(company_id) = creator.company_id {
            if let Ok(company) = self.companies.find_by_id(company_id).await {
                return Ok(company_snapshot(&company));
            }
        }
        Ok(user_snapshot(&creator))
    }

    async fn resolve_supplier(
        &self,
        company_id: Option<ObjectId>,
        bidder_id: ObjectId,
    ) -> ServiceResult<PartySnapshot> {
        if let Some(company_id) = company_id {
            if let Ok(company) = self.companies.find_by_id(company_id).await {
                return Ok(company_snapshot(&company));
            }
        }
        let bidder = self
            .users
            .find_by_id(bidder_id)
            .await
            .map_err(|e| match e {
                DaoError::NotFound => ServiceError::NotFound("user"),
                other => other.into(),
            })?;
        Ok(user_snapshot(&bidder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(field: &str) -> NewContractChange {
        NewContractChange {
            field: field.to_string(),
            old_value: Some("4 500 000,00 kr".to_string()),
            new_value: "4 750 000,00 kr".to_string(),
            reason: "Additional groundworks agreed in meeting 12".to_string(),
        }
    }

    #[test]
    fn change_version_is_always_current_plus_one() {
        let first = build_change(1, change("price"), ObjectId::new(), bson::DateTime::now());
        assert_eq!(first.version, 2);

        // Version tracks the contract, not the change count.
        let later = build_change(7, change("deadline"), ObjectId::new(), bson::DateTime::now());
        assert_eq!(later.version, 8);
    }

    #[test]
    fn change_preserves_old_and_new_values() {
        let c = build_change(3, change("price"), ObjectId::new(), bson::DateTime::now());
        assert_eq!(c.field, "price");
        assert_eq!(c.old_value.as_deref(), Some("4 500 000,00 kr"));
        assert_eq!(c.new_value, "4 750 000,00 kr");
    }
}
