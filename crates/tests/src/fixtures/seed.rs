use bson::oid::ObjectId;

use anbud_db::models::{Company, NotificationPrefs, Project, User};
use anbud_services::dao::{CompanyDao, ProjectDao, UserDao};

use super::test_app::TestApp;

pub struct Seed {
    pub customer: ObjectId,
    pub customer_company: ObjectId,
    pub suppliers: Vec<SeededSupplier>,
    pub project: ObjectId,
}

pub struct SeededSupplier {
    pub user_id: ObjectId,
    pub company_id: ObjectId,
    pub email: String,
}

impl TestApp {
    pub async fn seed_user(&self, email: &str, name: &str, company_id: Option<ObjectId>) -> ObjectId {
        let now = bson::DateTime::now();
        let user = User {
            id: None,
            email: email.to_string(),
            name: name.to_string(),
            company_id,
            locale: "nb-NO".to_string(),
            notification_preferences: NotificationPrefs::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let user = UserDao::new(&self.db).create(&user).await.unwrap();
        user.id.unwrap()
    }

    pub async fn seed_company(&self, name: &str, contact_email: &str) -> ObjectId {
        let now = bson::DateTime::now();
        let company = Company {
            id: None,
            name: name.to_string(),
            org_number: Some("987654321".to_string()),
            contact_email: Some(contact_email.to_string()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let company = CompanyDao::new(&self.db).create(&company).await.unwrap();
        company.id.unwrap()
    }

    pub async fn seed_project(&self, name: &str, customer_company: ObjectId) -> ObjectId {
        let now = bson::DateTime::now();
        let project = Project {
            id: None,
            name: name.to_string(),
            customer_company_id: Some(customer_company),
            address: Some("Storgata 1, 0155 Oslo".to_string()),
            created_at: now,
            updated_at: now,
        };
        let project = ProjectDao::new(&self.db).create(&project).await.unwrap();
        project.id.unwrap()
    }

    /// One customer with a company and project, plus three supplier
    /// users each with their own company.
    pub async fn seed_procurement(&self, tag: &str) -> Seed {
        let customer_company = self
            .seed_company(&format!("Byggherre {tag} AS"), &format!("post@{tag}-bh.no"))
            .await;
        let customer = self
            .seed_user(
                &format!("customer@{tag}.no"),
                "Kari Byggherre",
                Some(customer_company),
            )
            .await;
        let project = self
            .seed_project(&format!("Prosjekt {tag}"), customer_company)
            .await;

        let mut suppliers = Vec::new();
        for i in 1..=3 {
            let email = format!("supplier{i}@{tag}.no");
            let company_id = self
                .seed_company(&format!("Entreprenør {i} {tag} AS"), &email)
                .await;
            let user_id = self
                .seed_user(&email, &format!("Supplier {i}"), Some(company_id))
                .await;
            suppliers.push(SeededSupplier {
                user_id,
                company_id,
                email,
            });
        }

        Seed {
            customer,
            customer_company,
            suppliers,
            project,
        }
    }
}
