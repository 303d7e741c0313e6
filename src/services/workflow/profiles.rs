use rust_decimal::Decimal;
use uuid::Uuid;

use super::{ensure, ensure_visible, not_found, WorkflowEngine};
use crate::database::store::{
    StoreError, COMPANY_OWNER_UNIQUE, ENROLLMENT_UNIQUE, STUDENT_OWNER_UNIQUE,
};
use crate::dto::profile_dto::{
    CompanyPayload, StudentProfilePayload, UpdateCompanyPayload, UpdateStudentProfilePayload,
};
use crate::error::{Error, Result};
use crate::models::{
    company::{Company, NewCompany},
    student::{normalize_skills, NewStudentProfile, StudentProfile},
    user::Actor,
};
use crate::services::authorization::{Action, Resource};

fn check_cgpa(cgpa: Option<Decimal>) -> Result<()> {
    match cgpa {
        Some(value) if value < Decimal::ZERO || value > Decimal::TEN => Err(
            Error::ValidationFailed("cgpa must be between 0 and 10".to_string()),
        ),
        _ => Ok(()),
    }
}

fn profile_conflict(err: StoreError) -> Error {
    if err.is_conflict_on(ENROLLMENT_UNIQUE) {
        Error::AlreadyExists("Enrollment number is already registered".to_string())
    } else if err.is_conflict_on(STUDENT_OWNER_UNIQUE) || err.is_conflict_on(COMPANY_OWNER_UNIQUE) {
        Error::AlreadyExists("Profile already exists for this account".to_string())
    } else {
        err.into()
    }
}

impl WorkflowEngine {
    pub async fn create_student_profile(
        &self,
        actor: &Actor,
        payload: StudentProfilePayload,
    ) -> Result<StudentProfile> {
        ensure(
            actor,
            Action::Create,
            &Resource::StudentProfile { owner: actor.id },
        )?;
        check_cgpa(payload.cgpa)?;

        let mut tx = self.begin().await?;
        let profile = tx
            .insert_student_profile(NewStudentProfile {
                user_id: actor.id,
                enrollment_number: payload.enrollment_number.trim().to_string(),
                department: payload.department,
                course: payload.course,
                year: payload.year,
                cgpa: payload.cgpa,
                phone: payload.phone,
                skills: normalize_skills(&payload.skills),
            })
            .await
            .map_err(profile_conflict)?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, profile_id = %profile.id, "student profile created");
        Ok(profile)
    }

    pub async fn my_student_profile(&self, actor: &Actor) -> Result<StudentProfile> {
        let mut tx = self.begin().await?;
        let profile = tx
            .student_profile_for_user(actor.id)
            .await?
            .ok_or_else(|| not_found("Student profile"))?;
        ensure_visible(
            actor,
            &Resource::StudentProfile { owner: profile.user_id },
            "Student profile",
        )?;
        Ok(profile)
    }

    pub async fn get_student_profile(&self, actor: &Actor, id: Uuid) -> Result<StudentProfile> {
        let mut tx = self.begin().await?;
        let profile = tx
            .get_student_profile(id)
            .await?
            .ok_or_else(|| not_found("Student profile"))?;
        ensure_visible(
            actor,
            &Resource::StudentProfile { owner: profile.user_id },
            "Student profile",
        )?;
        Ok(profile)
    }

    pub async fn update_student_profile(
        &self,
        actor: &Actor,
        payload: UpdateStudentProfilePayload,
    ) -> Result<StudentProfile> {
        let mut tx = self.begin().await?;
        let mut profile = tx
            .student_profile_for_user(actor.id)
            .await?
            .ok_or_else(|| not_found("Student profile"))?;
        ensure(
            actor,
            Action::Update,
            &Resource::StudentProfile { owner: profile.user_id },
        )?;

        if let Some(number) = payload.enrollment_number {
            profile.enrollment_number = number.trim().to_string();
        }
        if let Some(department) = payload.department {
            profile.department = department;
        }
        if let Some(course) = payload.course {
            profile.course = course;
        }
        if let Some(year) = payload.year {
            profile.year = year;
        }
        if payload.cgpa.is_some() {
            check_cgpa(payload.cgpa)?;
            profile.cgpa = payload.cgpa;
        }
        if payload.phone.is_some() {
            profile.phone = payload.phone;
        }
        if let Some(skills) = payload.skills {
            profile.skills = normalize_skills(&skills);
        }

        let profile = tx
            .update_student_profile(&profile)
            .await
            .map_err(profile_conflict)?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, profile_id = %profile.id, "student profile updated");
        Ok(profile)
    }

    pub async fn create_company(&self, actor: &Actor, payload: CompanyPayload) -> Result<Company> {
        ensure(actor, Action::Create, &Resource::Company { owner: actor.id })?;

        let mut tx = self.begin().await?;
        let company = tx
            .insert_company(NewCompany {
                user_id: actor.id,
                company_name: payload.company_name,
                industry: payload.industry,
                website: payload.website,
                description: payload.description,
                address: payload.address,
                phone: payload.phone,
            })
            .await
            .map_err(profile_conflict)?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, company_id = %company.id, "company profile created");
        Ok(company)
    }

    pub async fn my_company(&self, actor: &Actor) -> Result<Company> {
        let mut tx = self.begin().await?;
        let company = tx
            .company_for_user(actor.id)
            .await?
            .ok_or_else(|| not_found("Company profile"))?;
        ensure_visible(actor, &Resource::Company { owner: company.user_id }, "Company profile")?;
        Ok(company)
    }

    pub async fn get_company(&self, actor: &Actor, id: Uuid) -> Result<Company> {
        let mut tx = self.begin().await?;
        let company = tx.get_company(id).await?.ok_or_else(|| not_found("Company"))?;
        ensure_visible(actor, &Resource::Company { owner: company.user_id }, "Company")?;
        Ok(company)
    }

    pub async fn update_company(
        &self,
        actor: &Actor,
        payload: UpdateCompanyPayload,
    ) -> Result<Company> {
        let mut tx = self.begin().await?;
        let mut company = tx
            .company_for_user(actor.id)
            .await?
            .ok_or_else(|| not_found("Company profile"))?;
        ensure(actor, Action::Update, &Resource::Company { owner: company.user_id })?;

        if let Some(name) = payload.company_name {
            company.company_name = name;
        }
        if let Some(industry) = payload.industry {
            company.industry = industry;
        }
        if payload.website.is_some() {
            company.website = payload.website;
        }
        if let Some(description) = payload.description {
            company.description = description;
        }
        if let Some(address) = payload.address {
            company.address = address;
        }
        if let Some(phone) = payload.phone {
            company.phone = phone;
        }

        let company = tx.update_company(&company).await?;
        tx.commit().await?;
        tracing::info!(actor_id = %actor.id, company_id = %company.id, "company profile updated");
        Ok(company)
    }
}
