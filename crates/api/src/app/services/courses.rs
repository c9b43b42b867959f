use serde_json::Value;
use tracing::instrument;

use aula_academy::patch::apply_patch;
use aula_academy::{Course, CourseStatus, NewCourse};
use aula_auth::fields::check_patch;
use aula_auth::permissions::{COURSES_READ, COURSES_WRITE};
use aula_auth::{authorize, Model, Principal, Role};
use aula_core::CourseId;

use super::{now, require, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};

/// Students only ever see the published catalog.
fn visible_to(principal: &Principal, course: &Course) -> bool {
    principal.role != Role::Student || course.status == CourseStatus::Published
}

impl AppServices {
    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn list_courses(&self, principal: &Principal) -> ServiceResult<Vec<Course>> {
        authorize(principal, &COURSES_READ)?;
        let courses = self.stores.courses.list().await?;
        Ok(courses.into_iter().filter(|c| visible_to(principal, c)).collect())
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn get_course(&self, principal: &Principal, id: CourseId) -> ServiceResult<Course> {
        authorize(principal, &COURSES_READ)?;
        let course = require(&*self.stores.courses, id, "course").await?;
        if !visible_to(principal, &course) {
            return Err(ServiceError::not_found("course"));
        }
        Ok(course)
    }

    #[instrument(skip(self, principal, input), fields(caller = %principal.user_id), err)]
    pub async fn create_course(&self, principal: &Principal, input: NewCourse) -> ServiceResult<Course> {
        authorize(principal, &COURSES_WRITE)?;
        let course = input.into_course(now())?;
        let course = self.stores.courses.insert(course).await?;
        tracing::info!(course_id = %course.id, "course created");
        Ok(course)
    }

    /// Row access is `courses.read`; which fields may change is decided by the
    /// field policy of the caller's role.
    #[instrument(skip(self, principal, patch), fields(caller = %principal.user_id), err)]
    pub async fn update_course(&self, principal: &Principal, id: CourseId, patch: &Value) -> ServiceResult<Course> {
        authorize(principal, &COURSES_READ)?;
        check_patch(principal.role, Model::Course, patch)?;
        let current = require(&*self.stores.courses, id, "course").await?;
        let mut updated: Course = apply_patch(&current, patch)?;
        updated.name = updated.name.trim().to_string();
        updated.validate()?;
        Ok(self.stores.courses.update(updated).await?)
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn delete_course(&self, principal: &Principal, id: CourseId) -> ServiceResult<()> {
        authorize(principal, &COURSES_WRITE)?;
        require(&*self.stores.courses, id, "course").await?;
        let in_use = self.stores.commissions.list().await?.iter().any(|c| c.course_id == id);
        if in_use {
            return Err(ServiceError::conflict("course has commissions; archive it instead"));
        }
        self.stores.courses.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{admin, principal_of, seed_user, services};
    use super::*;
    use serde_json::json;

    fn rust_course() -> NewCourse {
        NewCourse {
            name: " Rust ".into(),
            description: "Systems programming".into(),
            duration_weeks: 8,
            price_cents: 120_000,
        }
    }

    #[tokio::test]
    async fn students_see_only_published_courses() {
        let services = services();
        let student = principal_of(&seed_user(&services, "s@aula.test", Role::Student).await);
        let draft = services.create_course(&admin(), rust_course()).await.unwrap();
        assert_eq!(draft.name, "Rust");

        assert!(services.list_courses(&student).await.unwrap().is_empty());
        assert!(matches!(
            services.get_course(&student, draft.id).await,
            Err(ServiceError::NotFound(_))
        ));

        services
            .update_course(&admin(), draft.id, &json!({"status": "published"}))
            .await
            .unwrap();
        assert_eq!(services.list_courses(&student).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn teacher_edits_only_the_description() {
        let services = services();
        let teacher = principal_of(&seed_user(&services, "t@aula.test", Role::Teacher).await);
        let course = services.create_course(&admin(), rust_course()).await.unwrap();

        let updated = services
            .update_course(&teacher, course.id, &json!({"description": "Ownership first"}))
            .await
            .unwrap();
        assert_eq!(updated.description, "Ownership first");

        assert!(matches!(
            services.update_course(&teacher, course.id, &json!({"price_cents": 1})).await,
            Err(ServiceError::FieldPolicy(_))
        ));
        assert!(matches!(
            services.create_course(&teacher, rust_course()).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn patched_course_is_revalidated() {
        let services = services();
        let course = services.create_course(&admin(), rust_course()).await.unwrap();
        match services
            .update_course(&admin(), course.id, &json!({"duration_weeks": 0}))
            .await
            .unwrap_err()
        {
            ServiceError::Validation(errors) => assert!(errors.has_field("duration_weeks")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
