use tracing::instrument;

use aula_academy::Response;
use aula_auth::permissions::{RESPONSES_READ, RESPONSES_READ_OWN};
use aula_auth::Principal;
use aula_core::{CommissionId, ResponseId};

use super::{require, AppServices};
use crate::app::errors::{ServiceError, ServiceResult};
use crate::authz::scope;

impl AppServices {
    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn list_responses(
        &self,
        principal: &Principal,
        commission_id: Option<CommissionId>,
    ) -> ServiceResult<Vec<Response>> {
        let scope = scope(principal, &RESPONSES_READ, &RESPONSES_READ_OWN)?;
        let responses = self.stores.responses.list().await?;
        Ok(responses
            .into_iter()
            .filter(|r| scope.allows(r.user_id))
            .filter(|r| commission_id.is_none_or(|id| r.commission_id == id))
            .collect())
    }

    #[instrument(skip(self, principal), fields(caller = %principal.user_id), err)]
    pub async fn get_response(&self, principal: &Principal, id: ResponseId) -> ServiceResult<Response> {
        let scope = scope(principal, &RESPONSES_READ, &RESPONSES_READ_OWN)?;
        let response = require(&*self.stores.responses, id, "response").await?;
        if !scope.allows(response.user_id) {
            return Err(ServiceError::not_found("response"));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::super::enrollments::Preinscription;
    use super::super::tests::{answers_for, principal_of, seed_form, seed_open_commission, seed_user, services};
    use super::*;
    use aula_auth::Role;

    #[tokio::test]
    async fn students_see_only_their_responses() {
        let services = services();
        let form = seed_form(&services).await;
        let teacher = seed_user(&services, "t@aula.test", Role::Teacher).await;
        let commission = seed_open_commission(&services, Some(&teacher), Some(&form), 5).await;
        let a = seed_user(&services, "a@aula.test", Role::Student).await;
        let b = seed_user(&services, "b@aula.test", Role::Student).await;

        for student in [&a, &b] {
            let request = Preinscription {
                user_id: None,
                answers: answers_for(&form),
            };
            services
                .preinscribe(&principal_of(student), commission.id, request)
                .await
                .unwrap();
        }

        let mine = services.list_responses(&principal_of(&a), None).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, a.id);
        assert!(matches!(
            services.get_response(&principal_of(&b), mine[0].id).await,
            Err(ServiceError::NotFound(_))
        ));

        let all = services
            .list_responses(&principal_of(&teacher), Some(commission.id))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
