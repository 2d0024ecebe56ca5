// src/services/tenancy_service.rs

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantStore,
    models::{
        auth::{NewUser, Role},
        tenancy::{CreateCandidatePayload, NewGovernmentPlan, NewTenant, Tenant},
    },
    services::auth::hash_password,
    storage::{object_key, ObjectStore},
};

#[derive(Clone)]
pub struct TenantService {
    tenants: Arc<dyn TenantStore>,
    vault: Arc<dyn ObjectStore>,
}

impl TenantService {
    pub fn new(tenants: Arc<dyn TenantStore>, vault: Arc<dyn ObjectStore>) -> Self {
        Self { tenants, vault }
    }

    /// LÓGICA DE NEGÓCIO: cria o candidato (tenant), com plano de governo e
    /// usuário candidato opcionais. Tenant, plano e usuário entram na mesma transação.
    pub async fn create_candidate(&self, payload: CreateCandidatePayload) -> Result<Tenant, AppError> {
        // 1. Subdomínio livre? (o índice único cobre a corrida)
        if self.tenants.subdomain_exists(&payload.subdomain).await? {
            return Err(AppError::SubdomainAlreadyExists(payload.subdomain));
        }

        let tenant_id = Uuid::new_v4();

        // 2. Usuário candidato, já com a senha em hash
        let owner = match payload.owner {
            Some(owner) => Some(NewUser {
                id: Uuid::new_v4(),
                email: owner.email,
                name: owner.name,
                role: Role::Candidate,
                tenant_id: Some(tenant_id),
                password_hash: hash_password(&owner.password).await?,
            }),
            None => None,
        };

        // 3. O arquivo do plano vai para o cofre antes do INSERT
        let plan = match payload.government_plan {
            Some(plan) => {
                let bytes = STANDARD.decode(plan.content.trim())?;
                let file_path = object_key("plans", tenant_id, &plan.filename);
                self.vault.put(&file_path, bytes, "application/pdf").await?;

                Some(NewGovernmentPlan {
                    filename: plan.filename,
                    file_path,
                    strategic_axes: plan.strategic_axes.unwrap_or_else(|| json!({})),
                })
            }
            None => None,
        };
        let plan_key = plan.as_ref().map(|p| p.file_path.clone());

        let created = self
            .tenants
            .create(
                NewTenant {
                    id: tenant_id,
                    subdomain: payload.subdomain,
                    name: payload.name,
                    candidate_name: payload.candidate_name,
                    position: payload.position,
                    party: payload.party,
                    election_year: payload.election_year,
                    city: payload.city,
                    state: payload.state,
                    assigned_agent_id: payload.assigned_agent_id,
                },
                plan,
                owner,
            )
            .await;

        // 4. INSERT falhou: o plano gravado no passo 3 não pode ficar órfão
        let tenant = match created {
            Ok(tenant) => tenant,
            Err(e) => {
                if let Some(key) = plan_key {
                    if let Err(cleanup) = self.vault.delete(&key).await {
                        tracing::warn!(key = %key, "não foi possível remover o plano órfão: {}", cleanup);
                    }
                }
                return Err(e);
            }
        };

        tracing::info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, "🏛️ Candidato criado");
        Ok(tenant)
    }

    pub async fn list_candidates(&self) -> Result<Vec<Tenant>, AppError> {
        self.tenants.list().await
    }

    /// Desativação lógica; nunca apaga.
    pub async fn deactivate_candidate(&self, id: Uuid) -> Result<(), AppError> {
        if !self.tenants.deactivate(id).await? {
            return Err(AppError::NotFound("candidate"));
        }
        tracing::info!(tenant_id = %id, "Candidato desativado");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{MemoryStore, UserStore},
        models::tenancy::{GovernmentPlanPayload, InitialUserPayload},
        storage::MemoryObjectStore,
    };

    fn payload(subdomain: &str) -> CreateCandidatePayload {
        CreateCandidatePayload {
            subdomain: subdomain.into(),
            name: "Campanha Maria".into(),
            candidate_name: "Maria Souza".into(),
            position: "Prefeita".into(),
            party: Some("ABC".into()),
            election_year: 2024,
            city: "Natal".into(),
            state: "RN".into(),
            assigned_agent_id: None,
            government_plan: None,
            owner: None,
        }
    }

    fn service() -> (TenantService, Arc<MemoryStore>, Arc<MemoryObjectStore>) {
        let store = Arc::new(MemoryStore::new());
        let vault = Arc::new(MemoryObjectStore::default());
        (TenantService::new(store.clone(), vault.clone()), store, vault)
    }

    #[tokio::test]
    async fn duplicate_subdomain_is_rejected_without_insert() {
        let (svc, _, _) = service();
        svc.create_candidate(payload("maria2024")).await.unwrap();

        let err = svc.create_candidate(payload("maria2024")).await.unwrap_err();

        assert!(matches!(err, AppError::SubdomainAlreadyExists(ref s) if s == "maria2024"));
        assert_eq!(svc.list_candidates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stores_plan_and_owner() {
        let (svc, store, vault) = service();
        let mut p = payload("joao2024");
        p.government_plan = Some(GovernmentPlanPayload {
            filename: "plano.pdf".into(),
            content: STANDARD.encode(b"%PDF-1.4 plano"),
            strategic_axes: Some(json!({ "saude": 0.8 })),
        });
        p.owner = Some(InitialUserPayload {
            email: "joao@campanha.com".into(),
            name: "João".into(),
            password: "segredo123".into(),
        });

        let tenant = svc.create_candidate(p).await.unwrap();

        let owner = UserStore::find_by_email(store.as_ref(), "joao@campanha.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner.tenant_id, Some(tenant.id));
        assert_eq!(owner.role, Role::Candidate);
        assert_ne!(owner.password_hash, "segredo123");
        assert_eq!(owner.subdomain.as_deref(), Some("joao2024"));

        let keys = vault.keys().await;
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with(&format!("plans/{}/", tenant.id)));
        assert!(keys[0].ends_with("_plano.pdf"));
        assert_eq!(vault.get(&keys[0]).await.unwrap(), b"%PDF-1.4 plano");
    }

    #[tokio::test]
    async fn invalid_plan_content_is_rejected() {
        let (svc, _, _) = service();
        let mut p = payload("ana2024");
        p.government_plan = Some(GovernmentPlanPayload {
            filename: "plano.pdf".into(),
            content: "não é base64!".into(),
            strategic_axes: None,
        });

        let err = svc.create_candidate(p).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidBase64(_)));
        assert!(svc.list_candidates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deactivating_unknown_candidate_is_not_found() {
        let (svc, _, _) = service();
        let err = svc.deactivate_candidate(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("candidate")));
    }

    #[tokio::test]
    async fn failed_insert_removes_the_uploaded_plan() {
        let (svc, store, vault) = service();
        UserStore::create(
            store.as_ref(),
            NewUser {
                id: Uuid::new_v4(),
                email: "joao@campanha.com".into(),
                name: "Outro João".into(),
                role: Role::Candidate,
                tenant_id: None,
                password_hash: "x".into(),
            },
        )
        .await
        .unwrap();

        let mut p = payload("joao2024");
        p.government_plan = Some(GovernmentPlanPayload {
            filename: "plano.pdf".into(),
            content: STANDARD.encode(b"%PDF-1.4 plano"),
            strategic_axes: None,
        });
        p.owner = Some(InitialUserPayload {
            email: "joao@campanha.com".into(),
            name: "João".into(),
            password: "segredo123".into(),
        });

        let err = svc.create_candidate(p).await.unwrap_err();

        assert!(matches!(err, AppError::EmailAlreadyExists(_)));
        assert!(svc.list_candidates().await.unwrap().is_empty());
        assert!(vault.keys().await.is_empty());
    }
}
