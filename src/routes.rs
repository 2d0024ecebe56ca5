// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Daqui para baixo tudo passa pelo auth_guard
    let me_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let admin_routes = Router::new()
        .route(
            "/candidates",
            post(handlers::admin::create_candidate).get(handlers::admin::list_candidates),
        )
        .route("/candidates/{id}", delete(handlers::admin::deactivate_candidate))
        .route(
            "/agents",
            get(handlers::admin::list_agents).post(handlers::admin::create_agent),
        )
        .route("/agents/active", get(handlers::admin::list_active_agents))
        .route(
            "/agents/{id}",
            get(handlers::admin::get_agent)
                .put(handlers::admin::update_agent)
                .delete(handlers::admin::delete_agent),
        )
        .route("/agents/{id}/knowledge", post(handlers::admin::upload_knowledge))
        .route("/action-plan", post(handlers::admin::generate_action_plan));

    let agent_routes = Router::new()
        .route(
            "/tasks",
            post(handlers::agent_tasks::create_task).get(handlers::agent_tasks::list_tasks),
        )
        .route("/tasks/{id}", get(handlers::agent_tasks::get_task));

    let candidate_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/map", get(handlers::dashboard::get_map))
        .route(
            "/tasks",
            get(handlers::tasks::list_tasks)
                .post(handlers::tasks::create_task)
                .put(handlers::tasks::update_task),
        )
        .route(
            "/vault",
            get(handlers::vault::list_documents).post(handlers::vault::upload_document),
        )
        .route("/vault/{id}", get(handlers::vault::download_document))
        .route("/insights", get(handlers::insights::list_insights))
        .route("/insights/{id}/read", put(handlers::insights::mark_read));

    let ingest_routes = Router::new().route("/{data_type}", post(handlers::ingest::upload));

    let protected = Router::new()
        .nest("/api/auth", me_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/agents", agent_routes)
        .nest("/api/candidates", candidate_routes)
        .nest("/api/ingest", ingest_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        db::{ElectoralStore, InsightStore, MemoryStore, Repositories},
        events::{DeliveryPolicy, EventBus},
        models::{electoral::DataType, insights::NewInsight, tasks::Priority},
        services::{
            classifier::MockClassifier,
            csv_worker::{parse_line, ParsedRow},
        },
        storage::Buckets,
    };

    struct Harness {
        app: Router,
        store: Arc<MemoryStore>,
        admin: String,
        maria: (uuid::Uuid, String),
        joao: (uuid::Uuid, String),
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        call_with(app, method, uri, token, None, body).await
    }

    async fn call_with(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        subdomain: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        if let Some(subdomain) = subdomain {
            builder = builder.header("x-subdomain", subdomain);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login falhou: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_candidate(app: &Router, admin: &str, subdomain: &str, owner_email: &str) -> uuid::Uuid {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/admin/candidates",
            Some(admin),
            Some(json!({
                "subdomain": subdomain,
                "name": format!("Campanha {}", subdomain),
                "candidateName": subdomain,
                "position": "Vereador",
                "electionYear": 2024,
                "city": "Natal",
                "state": "RN",
                "owner": { "email": owner_email, "name": subdomain, "password": "segredo123" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "criação falhou: {}", body);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let repos = Repositories::in_memory(store.clone());
        let state = AppState::assemble(
            &repos,
            &Buckets::in_memory(),
            EventBus::new(DeliveryPolicy::default()),
            Arc::new(MockClassifier::new(Duration::ZERO)),
            "segredo-de-teste".into(),
            1,
            Duration::from_secs(5),
        );
        state
            .auth_service
            .bootstrap_admin("admin@prisma.dev", "admin123", "Admin")
            .await
            .unwrap();

        let app = router(state);
        let admin = login(&app, "admin@prisma.dev", "admin123").await;

        let maria_id = create_candidate(&app, &admin, "maria2024", "maria@prisma.dev").await;
        let joao_id = create_candidate(&app, &admin, "joao2024", "joao@prisma.dev").await;
        let maria = login(&app, "maria@prisma.dev", "segredo123").await;
        let joao = login(&app, "joao@prisma.dev", "segredo123").await;

        Harness {
            app,
            store,
            admin,
            maria: (maria_id, maria),
            joao: (joao_id, joao),
        }
    }

    #[tokio::test]
    async fn public_routes_need_no_token() {
        let h = harness().await;

        let (status, _) = call(&h.app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, doc) = call(&h.app, Method::GET, "/api-docs/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/candidates/dashboard"].is_object());
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_or_bad_tokens() {
        let h = harness().await;

        let (status, body) = call(&h.app, Method::GET, "/api/candidates/tasks", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let (status, _) = call(&h.app, Method::GET, "/api/auth/me", Some("lixo"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &h.app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "maria@prisma.dev", "password": "errada" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_resolves_the_candidate_tenant() {
        let h = harness().await;

        let (status, me) = call(&h.app, Method::GET, "/api/auth/me", Some(&h.maria.1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["role"], "candidate");
        assert_eq!(me["subdomain"], "maria2024");
        assert_eq!(me["tenantId"], h.maria.0.to_string());
    }

    #[tokio::test]
    async fn admin_routes_are_admin_only() {
        let h = harness().await;

        let (status, _) = call(&h.app, Method::GET, "/api/admin/candidates", Some(&h.maria.1), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&h.app, Method::GET, "/api/admin/candidates", Some(&h.admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["candidates"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_subdomain_is_rejected() {
        let h = harness().await;

        let (status, _) = call(
            &h.app,
            Method::POST,
            "/api/admin/candidates",
            Some(&h.admin),
            Some(json!({
                "subdomain": "maria2024", "name": "Outra", "candidateName": "Outra",
                "position": "Prefeita", "electionYear": 2024, "city": "Natal", "state": "RN"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(&h.app, Method::GET, "/api/admin/candidates", Some(&h.admin), None).await;
        assert_eq!(body["candidates"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn admin_needs_subdomain_for_tenant_routes() {
        let h = harness().await;

        let (status, _) = call(&h.app, Method::GET, "/api/candidates/tasks", Some(&h.admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call_with(
            &h.app,
            Method::GET,
            "/api/candidates/tasks",
            Some(&h.admin),
            Some("joao2024"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn tenants_never_see_each_other() {
        let h = harness().await;

        let (status, task) = call(
            &h.app,
            Method::POST,
            "/api/candidates/tasks",
            Some(&h.maria.1),
            Some(json!({ "title": "Carreata no centro", "priority": "high" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, doc) = call(
            &h.app,
            Method::POST,
            "/api/candidates/vault",
            Some(&h.maria.1),
            Some(json!({ "name": "ata.txt", "type": "text/plain", "fileData": "b2zDoQ==" })),
        )
        .await;

        let (_, joao_tasks) = call(&h.app, Method::GET, "/api/candidates/tasks", Some(&h.joao.1), None).await;
        assert!(joao_tasks["tasks"].as_array().unwrap().is_empty());

        let (_, joao_docs) = call(&h.app, Method::GET, "/api/candidates/vault", Some(&h.joao.1), None).await;
        assert!(joao_docs["documents"].as_array().unwrap().is_empty());

        let uri = format!("/api/candidates/vault/{}", doc["id"].as_str().unwrap());
        let (status, _) = call(&h.app, Method::GET, &uri, Some(&h.joao.1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &h.app,
            Method::PUT,
            "/api/candidates/tasks",
            Some(&h.joao.1),
            Some(json!({ "id": task["id"], "status": "completed" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    async fn seed_rows(store: &MemoryStore, tenant_id: uuid::Uuid, data_type: DataType, lines: &[&str]) {
        let source = uuid::Uuid::new_v4();
        for line in lines {
            match parse_line(data_type, line).unwrap() {
                ParsedRow::Election(r) => store.insert_election(tenant_id, source, &r).await.unwrap(),
                ParsedRow::Ibge(r) => store.insert_ibge(tenant_id, source, &r).await.unwrap(),
                ParsedRow::Poll(r) => store.insert_poll(tenant_id, source, &r).await.unwrap(),
            }
        }
    }

    #[tokio::test]
    async fn analytics_and_insights_stay_inside_the_tenant() {
        let h = harness().await;
        let (maria_id, maria) = (h.maria.0, h.maria.1.as_str());
        let joao = h.joao.1.as_str();

        seed_rows(&h.store, maria_id, DataType::Elections, &["001,10,Maria,ABC,120,12.5,municipal,2020"]).await;
        seed_rows(
            &h.store,
            maria_id,
            DataType::Ibge,
            &["001,Centro,5000,1000,600,900,800,700,600,400,2000,1500,1000,500,2000,2000,1000"],
        )
        .await;
        seed_rows(&h.store, maria_id, DataType::Polls, &["Ibope,2024-07-05,1000,Maria,40.0,21.0,95,3.0,telefone"]).await;

        let insight = InsightStore::create(
            h.store.as_ref(),
            NewInsight {
                id: uuid::Uuid::new_v4(),
                tenant_id: maria_id,
                title: "Zona 001 em alta".into(),
                description: "Observação".into(),
                insight_type: "poll_analysis".into(),
                data: json!({}),
                priority: Priority::High,
            },
        )
        .await
        .unwrap();

        // Dashboard e mapa
        let (_, mine) = call(&h.app, Method::GET, "/api/candidates/dashboard", Some(maria), None).await;
        assert_eq!(mine["stats"]["totalVotes"], 120);
        assert_eq!(mine["stats"]["pollRating"].as_f64(), Some(40.0));

        let (status, theirs) = call(&h.app, Method::GET, "/api/candidates/dashboard", Some(joao), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(theirs["stats"]["totalVotes"], 0);
        assert_eq!(theirs["stats"]["pollRating"].as_f64(), Some(0.0));
        assert_eq!(theirs["stats"]["activeInsights"], 0);
        assert!(theirs["recentInsights"].as_array().unwrap().is_empty());

        let (_, map) = call(&h.app, Method::GET, "/api/candidates/map", Some(maria), None).await;
        assert_eq!(map["zones"][0]["population"], 5000);
        let (_, map) = call(&h.app, Method::GET, "/api/candidates/map", Some(joao), None).await;
        assert!(map["zones"].as_array().unwrap().is_empty());

        // Insights: lista e marcação de leitura
        let (_, list) = call(&h.app, Method::GET, "/api/candidates/insights", Some(joao), None).await;
        assert!(list["insights"].as_array().unwrap().is_empty());

        let uri = format!("/api/candidates/insights/{}/read", insight.id);
        let (status, _) = call(&h.app, Method::PUT, &uri, Some(joao), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = call(&h.app, Method::GET, "/api/candidates/insights", Some(maria), None).await;
        assert_eq!(list["insights"][0]["isRead"], false);

        // Repositório: agregados filtrados por tenant
        let joao_id = h.joao.0;
        assert_eq!(h.store.vote_stats(joao_id).await.unwrap().total_votes, 0);
        assert!(h.store.zones(joao_id).await.unwrap().is_empty());
        assert_eq!(h.store.poll_rating(joao_id, 5).await.unwrap(), 0.0);
        assert_eq!(h.store.zones(maria_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn agent_tasks_stay_inside_the_tenant() {
        let h = harness().await;

        let (status, agent) = call(
            &h.app,
            Method::POST,
            "/api/admin/agents",
            Some(&h.admin),
            Some(json!({ "name": "Analista", "type": "poll_analysis" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, created) = call(
            &h.app,
            Method::POST,
            "/api/agents/tasks",
            Some(&h.maria.1),
            Some(json!({ "agentId": agent["id"], "taskType": "analysis", "inputData": { "zone": "001" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let task_uri = format!("/api/agents/tasks/{}", created["taskId"].as_str().unwrap());

        let (status, _) = call(&h.app, Method::GET, &task_uri, Some(&h.maria.1), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, list) = call(&h.app, Method::GET, "/api/agents/tasks", Some(&h.joao.1), None).await;
        assert!(list["tasks"].as_array().unwrap().is_empty());

        let (status, _) = call(&h.app, Method::GET, &task_uri, Some(&h.joao.1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, list) = call(&h.app, Method::GET, "/api/agents/tasks", Some(&h.maria.1), None).await;
        assert_eq!(list["tasks"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_task_without_fields_is_bad_request() {
        let h = harness().await;

        let (_, task) = call(
            &h.app,
            Method::POST,
            "/api/candidates/tasks",
            Some(&h.maria.1),
            Some(json!({ "title": "Gravar vídeo" })),
        )
        .await;

        let (status, _) = call(
            &h.app,
            Method::PUT,
            "/api/candidates/tasks",
            Some(&h.maria.1),
            Some(json!({ "id": task["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = call(&h.app, Method::GET, "/api/candidates/tasks", Some(&h.maria.1), None).await;
        assert_eq!(list["tasks"][0]["title"], "Gravar vídeo");
        assert_eq!(list["tasks"][0]["status"], "pending");
    }

    #[tokio::test]
    async fn vault_round_trip_keeps_bytes() {
        let h = harness().await;
        let payload = "JVBERi0xLjQKJcOkw7zDtsOf";

        let (status, doc) = call(
            &h.app,
            Method::POST,
            "/api/candidates/vault",
            Some(&h.maria.1),
            Some(json!({ "name": "plano.pdf", "type": "application/pdf", "fileData": payload, "tags": ["plano"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(doc["uploadedBy"], "maria@prisma.dev");

        let uri = format!("/api/candidates/vault/{}", doc["id"].as_str().unwrap());
        let (status, file) = call(&h.app, Method::GET, &uri, Some(&h.maria.1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(file["fileName"], "plano.pdf");
        assert_eq!(file["fileData"], payload);
    }

    #[tokio::test]
    async fn dashboard_counts_unread_insights_and_pending_tasks() {
        let h = harness().await;
        let tenant_id = h.maria.0;

        for title in ["Primeiro", "Segundo", "Terceiro"] {
            InsightStore::create(
                h.store.as_ref(),
                NewInsight {
                    id: uuid::Uuid::new_v4(),
                    tenant_id,
                    title: title.into(),
                    description: "Observação".into(),
                    insight_type: "poll_analysis".into(),
                    data: json!({}),
                    priority: Priority::Medium,
                },
            )
            .await
            .unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let (_, insights) = call(&h.app, Method::GET, "/api/candidates/insights", Some(&h.maria.1), None).await;
        let first = insights["insights"][2]["id"].as_str().unwrap().to_string();
        let (status, read) = call(
            &h.app,
            Method::PUT,
            &format!("/api/candidates/insights/{}/read", first),
            Some(&h.maria.1),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["isRead"], true);

        for title in ["Panfletagem", "Debate"] {
            call(
                &h.app,
                Method::POST,
                "/api/candidates/tasks",
                Some(&h.maria.1),
                Some(json!({ "title": title })),
            )
            .await;
        }

        let (status, dashboard) = call(&h.app, Method::GET, "/api/candidates/dashboard", Some(&h.maria.1), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["stats"]["activeInsights"], 2);
        assert_eq!(dashboard["stats"]["pendingTasks"], 2);
        assert_eq!(dashboard["recentInsights"][0]["title"], "Terceiro");
        assert_eq!(dashboard["upcomingTasks"].as_array().unwrap().len(), 2);

        let (_, other) = call(&h.app, Method::GET, "/api/candidates/dashboard", Some(&h.joao.1), None).await;
        assert_eq!(other["stats"]["activeInsights"], 0);
    }

    #[tokio::test]
    async fn ingest_rejects_unknown_data_type() {
        let h = harness().await;

        let (status, body) = call(
            &h.app,
            Method::POST,
            "/api/ingest/polls",
            Some(&h.maria.1),
            Some(json!({ "fileName": "pesquisa.csv", "fileData": "Y2FiZWNhbGhvCg==" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = call(
            &h.app,
            Method::POST,
            "/api/ingest/planilhas",
            Some(&h.maria.1),
            Some(json!({ "fileName": "x.csv", "fileData": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
