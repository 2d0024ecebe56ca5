// src/db/electoral_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    models::electoral::{ElectionRow, IbgeRow, PollRow, VoteStats, ZoneRow},
};

/// Linhas importadas dos CSVs (somente inserção) e os agregados de leitura.
/// `source_event_id` liga cada linha ao evento de upload que a gerou.
#[async_trait]
pub trait ElectoralStore: Send + Sync {
    async fn insert_election(&self, tenant_id: Uuid, source_event_id: Uuid, row: &ElectionRow) -> Result<(), AppError>;

    async fn insert_ibge(&self, tenant_id: Uuid, source_event_id: Uuid, row: &IbgeRow) -> Result<(), AppError>;

    async fn insert_poll(&self, tenant_id: Uuid, source_event_id: Uuid, row: &PollRow) -> Result<(), AppError>;

    /// Soma dos votos e média do percentual.
    async fn vote_stats(&self, tenant_id: Uuid) -> Result<VoteStats, AppError>;

    /// Média da intenção de voto nas `last_n` pesquisas mais recentes.
    async fn poll_rating(&self, tenant_id: Uuid, last_n: i64) -> Result<f64, AppError>;

    /// Uma linha por zona votada, em ordem de zona, com o IBGE mais recente.
    async fn zones(&self, tenant_id: Uuid) -> Result<Vec<ZoneRow>, AppError>;
}

#[derive(Clone)]
pub struct PgElectoralRepository {
    pool: PgPool,
}

impl PgElectoralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ElectoralStore for PgElectoralRepository {
    async fn insert_election(&self, tenant_id: Uuid, source_event_id: Uuid, row: &ElectionRow) -> Result<(), AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        sqlx::query(
            r#"
            INSERT INTO elections (tenant_id, source_event_id, zone, section, candidate_name,
                                   party, votes, percentage, election_type, year)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(tenant_id)
        .bind(source_event_id)
        .bind(&row.zone)
        .bind(&row.section)
        .bind(&row.candidate_name)
        .bind(&row.party)
        .bind(row.votes)
        .bind(row.percentage)
        .bind(&row.election_type)
        .bind(row.year)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_ibge(&self, tenant_id: Uuid, source_event_id: Uuid, row: &IbgeRow) -> Result<(), AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        sqlx::query(
            r#"
            INSERT INTO ibge_data (tenant_id, source_event_id, zone, neighborhood, population,
                age_0_17, age_18_24, age_25_34, age_35_44, age_45_54, age_55_64, age_65_plus,
                income_0_2, income_2_5, income_5_10, income_10_plus,
                education_fundamental, education_medio, education_superior)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(tenant_id)
        .bind(source_event_id)
        .bind(&row.zone)
        .bind(&row.neighborhood)
        .bind(row.population)
        .bind(row.age_0_17)
        .bind(row.age_18_24)
        .bind(row.age_25_34)
        .bind(row.age_35_44)
        .bind(row.age_45_54)
        .bind(row.age_55_64)
        .bind(row.age_65_plus)
        .bind(row.income_0_2)
        .bind(row.income_2_5)
        .bind(row.income_5_10)
        .bind(row.income_10_plus)
        .bind(row.education_fundamental)
        .bind(row.education_medio)
        .bind(row.education_superior)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_poll(&self, tenant_id: Uuid, source_event_id: Uuid, row: &PollRow) -> Result<(), AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        sqlx::query(
            r#"
            INSERT INTO polls (tenant_id, source_event_id, poll_name, date_conducted, sample_size,
                               candidate_name, intention_percentage, rejection_percentage,
                               confidence_level, margin_error, methodology)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(tenant_id)
        .bind(source_event_id)
        .bind(&row.poll_name)
        .bind(row.date_conducted)
        .bind(row.sample_size)
        .bind(&row.candidate_name)
        .bind(row.intention_percentage)
        .bind(row.rejection_percentage)
        .bind(row.confidence_level)
        .bind(row.margin_error)
        .bind(&row.methodology)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn vote_stats(&self, tenant_id: Uuid) -> Result<VoteStats, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        // SUM de BIGINT vira NUMERIC no Postgres; o cast traz de volta para i64
        let stats = sqlx::query_as::<_, VoteStats>(
            r#"
            SELECT COALESCE(SUM(votes), 0)::BIGINT AS total_votes,
                   COALESCE(AVG(percentage), 0)::DOUBLE PRECISION AS vote_percentage
            FROM elections
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stats)
    }

    async fn poll_rating(&self, tenant_id: Uuid, last_n: i64) -> Result<f64, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let rating: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(AVG(intention_percentage), 0)::DOUBLE PRECISION
            FROM (
                SELECT intention_percentage FROM polls
                WHERE tenant_id = $1
                ORDER BY date_conducted DESC, created_at DESC
                LIMIT $2
            ) recent
            "#,
        )
        .bind(tenant_id)
        .bind(last_n)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rating)
    }

    async fn zones(&self, tenant_id: Uuid) -> Result<Vec<ZoneRow>, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, tenant_id).await?;

        let zones = sqlx::query_as::<_, ZoneRow>(
            r#"
            SELECT e.zone, e.total_votes, e.avg_percentage,
                   COALESCE(i.population, 0) AS population,
                   COALESCE(i.age_0_17, 0) AS age_0_17,
                   COALESCE(i.age_18_24, 0) AS age_18_24,
                   COALESCE(i.age_25_34, 0) AS age_25_34,
                   COALESCE(i.age_35_44, 0) AS age_35_44,
                   COALESCE(i.age_45_54, 0) AS age_45_54,
                   COALESCE(i.age_55_64, 0) AS age_55_64,
                   COALESCE(i.age_65_plus, 0) AS age_65_plus,
                   COALESCE(i.income_0_2, 0) AS income_0_2,
                   COALESCE(i.income_2_5, 0) AS income_2_5,
                   COALESCE(i.income_5_10, 0) AS income_5_10,
                   COALESCE(i.income_10_plus, 0) AS income_10_plus,
                   COALESCE(i.education_fundamental, 0) AS education_fundamental,
                   COALESCE(i.education_medio, 0) AS education_medio,
                   COALESCE(i.education_superior, 0) AS education_superior
            FROM (
                SELECT zone,
                       SUM(votes)::BIGINT AS total_votes,
                       AVG(percentage)::DOUBLE PRECISION AS avg_percentage
                FROM elections
                WHERE tenant_id = $1
                GROUP BY zone
            ) e
            LEFT JOIN LATERAL (
                SELECT * FROM ibge_data d
                WHERE d.tenant_id = $1 AND d.zone = e.zone
                ORDER BY d.created_at DESC, d.id DESC
                LIMIT 1
            ) i ON true
            ORDER BY e.zone ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(zones)
    }
}
