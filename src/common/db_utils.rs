use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre uma transação e define `app.tenant_id` localmente (vale só até o commit).
/// Toda consulta em tabela com `tenant_id` passa por aqui: as policies do
/// Postgres recusam linhas de outro tenant mesmo que o WHERE esqueça o filtro.
pub(crate) async fn begin_tenant_tx(
    pool: &PgPool,
    tenant_id: Uuid,
) -> Result<Transaction<'static, Postgres>, AppError> {
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

/// Converte violação de unicidade num erro de domínio; o resto vira DatabaseError.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_conflict: impl FnOnce() -> AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_conflict();
        }
    }
    AppError::DatabaseError(e)
}
