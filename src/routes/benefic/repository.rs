use async_trait::async_trait;
use sqlx::PgPool;

use super::model::Benefic;
use crate::repository::{PersistenceError, Repository};

/// 基于 PostgreSQL `benefics` 表的存储实现
#[derive(Clone)]
pub struct PgBeneficRepository {
    pool: PgPool,
}

impl PgBeneficRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Benefic> for PgBeneficRepository {
    async fn list(&self) -> Result<Vec<Benefic>, PersistenceError> {
        let benefics = sqlx::query_as::<_, Benefic>(
            r#"
            SELECT id, compname, types, status, client_id
            FROM benefics
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(benefics)
    }

    async fn new_form_defaults(&self) -> Result<Benefic, PersistenceError> {
        Ok(Benefic::default())
    }

    async fn insert(&self, record: Benefic) -> Result<(), PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO benefics (compname, types, status, client_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.compname)
        .bind(&record.types)
        .bind(&record.status)
        .bind(record.client_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                tracing::debug!("Inserted benefic {}", record.compname);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to insert benefic: {:?}", e);
                Err(e.into())
            }
        }
    }
}
