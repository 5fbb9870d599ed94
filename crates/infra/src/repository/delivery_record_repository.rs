//! # DeliveryRecordRepository
//!
//! 配信記録の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **追記してから 1 回だけ更新**: `insert` は `SENDING` の行を作り、
//!   `update_status` は `WHERE status = 'SENDING'` の条件付き UPDATE で終端状態に遷移させる
//! - **終端状態の保護**: 条件付き UPDATE が 0 件なら `InfraErrorKind::Conflict` を返す
//! - **日付範囲は UTC の暦日**: `created_at` を UTC の日付に切り捨てて両端を含めて比較する

use async_trait::async_trait;
use bulkmail_domain::{
    DomainError,
    delivery::{DeliveryRecord, DeliveryRecordId, DeliveryRecordRecord, DeliveryStatus},
    email::EmailAddress,
    template::TemplateId,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::InfraError;

/// 配信記録リポジトリトレイト
#[async_trait]
pub trait DeliveryRecordRepository: Send + Sync {
    /// 配信記録を挿入する
    async fn insert(&self, record: &DeliveryRecord) -> Result<(), InfraError>;

    /// 終端状態に遷移した配信記録を保存する
    ///
    /// DB 上の行が `SENDING` の場合のみ更新する。
    /// 行が存在しない、または既に終端状態の場合は `InfraErrorKind::Conflict` を返す。
    async fn update_status(&self, record: &DeliveryRecord) -> Result<(), InfraError>;

    /// ID で配信記録を検索する
    async fn find_by_id(&self, id: &DeliveryRecordId) -> Result<Option<DeliveryRecord>, InfraError>;

    /// 宛先で配信記録を検索する（新しい順）
    async fn find_by_recipient(&self, recipient: &str) -> Result<Vec<DeliveryRecord>, InfraError>;

    /// 作成日（UTC）が `start`〜`end`（両端含む）の配信記録を古い順で取得する
    async fn find_by_created_date_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DeliveryRecord>, InfraError>;
}

/// delivery_records の行
#[derive(Debug, sqlx::FromRow)]
struct DeliveryRecordRow {
    id:            Uuid,
    recipient:     String,
    subject:       String,
    template_id:   Uuid,
    sender:        String,
    status:        String,
    error_message: Option<String>,
    variables:     Option<String>,
    created_at:    DateTime<Utc>,
    updated_at:    DateTime<Utc>,
}

impl TryFrom<DeliveryRecordRow> for DeliveryRecord {
    type Error = InfraError;

    fn try_from(row: DeliveryRecordRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |e: DomainError| {
            InfraError::unexpected(format!("不正な配信記録行 (id={id}): {e}"))
        };

        Ok(DeliveryRecord::from_db(DeliveryRecordRecord {
            id:            DeliveryRecordId::from_uuid(id),
            recipient:     EmailAddress::new(row.recipient).map_err(invalid)?,
            subject:       row.subject,
            template_id:   TemplateId::from_uuid(row.template_id),
            sender:        EmailAddress::new(row.sender).map_err(invalid)?,
            status:        row.status.parse::<DeliveryStatus>().map_err(invalid)?,
            error_message: row.error_message,
            variables:     row.variables,
            created_at:    row.created_at,
            updated_at:    row.updated_at,
        }))
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, recipient, subject, template_id, sender, status,
           error_message, variables, created_at, updated_at
    FROM delivery_records
"#;

/// PostgreSQL 実装の DeliveryRecordRepository
#[derive(Debug, Clone)]
pub struct PostgresDeliveryRecordRepository {
    pool: PgPool,
}

impl PostgresDeliveryRecordRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryRecordRepository for PostgresDeliveryRecordRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(id = %record.id()))]
    async fn insert(&self, record: &DeliveryRecord) -> Result<(), InfraError> {
        let status: &str = record.status().into();

        sqlx::query(
            r#"
            INSERT INTO delivery_records (
                id, recipient, subject, template_id, sender, status,
                error_message, variables, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.recipient().as_str())
        .bind(record.subject())
        .bind(record.template_id().as_uuid())
        .bind(record.sender().as_str())
        .bind(status)
        .bind(record.error_message())
        .bind(record.variables())
        .bind(record.created_at())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(id = %record.id(), status = %record.status()))]
    async fn update_status(&self, record: &DeliveryRecord) -> Result<(), InfraError> {
        let status: &str = record.status().into();

        let result = sqlx::query(
            r#"
            UPDATE delivery_records
            SET status = $2,
                error_message = $3,
                updated_at = $4
            WHERE id = $1 AND status = 'SENDING'
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(status)
        .bind(record.error_message())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InfraError::conflict(
                "DeliveryRecord",
                record.id().to_string(),
            ));
        }

        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn find_by_id(&self, id: &DeliveryRecordId) -> Result<Option<DeliveryRecord>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let row = sqlx::query_as::<_, DeliveryRecordRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(DeliveryRecord::try_from).transpose()
    }

    #[tracing::instrument(skip_all, level = "debug")]
    async fn find_by_recipient(&self, recipient: &str) -> Result<Vec<DeliveryRecord>, InfraError> {
        let sql = format!("{SELECT_COLUMNS} WHERE recipient = $1 ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, DeliveryRecordRow>(&sql)
            .bind(recipient)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DeliveryRecord::try_from).collect()
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%start, %end))]
    async fn find_by_created_date_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DeliveryRecord>, InfraError> {
        let sql = format!(
            "{SELECT_COLUMNS} \
             WHERE (created_at AT TIME ZONE 'UTC')::date BETWEEN $1 AND $2 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, DeliveryRecordRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DeliveryRecord::try_from).collect()
    }
}
