//! # 配信履歴クエリ
//!
//! 配信台帳に対する読み取り専用の検索。

use bulkmail_domain::delivery::DeliveryRecord;
use chrono::NaiveDate;

use super::delivery_ledger::DeliveryLedger;
use crate::error::ServiceError;

/// 配信履歴クエリ
#[derive(Clone)]
pub struct HistoryQuery {
    ledger: DeliveryLedger,
}

impl HistoryQuery {
    pub fn new(ledger: DeliveryLedger) -> Self {
        Self { ledger }
    }

    /// 宛先の配信履歴（新しい順）
    pub async fn by_recipient(&self, recipient: &str) -> Result<Vec<DeliveryRecord>, ServiceError> {
        self.ledger.find_by_recipient(recipient).await
    }

    /// 作成日（UTC）での配信履歴（古い順、両端を含む）
    pub async fn by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DeliveryRecord>, ServiceError> {
        self.ledger.find_by_sent_date_range(start, end).await
    }
}
