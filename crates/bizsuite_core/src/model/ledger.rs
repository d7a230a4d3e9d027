//! Double-entry ledger posting records.

use crate::model::tenant::TenantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LedgerEntryId = Uuid;

/// Side of a ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySide {
    Debit,
    Credit,
}

impl EntrySide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }
}

/// One posted ledger line.
///
/// Amounts are integer cents and always positive; direction is carried by
/// `side`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub uuid: LedgerEntryId,
    pub tenant_uuid: TenantId,
    pub account_code: String,
    pub side: EntrySide,
    pub amount_cents: i64,
    pub memo: Option<String>,
}

impl LedgerEntry {
    pub fn new(
        tenant_uuid: TenantId,
        account_code: impl Into<String>,
        side: EntrySide,
        amount_cents: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            tenant_uuid,
            account_code: account_code.into(),
            side,
            amount_cents,
            memo: None,
        }
    }
}
