//! Ledger entries plus the budget and goal projections fed by them.
//!
//! # Invariants
//! - A ledger entry is applied to a budget or goal at most once; the
//!   application row is written in the same transaction as the counter update.

use crate::model::ledger::{EntrySide, LedgerEntry, LedgerEntryId};
use crate::model::tenant::TenantId;
use crate::repo::{is_unique_violation, parse_uuid, RepoError, RepoResult, WriteScope};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

/// Spend tracking for one expense account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetRecord {
    pub uuid: Uuid,
    pub tenant_uuid: TenantId,
    pub account_code: String,
    pub allocated_cents: i64,
    pub spent_cents: i64,
}

/// Savings target fed by credits on one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalRecord {
    pub uuid: Uuid,
    pub tenant_uuid: TenantId,
    pub account_code: String,
    pub target_cents: i64,
    pub contributed_cents: i64,
}

impl GoalRecord {
    pub fn is_reached(&self) -> bool {
        self.contributed_cents >= self.target_cents
    }
}

pub trait LedgerRepository {
    fn insert_entry(&self, entry: &LedgerEntry) -> RepoResult<LedgerEntryId>;
    fn get_entry(&self, id: LedgerEntryId) -> RepoResult<Option<LedgerEntry>>;
    fn create_budget(
        &self,
        tenant: TenantId,
        account_code: &str,
        allocated_cents: i64,
    ) -> RepoResult<BudgetRecord>;
    fn find_budget(&self, tenant: TenantId, account_code: &str)
        -> RepoResult<Option<BudgetRecord>>;
    /// Adds the entry amount to spend-to-date unless already applied.
    fn apply_to_budget(&self, budget: &BudgetRecord, entry: &LedgerEntry) -> RepoResult<bool>;
    fn create_goal(
        &self,
        tenant: TenantId,
        account_code: &str,
        target_cents: i64,
    ) -> RepoResult<GoalRecord>;
    fn find_goal(&self, tenant: TenantId, account_code: &str) -> RepoResult<Option<GoalRecord>>;
    /// Adds the entry amount to the goal unless already contributed.
    fn contribute_to_goal(&self, goal: &GoalRecord, entry: &LedgerEntry) -> RepoResult<bool>;
}

pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn apply_once(
        &self,
        guard_sql: &str,
        update_sql: &str,
        target: Uuid,
        entry: &LedgerEntry,
    ) -> RepoResult<bool> {
        let scope = WriteScope::begin(self.conn)?;
        let inserted = self.conn.execute(
            guard_sql,
            params![target.to_string(), entry.uuid.to_string()],
        )?;
        if inserted == 0 {
            return Ok(false);
        }
        self.conn
            .execute(update_sql, params![entry.amount_cents, target.to_string()])?;
        scope.commit()?;
        Ok(true)
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn insert_entry(&self, entry: &LedgerEntry) -> RepoResult<LedgerEntryId> {
        self.conn
            .execute(
                "INSERT INTO ledger_entries (uuid, tenant_uuid, account_code, side, amount_cents, memo)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    entry.uuid.to_string(),
                    entry.tenant_uuid.to_string(),
                    entry.account_code.as_str(),
                    entry.side.as_str(),
                    entry.amount_cents,
                    entry.memo.as_deref(),
                ],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Conflict(format!("ledger entry {}", entry.uuid))
                } else {
                    err.into()
                }
            })?;
        Ok(entry.uuid)
    }

    fn get_entry(&self, id: LedgerEntryId) -> RepoResult<Option<LedgerEntry>> {
        let row = self
            .conn
            .query_row(
                "SELECT tenant_uuid, account_code, side, amount_cents, memo
                 FROM ledger_entries WHERE uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((tenant, account_code, side, amount_cents, memo)) = row else {
            return Ok(None);
        };

        let side = EntrySide::parse(&side).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid side `{side}` in ledger_entries.side"))
        })?;
        Ok(Some(LedgerEntry {
            uuid: id,
            tenant_uuid: parse_uuid(&tenant, "ledger_entries.tenant_uuid")?,
            account_code,
            side,
            amount_cents,
            memo,
        }))
    }

    fn create_budget(
        &self,
        tenant: TenantId,
        account_code: &str,
        allocated_cents: i64,
    ) -> RepoResult<BudgetRecord> {
        let budget = BudgetRecord {
            uuid: Uuid::new_v4(),
            tenant_uuid: tenant,
            account_code: account_code.to_string(),
            allocated_cents,
            spent_cents: 0,
        };
        self.conn
            .execute(
                "INSERT INTO budgets (uuid, tenant_uuid, account_code, allocated_cents)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    budget.uuid.to_string(),
                    tenant.to_string(),
                    account_code,
                    allocated_cents
                ],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Conflict(format!("budget for account {account_code}"))
                } else {
                    err.into()
                }
            })?;
        Ok(budget)
    }

    fn find_budget(
        &self,
        tenant: TenantId,
        account_code: &str,
    ) -> RepoResult<Option<BudgetRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, allocated_cents, spent_cents FROM budgets
                 WHERE tenant_uuid = ?1 AND account_code = ?2;",
                params![tenant.to_string(), account_code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(uuid, allocated_cents, spent_cents)| {
            Ok(BudgetRecord {
                uuid: parse_uuid(&uuid, "budgets.uuid")?,
                tenant_uuid: tenant,
                account_code: account_code.to_string(),
                allocated_cents,
                spent_cents,
            })
        })
        .transpose()
    }

    fn apply_to_budget(&self, budget: &BudgetRecord, entry: &LedgerEntry) -> RepoResult<bool> {
        self.apply_once(
            "INSERT OR IGNORE INTO budget_applications (budget_uuid, entry_uuid) VALUES (?1, ?2);",
            "UPDATE budgets SET spent_cents = spent_cents + ?1 WHERE uuid = ?2;",
            budget.uuid,
            entry,
        )
    }

    fn create_goal(
        &self,
        tenant: TenantId,
        account_code: &str,
        target_cents: i64,
    ) -> RepoResult<GoalRecord> {
        let goal = GoalRecord {
            uuid: Uuid::new_v4(),
            tenant_uuid: tenant,
            account_code: account_code.to_string(),
            target_cents,
            contributed_cents: 0,
        };
        self.conn
            .execute(
                "INSERT INTO goals (uuid, tenant_uuid, account_code, target_cents)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    goal.uuid.to_string(),
                    tenant.to_string(),
                    account_code,
                    target_cents
                ],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Conflict(format!("goal for account {account_code}"))
                } else {
                    err.into()
                }
            })?;
        Ok(goal)
    }

    fn find_goal(&self, tenant: TenantId, account_code: &str) -> RepoResult<Option<GoalRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT uuid, target_cents, contributed_cents FROM goals
                 WHERE tenant_uuid = ?1 AND account_code = ?2;",
                params![tenant.to_string(), account_code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(uuid, target_cents, contributed_cents)| {
            Ok(GoalRecord {
                uuid: parse_uuid(&uuid, "goals.uuid")?,
                tenant_uuid: tenant,
                account_code: account_code.to_string(),
                target_cents,
                contributed_cents,
            })
        })
        .transpose()
    }

    fn contribute_to_goal(&self, goal: &GoalRecord, entry: &LedgerEntry) -> RepoResult<bool> {
        self.apply_once(
            "INSERT OR IGNORE INTO goal_contributions (goal_uuid, entry_uuid) VALUES (?1, ?2);",
            "UPDATE goals SET contributed_cents = contributed_cents + ?1 WHERE uuid = ?2;",
            goal.uuid,
            entry,
        )
    }
}
