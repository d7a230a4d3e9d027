//! Cross-module reactions to ledger postings.
//!
//! The accounting module produces `LedgerEntryPosted`; Budget and Goal consume
//! it. Each consumer is gated on its own activation, never on the producer's.

use crate::event::domain::DomainEvent;
use crate::listener::{
    module_enabled_for, EventContext, Listener, ListenerError, ListenerOutcome, SkipReason,
};
use crate::model::ledger::{EntrySide, LedgerEntry};
use crate::module::id::ModuleId;
use crate::module::registry::ModuleRegistry;
use crate::repo::ledger_repo::{GoalRecord, LedgerRepository, SqliteLedgerRepository};
use crate::repo::RepoResult;
use log::{debug, info};
use rusqlite::Connection;
use std::sync::Arc;

/// Module-specific effect of one posted ledger entry.
pub trait Reaction: Send + Sync {
    fn module(&self) -> ModuleId;
    /// Applies the entry. `None` means the entry is not relevant to this
    /// module; `Some(n)` counts rows changed (0 for a replayed entry).
    fn react(&self, entry: &LedgerEntry, conn: &Connection) -> RepoResult<Option<usize>>;
}

/// Adds debits on a budgeted account to its spend-to-date.
#[derive(Debug, Default, Clone, Copy)]
pub struct BudgetSpendReaction;

impl Reaction for BudgetSpendReaction {
    fn module(&self) -> ModuleId {
        ModuleId::Budget
    }

    fn react(&self, entry: &LedgerEntry, conn: &Connection) -> RepoResult<Option<usize>> {
        if entry.side != EntrySide::Debit {
            return Ok(None);
        }
        let repo = SqliteLedgerRepository::new(conn);
        let Some(budget) = repo.find_budget(entry.tenant_uuid, &entry.account_code)? else {
            return Ok(None);
        };
        let applied = repo.apply_to_budget(&budget, entry)?;
        Ok(Some(usize::from(applied)))
    }
}

/// Adds credits on a goal's account to its contributed amount.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoalContributionReaction;

impl Reaction for GoalContributionReaction {
    fn module(&self) -> ModuleId {
        ModuleId::Goal
    }

    fn react(&self, entry: &LedgerEntry, conn: &Connection) -> RepoResult<Option<usize>> {
        if entry.side != EntrySide::Credit {
            return Ok(None);
        }
        let repo = SqliteLedgerRepository::new(conn);
        let Some(goal) = repo.find_goal(entry.tenant_uuid, &entry.account_code)? else {
            return Ok(None);
        };
        let applied = repo.contribute_to_goal(&goal, entry)?;
        if applied {
            if let Some(updated) = repo.find_goal(entry.tenant_uuid, &entry.account_code)? {
                if crossed_target(&goal, &updated) {
                    info!(
                        "event=goal_reached module=Goal status=ok goal={} contributed={} target={}",
                        updated.uuid, updated.contributed_cents, updated.target_cents
                    );
                }
            }
        }
        Ok(Some(usize::from(applied)))
    }
}

/// True only for the contribution that lifts a goal to its target.
fn crossed_target(before: &GoalRecord, after: &GoalRecord) -> bool {
    !before.is_reached() && after.is_reached()
}

/// Listener adapter gating a [`Reaction`] on its module's activation.
pub struct CrossModuleReactionListener<R> {
    name: String,
    reaction: R,
    registry: Arc<dyn ModuleRegistry>,
}

impl<R: Reaction> CrossModuleReactionListener<R> {
    pub fn new(reaction: R, registry: Arc<dyn ModuleRegistry>) -> Self {
        Self {
            name: format!("{}.ledger_reaction", reaction.module()),
            reaction,
            registry,
        }
    }
}

impl<R: Reaction> Listener for CrossModuleReactionListener<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn module(&self) -> Option<ModuleId> {
        Some(self.reaction.module())
    }

    fn handle(
        &self,
        event: &DomainEvent,
        ctx: &EventContext<'_>,
    ) -> Result<ListenerOutcome, ListenerError> {
        let DomainEvent::LedgerEntryPosted(posted) = event else {
            return Ok(ListenerOutcome::Skipped(SkipReason::NotApplicable));
        };
        let module = self.reaction.module();
        if !module_enabled_for(event, module, self.registry.as_ref()) {
            debug!(
                "event=ledger_reaction module={} status=skip reason=inactive tenant={}",
                module, posted.entry.tenant_uuid
            );
            return Ok(ListenerOutcome::Skipped(SkipReason::ModuleInactive));
        }

        match self.reaction.react(&posted.entry, ctx.conn)? {
            Some(changes) => Ok(ListenerOutcome::Applied { changes }),
            None => Ok(ListenerOutcome::Skipped(SkipReason::NotApplicable)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        crossed_target, BudgetSpendReaction, CrossModuleReactionListener, GoalContributionReaction,
    };
    use crate::db::open_db_in_memory;
    use crate::event::domain::{DomainEvent, LedgerEntryPosted};
    use crate::listener::{EventContext, Listener, ListenerOutcome, SkipReason};
    use crate::model::ledger::{EntrySide, LedgerEntry};
    use crate::model::tenant::TenantRecord;
    use crate::module::id::ModuleSet;
    use crate::module::registry::CachedModuleRegistry;
    use crate::repo::ledger_repo::{GoalRecord, LedgerRepository, SqliteLedgerRepository};
    use crate::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
    use std::sync::Arc;

    fn goal(contributed_cents: i64) -> GoalRecord {
        GoalRecord {
            uuid: uuid::Uuid::nil(),
            tenant_uuid: uuid::Uuid::nil(),
            account_code: "3000".to_string(),
            target_cents: 5_000,
            contributed_cents,
        }
    }

    #[test]
    fn goal_is_reached_only_by_the_crossing_contribution() {
        assert!(crossed_target(&goal(4_000), &goal(5_000)));
        assert!(crossed_target(&goal(0), &goal(7_500)));
        assert!(!crossed_target(&goal(5_000), &goal(6_000)));
        assert!(!crossed_target(&goal(1_000), &goal(4_999)));
    }

    fn posted(entry: &LedgerEntry) -> DomainEvent {
        DomainEvent::LedgerEntryPosted(LedgerEntryPosted {
            entry: entry.clone(),
        })
    }

    #[test]
    fn budget_counts_a_debit_once() {
        let conn = open_db_in_memory().unwrap();
        let tenant = TenantRecord::new("Acme", ModuleSet::parse_csv("Account,Budget"));
        SqliteTenantRepository::new(&conn)
            .create_tenant(&tenant)
            .unwrap();
        let ledger = SqliteLedgerRepository::new(&conn);
        ledger.create_budget(tenant.uuid, "6000", 50_000).unwrap();
        let entry = LedgerEntry::new(tenant.uuid, "6000", EntrySide::Debit, 1_250);
        ledger.insert_entry(&entry).unwrap();

        let registry = Arc::new(CachedModuleRegistry::from_sets([(
            tenant.uuid,
            tenant.modules.clone(),
        )]));
        let listener = CrossModuleReactionListener::new(BudgetSpendReaction, registry);
        let ctx = EventContext::new(&conn);

        assert_eq!(
            listener.handle(&posted(&entry), &ctx).unwrap(),
            ListenerOutcome::Applied { changes: 1 }
        );
        assert_eq!(
            listener.handle(&posted(&entry), &ctx).unwrap(),
            ListenerOutcome::Applied { changes: 0 }
        );
        let budget = ledger.find_budget(tenant.uuid, "6000").unwrap().unwrap();
        assert_eq!(budget.spent_cents, 1_250);
    }

    #[test]
    fn goal_is_gated_on_its_own_activation() {
        let conn = open_db_in_memory().unwrap();
        let tenant = TenantRecord::new("Acme", ModuleSet::parse_csv("Account"));
        SqliteTenantRepository::new(&conn)
            .create_tenant(&tenant)
            .unwrap();
        let ledger = SqliteLedgerRepository::new(&conn);
        ledger.create_goal(tenant.uuid, "3000", 10_000).unwrap();
        let entry = LedgerEntry::new(tenant.uuid, "3000", EntrySide::Credit, 500);
        ledger.insert_entry(&entry).unwrap();

        let registry = Arc::new(CachedModuleRegistry::from_sets([(
            tenant.uuid,
            tenant.modules.clone(),
        )]));
        let listener = CrossModuleReactionListener::new(GoalContributionReaction, registry);

        let outcome = listener
            .handle(&posted(&entry), &EventContext::new(&conn))
            .unwrap();

        assert_eq!(outcome, ListenerOutcome::Skipped(SkipReason::ModuleInactive));
        let goal = ledger.find_goal(tenant.uuid, "3000").unwrap().unwrap();
        assert_eq!(goal.contributed_cents, 0);
    }

    #[test]
    fn debit_is_not_applicable_to_goals() {
        let conn = open_db_in_memory().unwrap();
        let tenant = TenantRecord::new("Acme", ModuleSet::parse_csv("Goal"));
        SqliteTenantRepository::new(&conn)
            .create_tenant(&tenant)
            .unwrap();
        let entry = LedgerEntry::new(tenant.uuid, "3000", EntrySide::Debit, 500);
        let registry = Arc::new(CachedModuleRegistry::from_sets([(
            tenant.uuid,
            tenant.modules.clone(),
        )]));
        let listener = CrossModuleReactionListener::new(GoalContributionReaction, registry);

        let outcome = listener
            .handle(&posted(&entry), &EventContext::new(&conn))
            .unwrap();
        assert_eq!(outcome, ListenerOutcome::Skipped(SkipReason::NotApplicable));
    }
}
