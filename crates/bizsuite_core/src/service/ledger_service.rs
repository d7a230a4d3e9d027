//! Ledger posting.

use crate::event::bus::EventBus;
use crate::event::domain::{DomainEvent, LedgerEntryPosted};
use crate::model::ledger::{LedgerEntry, LedgerEntryId};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use crate::repo::RepoError;
use crate::service::{publish_for_setup, SetupStatus};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum LedgerServiceError {
    NonPositiveAmount(i64),
    EmptyAccountCode,
    Repo(RepoError),
}

impl Display for LedgerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "ledger amount must be positive, got {amount}")
            }
            Self::EmptyAccountCode => write!(f, "ledger account code must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NonPositiveAmount(_) | Self::EmptyAccountCode => None,
        }
    }
}

impl From<RepoError> for LedgerServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of posting (or replaying) one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPosting {
    pub entry_id: LedgerEntryId,
    pub setup: SetupStatus,
}

pub struct LedgerService<'a> {
    conn: &'a Connection,
    bus: &'a EventBus,
}

impl<'a> LedgerService<'a> {
    pub fn new(conn: &'a Connection, bus: &'a EventBus) -> Self {
        Self { conn, bus }
    }

    /// Validates and stores an entry, then notifies consuming modules.
    pub fn post_entry(&self, entry: &LedgerEntry) -> Result<LedgerPosting, LedgerServiceError> {
        if entry.amount_cents <= 0 {
            return Err(LedgerServiceError::NonPositiveAmount(entry.amount_cents));
        }
        if entry.account_code.trim().is_empty() {
            return Err(LedgerServiceError::EmptyAccountCode);
        }

        let entry_id = SqliteLedgerRepository::new(self.conn).insert_entry(entry)?;
        info!(
            "event=ledger_post module=service status=ok tenant={} entry={} side={} amount={}",
            entry.tenant_uuid,
            entry_id,
            entry.side.as_str(),
            entry.amount_cents
        );
        Ok(LedgerPosting {
            entry_id,
            setup: self.announce(entry),
        })
    }

    /// Re-publishes a stored entry. Consumers count each entry once, so a
    /// replay only fills in reactions that previously failed.
    pub fn replay_entry(&self, entry_id: LedgerEntryId) -> Result<LedgerPosting, LedgerServiceError> {
        let entry = SqliteLedgerRepository::new(self.conn)
            .get_entry(entry_id)?
            .ok_or_else(|| RepoError::NotFound(format!("ledger entry {entry_id}")))?;
        Ok(LedgerPosting {
            entry_id,
            setup: self.announce(&entry),
        })
    }

    fn announce(&self, entry: &LedgerEntry) -> SetupStatus {
        let event = DomainEvent::LedgerEntryPosted(LedgerEntryPosted {
            entry: entry.clone(),
        });
        publish_for_setup(self.bus, self.conn, &event)
    }
}
