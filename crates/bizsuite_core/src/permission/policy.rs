//! Generic permission fan-out interpreter.
//!
//! Every module describes its default grants as data
//! ([`PermissionFanoutPolicy`]); one interpreter ([`fan_out`]) applies them.
//!
//! # Protocol
//! Per (module, role, permission) the state is `NotGranted` or `Granted`.
//! `NotGranted -> Granted` happens when the role matches one of the policy's
//! archetypes and the permission exists in the store. `Granted` is terminal.

use crate::model::role::{RoleArchetype, RoleId};
use crate::module::id::ModuleId;
use crate::permission::store::PermissionStore;
use crate::repo::RepoResult;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grant state of one permission for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantState {
    NotGranted,
    Granted,
}

/// Default permissions a module hands to a set of archetype roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionFanoutPolicy {
    pub archetypes: BTreeSet<RoleArchetype>,
    /// Granted in listed order.
    pub permissions: Vec<String>,
}

impl PermissionFanoutPolicy {
    pub fn new(archetypes: &[RoleArchetype], permissions: &[&str]) -> Self {
        Self {
            archetypes: archetypes.iter().copied().collect(),
            permissions: permissions.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Whether a role with the given name is covered by this policy.
    ///
    /// A missing role name never matches.
    pub fn applies_to(&self, role_name: Option<&str>) -> bool {
        role_name
            .and_then(RoleArchetype::from_role_name)
            .is_some_and(|archetype| self.archetypes.contains(&archetype))
    }
}

/// Outcome of one fan-out run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub granted: Vec<String>,
    pub already_held: Vec<String>,
    pub skipped_unknown: Vec<String>,
}

impl FanoutReport {
    pub fn changed(&self) -> usize {
        self.granted.len()
    }

    fn merge(&mut self, other: FanoutReport) {
        self.granted.extend(other.granted);
        self.already_held.extend(other.already_held);
        self.skipped_unknown.extend(other.skipped_unknown);
    }
}

/// Current state of one permission for a role.
pub fn grant_state(
    store: &impl PermissionStore,
    role: RoleId,
    permission: &str,
) -> RepoResult<GrantState> {
    if store.has_granted(role, permission)? {
        Ok(GrantState::Granted)
    } else {
        Ok(GrantState::NotGranted)
    }
}

/// Applies every policy of `module` to one role.
///
/// Unknown permission names are skipped one by one; the rest of the list is
/// still granted. Store failures abort the run and propagate.
pub fn fan_out(
    store: &impl PermissionStore,
    module: ModuleId,
    policies: &[PermissionFanoutPolicy],
    role: RoleId,
    role_name: Option<&str>,
) -> RepoResult<FanoutReport> {
    let mut report = FanoutReport::default();
    for policy in policies {
        if !policy.applies_to(role_name) {
            continue;
        }
        report.merge(apply_policy(store, module, policy, role)?);
    }
    Ok(report)
}

fn apply_policy(
    store: &impl PermissionStore,
    module: ModuleId,
    policy: &PermissionFanoutPolicy,
    role: RoleId,
) -> RepoResult<FanoutReport> {
    let mut report = FanoutReport::default();
    for permission in &policy.permissions {
        if !store.exists(permission)? {
            warn!(
                "event=permission_unknown module={} status=skip permission={}",
                module, permission
            );
            report.skipped_unknown.push(permission.clone());
            continue;
        }

        match grant_state(store, role, permission)? {
            GrantState::Granted => report.already_held.push(permission.clone()),
            GrantState::NotGranted => {
                store.grant(role, permission)?;
                report.granted.push(permission.clone());
            }
        }
    }
    Ok(report)
}
