//! Typed module tags and enabled-module sets.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One independently toggleable feature package.
///
/// Variant names double as the canonical module names used in enabled-module
/// lists (`"Hrm,Goal"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModuleId {
    Account,
    Budget,
    Contract,
    Goal,
    Hrm,
    Lead,
    Recruitment,
    Taskly,
    ZoomMeeting,
}

impl ModuleId {
    pub const ALL: [ModuleId; 9] = [
        Self::Account,
        Self::Budget,
        Self::Contract,
        Self::Goal,
        Self::Hrm,
        Self::Lead,
        Self::Recruitment,
        Self::Taskly,
        Self::ZoomMeeting,
    ];

    /// Canonical module name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Budget => "Budget",
            Self::Contract => "Contract",
            Self::Goal => "Goal",
            Self::Hrm => "Hrm",
            Self::Lead => "Lead",
            Self::Recruitment => "Recruitment",
            Self::Taskly => "Taskly",
            Self::ZoomMeeting => "ZoomMeeting",
        }
    }
}

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one canonical module name. Matching is exact after trimming.
pub fn parse_module_id(value: &str) -> Result<ModuleId, ModuleIdError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(ModuleIdError::EmptyName);
    }
    ModuleId::ALL
        .into_iter()
        .find(|module| module.as_str() == normalized)
        .ok_or_else(|| ModuleIdError::UnknownModule(normalized.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleIdError {
    EmptyName,
    UnknownModule(String),
}

impl Display for ModuleIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "module name must not be empty"),
            Self::UnknownModule(value) => write!(f, "module is unknown: {value}"),
        }
    }
}

impl Error for ModuleIdError {}

/// Set of modules enabled for one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleSet(BTreeSet<ModuleId>);

impl ModuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-joined module list such as `"Hrm,Goal"`.
    ///
    /// Blank entries are ignored. Unknown names are logged and skipped so a
    /// stale plan never blocks provisioning of the modules that do exist.
    pub fn parse_csv(value: &str) -> Self {
        let mut modules = BTreeSet::new();
        for raw in value.split(',') {
            match parse_module_id(raw) {
                Ok(module) => {
                    modules.insert(module);
                }
                Err(ModuleIdError::EmptyName) => {}
                Err(ModuleIdError::UnknownModule(name)) => {
                    debug!("event=module_name_unknown module=registry status=skip name={name}");
                }
            }
        }
        Self(modules)
    }

    pub fn contains(&self, module: ModuleId) -> bool {
        self.0.contains(&module)
    }

    pub fn insert(&mut self, module: ModuleId) -> bool {
        self.0.insert(module)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.0.iter().copied()
    }

    /// Modules present in `self` but not in `previous`.
    pub fn added_since(&self, previous: &ModuleSet) -> ModuleSet {
        Self(self.0.difference(&previous.0).copied().collect())
    }

    /// Canonical comma-joined form, sorted by module order.
    pub fn to_csv(&self) -> String {
        self.iter()
            .map(ModuleId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromIterator<ModuleId> for ModuleSet {
    fn from_iter<T: IntoIterator<Item = ModuleId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
