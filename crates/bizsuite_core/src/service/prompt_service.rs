//! AI prompt template lookup with tenant and platform overrides.

use crate::model::tenant::TenantId;
use crate::module::id::ModuleId;
use crate::repo::prompt_repo::{PromptRepository, PromptScope};
use crate::repo::RepoResult;
use log::debug;

const GENERIC_TEMPLATE: &str = "You are an assistant for a business application. {input}";

/// Built-in templates by prompt key, used when nothing is stored.
const BUILT_IN_TEMPLATES: &[(&str, &str)] = &[
    (
        "description",
        "Write a short, professional description for: {input}",
    ),
    (
        "email_reply",
        "Draft a polite email reply to the following message: {input}",
    ),
    ("summary", "Summarise the following text in three sentences: {input}"),
    (
        "job_description",
        "Write a job description with responsibilities and requirements for: {input}",
    ),
];

/// Which tier supplied a resolved template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Tenant,
    Platform,
    BuiltIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptResolution {
    pub template: String,
    pub source: PromptSource,
}

pub struct PromptService<R: PromptRepository> {
    repo: R,
}

impl<R: PromptRepository> PromptService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a tenant override, or the platform default when `tenant` is
    /// `None`.
    pub fn set_prompt(
        &self,
        tenant: Option<TenantId>,
        module: ModuleId,
        key: &str,
        template: &str,
    ) -> RepoResult<()> {
        let scope = tenant.map_or(PromptScope::Platform, PromptScope::Tenant);
        self.repo.upsert_prompt(scope, module, key.trim(), template)
    }

    /// Resolves tenant override, then platform default, then built-in.
    pub fn resolve_prompt(
        &self,
        tenant: TenantId,
        module: ModuleId,
        key: &str,
    ) -> RepoResult<PromptResolution> {
        let key = key.trim();
        let tiers = [
            (PromptScope::Tenant(tenant), PromptSource::Tenant),
            (PromptScope::Platform, PromptSource::Platform),
        ];
        for (scope, source) in tiers {
            if let Some(template) = self.repo.find_prompt(scope, module, key)? {
                debug!(
                    "event=prompt_resolve module={} status=ok key={} source={:?}",
                    module, key, source
                );
                return Ok(PromptResolution { template, source });
            }
        }

        Ok(PromptResolution {
            template: built_in_template(key).to_string(),
            source: PromptSource::BuiltIn,
        })
    }
}

/// Built-in template for `key`, or the generic one for unknown keys.
pub fn built_in_template(key: &str) -> &'static str {
    BUILT_IN_TEMPLATES
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(GENERIC_TEMPLATE, |(_, template)| *template)
}
