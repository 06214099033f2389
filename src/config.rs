use crate::types::KubernetesResource;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Contents of a rules file.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesFile {
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    pub resource: KubernetesResource,
}

pub fn load_rules(path: &Path) -> anyhow::Result<RulesFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file '{}'", path.display()))?;
    parse_rules(&content)
        .with_context(|| format!("Failed to load rules file '{}'", path.display()))
}

pub fn parse_rules(content: &str) -> anyhow::Result<RulesFile> {
    let rules: RulesFile = serde_yaml::from_str(content)?;

    let mut seen = HashSet::new();
    for rule in &rules.rules {
        if rule.id.is_empty() {
            anyhow::bail!("Rule with empty id");
        }
        if !seen.insert(rule.id.as_str()) {
            anyhow::bail!("Duplicate rule id '{}'", rule.id);
        }
    }

    Ok(rules)
}

impl RulesFile {
    /// Rules to run: all of them when `ids` is empty, otherwise the named ones in file order.
    pub fn select(&self, ids: &[String]) -> anyhow::Result<Vec<&RuleConfig>> {
        if ids.is_empty() {
            return Ok(self.rules.iter().collect());
        }
        for id in ids {
            if !self.rules.iter().any(|r| &r.id == id) {
                anyhow::bail!("Unknown rule id '{}'", id);
            }
        }
        Ok(self
            .rules
            .iter()
            .filter(|r| ids.contains(&r.id))
            .collect())
    }
}
