//! Country prefix to data access group resolution
//!
//! A participant's country code selects a site key from a fixed table. The
//! key is then matched against the project's data access groups with three
//! strategies of decreasing strictness; the first strategy that finds a group
//! wins.

use crate::adapters::redcap::RegistryProject;
use crate::domain::{BridgeError, DataAccessGroup, Result};
use std::fmt;

/// Country code prefixes and their site keys
pub const SITE_TABLE: &[(&str, &str)] = &[
    ("EL", "greece"),
    ("LT", "lithuania"),
    ("ES", "spain"),
    ("SE", "sweden"),
    ("TEST", "greece"),
];

/// Site key of a country code prefix (case-sensitive)
pub fn site_key(prefix: &str) -> Result<&'static str> {
    SITE_TABLE
        .iter()
        .find(|(code, _)| *code == prefix)
        .map(|(_, site)| *site)
        .ok_or_else(|| BridgeError::UnknownPrefix {
            prefix: prefix.to_string(),
        })
}

/// How a group was matched to a site key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Lower-cased `unique_group_name` equals the key
    UniqueName,
    /// Lower-cased display name equals the key
    DisplayName,
    /// Display name equals the key once spaces, `_` and `-` are dropped
    NormalizedDisplayName,
}

impl MatchStrategy {
    /// Strategies in the order they are tried
    pub const ORDER: [MatchStrategy; 3] = [
        MatchStrategy::UniqueName,
        MatchStrategy::DisplayName,
        MatchStrategy::NormalizedDisplayName,
    ];

    fn matches(&self, group: &DataAccessGroup, site: &str) -> bool {
        match self {
            MatchStrategy::UniqueName => group.unique_group_name.to_lowercase() == site,
            MatchStrategy::DisplayName => group.data_access_group_name.to_lowercase() == site,
            MatchStrategy::NormalizedDisplayName => {
                normalize(&group.data_access_group_name) == normalize(site)
            }
        }
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::UniqueName => "unique_name",
            MatchStrategy::DisplayName => "display_name",
            MatchStrategy::NormalizedDisplayName => "normalized_display_name",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .to_lowercase()
}

/// A resolved data access group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMatch {
    /// Site key the prefix mapped to
    pub site: &'static str,
    /// Group identifier to store on the record
    pub unique_group_name: String,
    /// Strategy that produced the match
    pub strategy: MatchStrategy,
}

/// Resolve a country prefix against a list of groups
///
/// # Errors
///
/// - `UnknownPrefix` when the prefix is not in [`SITE_TABLE`]
/// - `NoMatchingGroup` when no strategy finds a group; the message lists
///   every group that was considered
///
/// # Examples
///
/// ```
/// use redcap_bridge::core::resolve::{resolve_site_group, MatchStrategy};
/// use redcap_bridge::domain::DataAccessGroup;
///
/// let groups = vec![DataAccessGroup::new("site_gr", "Greece ")];
/// let found = resolve_site_group("EL", &groups).unwrap();
/// assert_eq!(found.unique_group_name, "site_gr");
/// assert_eq!(found.strategy, MatchStrategy::NormalizedDisplayName);
/// ```
pub fn resolve_site_group(prefix: &str, groups: &[DataAccessGroup]) -> Result<SiteMatch> {
    let site = site_key(prefix)?;

    for strategy in MatchStrategy::ORDER {
        if let Some(group) = groups.iter().find(|g| strategy.matches(g, site)) {
            return Ok(SiteMatch {
                site,
                unique_group_name: group.unique_group_name.clone(),
                strategy,
            });
        }
    }

    Err(BridgeError::NoMatchingGroup {
        site: site.to_string(),
        groups: serde_json::to_string(groups)?,
    })
}

/// Resolve a country prefix against the project's current groups
///
/// Groups are exported on every call.
pub async fn resolve_site(project: &dyn RegistryProject, prefix: &str) -> Result<SiteMatch> {
    // Unknown prefixes fail before any registry traffic
    site_key(prefix)?;

    let groups = project.export_dags().await?;
    let found = resolve_site_group(prefix, &groups)?;

    tracing::debug!(
        prefix = prefix,
        site = found.site,
        group = %found.unique_group_name,
        strategy = %found.strategy,
        "Resolved data access group"
    );

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::redcap::InMemoryProject;
    use test_case::test_case;

    #[test_case("EL", "greece")]
    #[test_case("LT", "lithuania")]
    #[test_case("ES", "spain")]
    #[test_case("SE", "sweden")]
    #[test_case("TEST", "greece")]
    fn test_site_table(prefix: &str, site: &str) {
        assert_eq!(site_key(prefix).unwrap(), site);
    }

    #[test_case("XX" ; "unknown")]
    #[test_case("el" ; "lower case")]
    #[test_case("" ; "empty")]
    fn test_unknown_prefix(prefix: &str) {
        let err = resolve_site_group(prefix, &[DataAccessGroup::new("greece", "Greece")])
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownPrefix { .. }));
    }

    #[test]
    fn test_unique_name_wins_before_display_name() {
        let groups = vec![
            DataAccessGroup::new("other", "greece"),
            DataAccessGroup::new("GREECE", "Hellas"),
        ];
        let found = resolve_site_group("EL", &groups).unwrap();
        assert_eq!(found.unique_group_name, "GREECE");
        assert_eq!(found.strategy, MatchStrategy::UniqueName);
    }

    #[test]
    fn test_display_name_match() {
        let groups = vec![DataAccessGroup::new("site_04", "Spain")];
        let found = resolve_site_group("ES", &groups).unwrap();
        assert_eq!(found.unique_group_name, "site_04");
        assert_eq!(found.strategy, MatchStrategy::DisplayName);
    }

    #[test]
    fn test_trailing_space_needs_normalization() {
        let groups = vec![DataAccessGroup::new("gr_site", "Greece ")];
        let found = resolve_site_group("EL", &groups).unwrap();
        assert_eq!(found.unique_group_name, "gr_site");
        assert_eq!(found.strategy, MatchStrategy::NormalizedDisplayName);
    }

    #[test]
    fn test_normalization_drops_separators() {
        let groups = vec![DataAccessGroup::new("lt", "Lith-u_ania")];
        let found = resolve_site_group("LT", &groups).unwrap();
        assert_eq!(found.unique_group_name, "lt");
    }

    #[test]
    fn test_no_matching_group_lists_groups() {
        let groups = vec![
            DataAccessGroup::new("greece", "Greece"),
            DataAccessGroup::new("spain", "Spain"),
        ];
        let err = resolve_site_group("SE", &groups).unwrap_err();
        match err {
            BridgeError::NoMatchingGroup { site, groups } => {
                assert_eq!(site, "sweden");
                assert!(groups.contains("greece"));
                assert!(groups.contains("Spain"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_groups() {
        let err = resolve_site_group("EL", &[]).unwrap_err();
        assert!(matches!(err, BridgeError::NoMatchingGroup { .. }));
    }

    #[tokio::test]
    async fn test_resolve_site_fetches_groups() {
        let project = InMemoryProject::default()
            .with_groups(vec![DataAccessGroup::new("sweden", "Sweden")]);
        let found = resolve_site(&project, "SE").await.unwrap();
        assert_eq!(found.unique_group_name, "sweden");
    }
}
