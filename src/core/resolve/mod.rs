//! Lookups that turn caller-supplied values into registry identifiers
//!
//! - [`choices`] - categorical choice lists, code to label and back
//! - [`site`] - country prefix to data access group
//! - [`health`] - health status value to stored code

pub mod choices;
pub mod health;
pub mod site;

pub use choices::{choice_map, fetch_choice_map, ChoiceMap};
pub use health::{resolve_health, resolve_health_code, SYNONYMS};
pub use site::{resolve_site, resolve_site_group, site_key, MatchStrategy, SiteMatch, SITE_TABLE};
