//! Query enrichment
//!
//! Cross-references detection queries against the tables each connector
//! feeds. A query is a hit for a connector when any of the connector's
//! tables appears in the query body as a whole word, ignoring case.
//! Normalization tokens are collected from hits only.

use once_cell::sync::Lazy;
use regex::Regex;
use solmap_artifact::{ConnectorRecord, QueryArtifact, QueryHit};
use std::collections::BTreeSet;

/// Tokens with the normalization-framework prefix (`ASIM_Authentication`)
static ASIM_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bASIM[_A-Za-z0-9]+").unwrap());

/// Information-model parser names (`imAuthentication`)
static IM_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bim[A-Z][A-Za-z0-9_]*").unwrap());

/// Union of the tables of every dependency associated with a connector
pub fn connector_tables(connector: &ConnectorRecord) -> BTreeSet<String> {
    connector
        .dependencies
        .iter()
        .flat_map(|d| d.tables.iter().cloned())
        .collect()
}

/// Normalization tokens referenced by a query body
pub fn normalization_tokens(query: &str) -> BTreeSet<String> {
    ASIM_TOKEN_RE
        .find_iter(query)
        .chain(IM_TOKEN_RE.find_iter(query))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Case-insensitive whole-word matcher for one table name
fn table_matcher(table: &str) -> Option<Regex> {
    match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(table))) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "cannot build table matcher");
            None
        }
    }
}

/// Attach query hits and normalization tokens to every connector.
///
/// Replaces any hits and tokens from an earlier call, so enriching twice
/// gives the same result as enriching once.
pub fn enrich(connectors: &mut [ConnectorRecord], queries: &[QueryArtifact]) {
    for connector in connectors.iter_mut() {
        let matchers: Vec<Regex> = connector_tables(connector)
            .iter()
            .filter_map(|t| table_matcher(t))
            .collect();

        let mut hits = Vec::new();
        let mut normalization = BTreeSet::new();

        for query in queries {
            if !matchers.iter().any(|re| re.is_match(&query.query)) {
                continue;
            }

            hits.push(QueryHit {
                name: query.name.clone(),
                path: query.path.clone(),
            });
            normalization.extend(normalization_tokens(&query.query));
        }

        tracing::debug!(
            connector = %connector.name,
            tables = matchers.len(),
            hits = hits.len(),
            tokens = normalization.len(),
            "enriched connector"
        );

        connector.hits = hits;
        connector.normalization = normalization;
    }
}
