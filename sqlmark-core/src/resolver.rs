//! Resolution of one statement to its call sites.
//!
//! Pipeline:
//!
//! ```text
//! literal occurrences of `id`  ──►  Matcher  ──►  evidence  ──►  Tracer  ──►  call sites
//!       (CorpusIndex)                (fold)                    (refs, calls)    (dedup)
//! ```
//!
//! Each request is independent: nothing is cached between calls and the
//! host is only read.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::cancel::{Cancellable, CancellationToken};
use crate::error::ResolveError;
use crate::matcher::{MatchStrategy, Matcher};
use crate::statement::TargetStatement;
use crate::syntax::{CallSite, SourceHost};
use crate::tracer::Tracer;

/// Counters describing one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    /// Literals containing the bare id.
    pub occurrences: usize,
    pub literal_equal: usize,
    pub binary_fold: usize,
    pub concat_fold: usize,
}

impl ResolutionStats {
    pub fn evidence(&self) -> usize {
        self.literal_equal + self.binary_fold + self.concat_fold
    }

    fn record(&mut self, strategy: MatchStrategy) {
        match strategy {
            MatchStrategy::LiteralEqual => self.literal_equal += 1,
            MatchStrategy::BinaryFold => self.binary_fold += 1,
            MatchStrategy::ConcatFold => self.concat_fold += 1,
        }
    }
}

/// Call sites of one statement, sorted by file and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub statement: TargetStatement,
    pub call_sites: Vec<CallSite>,
    pub stats: ResolutionStats,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.call_sites.is_empty()
    }
}

/// Find every call on `target_api` that receives `statement`'s full name
/// as its first argument.
///
/// Fails with [`ResolveError::NotConfigured`] for a blank API class
/// (without touching the host) and with [`ResolveError::Cancelled`] as soon
/// as cancellation is observed. No occurrences is an empty success.
#[instrument(level = "debug", skip_all, fields(statement = %statement, target_api = %target_api))]
pub fn resolve<H: SourceHost + ?Sized>(
    host: &H,
    statement: &TargetStatement,
    target_api: &str,
    cancel: &CancellationToken,
) -> Result<Resolution, ResolveError> {
    let target_api = target_api.trim();
    if target_api.is_empty() {
        return Err(ResolveError::NotConfigured);
    }
    ensure_running(cancel)?;

    let mut stats = ResolutionStats::default();

    // 1. Seed with the bare id: prefixes are often built separately.
    let occurrences = host.find_literal_occurrences(&statement.id);
    stats.occurrences = occurrences.len();

    // 2. Match
    let matcher = Matcher::new(host, statement);
    let mut seen_evidence = HashSet::new();
    let mut evidence = Vec::new();
    for literal in occurrences {
        ensure_running(cancel)?;
        if let Some(found) = matcher.matches(literal) {
            if seen_evidence.insert(found.node) {
                stats.record(found.strategy);
                evidence.push(found);
            }
        }
    }

    // 3. Trace
    let tracer = Tracer::new(host, target_api, cancel);
    let mut seen_calls = HashSet::new();
    let mut calls = Vec::new();
    for found in &evidence {
        ensure_running(cancel)?;
        match tracer.trace(found) {
            Ok(reached) => calls.extend(reached.into_iter().filter(|c| seen_calls.insert(*c))),
            Err(err) if err.is_cancellation() => return Err(ResolveError::Cancelled),
            Err(err) => debug!(error = %err, strategy = ?found.strategy, "trace failed"),
        }
    }

    // 4. Deduplicated by node identity above; sort for stable output.
    let mut call_sites: Vec<CallSite> = calls
        .into_iter()
        .filter_map(|call| host.call_site(call))
        .collect();
    call_sites.sort();
    call_sites.dedup();

    info!(
        occurrences = stats.occurrences,
        evidence = stats.evidence(),
        call_sites = call_sites.len(),
        "statement resolved"
    );

    Ok(Resolution {
        statement: statement.clone(),
        call_sites,
        stats,
    })
}

fn ensure_running(cancel: &CancellationToken) -> Result<(), ResolveError> {
    if cancel.is_cancelled() {
        Err(ResolveError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::JavaCorpus;

    fn corpus(src: &str) -> JavaCorpus {
        JavaCorpus::from_sources(vec![("Dao.java".into(), src.to_string())])
    }

    #[test]
    fn test_not_configured() {
        let corpus = corpus("class Dao {}");
        let host = corpus.host();
        let stmt = TargetStatement::new("ns", "sqlId");
        let token = CancellationToken::new();
        assert_eq!(resolve(&host, &stmt, "", &token), Err(ResolveError::NotConfigured));
        assert_eq!(resolve(&host, &stmt, "   ", &token), Err(ResolveError::NotConfigured));
    }

    #[test]
    fn test_no_occurrences_is_empty_success() {
        let corpus = corpus("class Dao { void a() { DBUtils.selectList(\"other\"); } }");
        let host = corpus.host();
        let stmt = TargetStatement::new("ns", "sqlId");
        let result = resolve(&host, &stmt, "DBUtils", &CancellationToken::new()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.stats, ResolutionStats::default());
    }

    #[test]
    fn test_cancelled_before_start() {
        let corpus = corpus("class Dao { void a() { DBUtils.selectList(\"ns.sqlId\"); } }");
        let host = corpus.host();
        let token = CancellationToken::new();
        token.cancel();
        let stmt = TargetStatement::new("ns", "sqlId");
        assert_eq!(resolve(&host, &stmt, "DBUtils", &token), Err(ResolveError::Cancelled));
    }

    #[test]
    fn test_two_occurrences_folding_to_one_evidence() {
        let src = r#"
class Dao {
    void a() {
        DBUtils.selectList("a" + ".a", p);
    }
}"#;
        let corpus = corpus(src);
        let host = corpus.host();
        let stmt = TargetStatement::new("a", "a");
        let result = resolve(&host, &stmt, "DBUtils", &CancellationToken::new()).unwrap();
        assert_eq!(result.stats.occurrences, 2);
        assert_eq!(result.stats.evidence(), 1);
        assert_eq!(result.call_sites.len(), 1);
        assert_eq!(result.call_sites[0].line, 4);
        assert_eq!(result.call_sites[0].method, "selectList");
    }

    #[test]
    fn test_only_first_argument_positions_count() {
        let src = r#"
class Dao {
    static final String NS = "ns.";
    void a() {
        DBUtils.selectList(NS + "sqlId", "sqlId");
        DBUtils.selectList(p, NS + "sqlId");
    }
}"#;
        let corpus = corpus(src);
        let host = corpus.host();
        let stmt = TargetStatement::new("ns", "sqlId");
        let result = resolve(&host, &stmt, "DBUtils", &CancellationToken::new()).unwrap();
        assert_eq!(result.stats.occurrences, 3);
        assert_eq!(result.stats.binary_fold, 2);
        assert_eq!(result.call_sites.len(), 1);
        assert_eq!(result.call_sites[0].line, 5);
    }

    #[test]
    fn test_stats_by_strategy() {
        let src = r#"
class Dao {
    void a() {
        DBUtils.selectList("ns.sqlId");
        DBUtils.selectList("ns." + "sqlId");
        DBUtils.selectList("ns.".concat("sqlId"));
    }
}"#;
        let corpus = corpus(src);
        let host = corpus.host();
        let stmt = TargetStatement::new("ns", "sqlId");
        let result = resolve(&host, &stmt, "DBUtils", &CancellationToken::new()).unwrap();
        assert_eq!(result.stats.literal_equal, 1);
        assert_eq!(result.stats.binary_fold, 1);
        assert_eq!(result.stats.concat_fold, 1);
        assert_eq!(result.call_sites.len(), 3);
        let lines: Vec<usize> = result.call_sites.iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![4, 5, 6]);
    }
}
