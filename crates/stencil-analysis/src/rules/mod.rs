//! Pattern-based rule engine over raw template text.
//!
//! Runs the fixed rule table plus a few structural checks (escaping, loop
//! nesting, conditional shape, template size). Matches accumulate as
//! evidence, but each category yields at most one finding per template;
//! the scoring engine deducts per category, never per match.

pub mod table;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;
use stencil_core::config::AnalysisConfig;

use crate::loader::TemplateSource;
use self::table::Rule;

/// How many evidence snippets a single rule keeps.
const MAX_EVIDENCE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Info,
}

/// Whether a category deducts from the security score, the performance
/// score, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleDomain {
    Security,
    Performance,
    Informational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    HardcodedSecret,
    UnsafeOperation,
    PathTraversal,
    MissingEscaping,
    NestedLoop,
    ComplexConditional,
    RepeatedFilterChain,
    LargeTemplate,
    /// A rule abandoned by the scan-length bound; informational only.
    ScanBoundExceeded,
}

impl FindingCategory {
    pub fn domain(&self) -> RuleDomain {
        match self {
            Self::HardcodedSecret
            | Self::UnsafeOperation
            | Self::PathTraversal
            | Self::MissingEscaping => RuleDomain::Security,
            Self::NestedLoop
            | Self::ComplexConditional
            | Self::RepeatedFilterChain
            | Self::LargeTemplate => RuleDomain::Performance,
            Self::ScanBoundExceeded => RuleDomain::Informational,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HardcodedSecret => "hardcoded_secret",
            Self::UnsafeOperation => "unsafe_operation",
            Self::PathTraversal => "path_traversal",
            Self::MissingEscaping => "missing_escaping",
            Self::NestedLoop => "nested_loop",
            Self::ComplexConditional => "complex_conditional",
            Self::RepeatedFilterChain => "repeated_filter_chain",
            Self::LargeTemplate => "large_template",
            Self::ScanBoundExceeded => "scan_bound_exceeded",
        }
    }
}

/// One detected issue: a category, its severity, and the matches behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub severity: Severity,
    pub evidence: SmallVec<[String; 2]>,
}

static ESCAPE_FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*e(?:scape)?\b").expect("static pattern"));
static LOOP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*(for|endfor)\b").expect("static pattern"));
static IF_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*(?:el)?if\b([^%}]*)").expect("static pattern"));
static AND_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\band\b").expect("static pattern"));
static OR_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bor\b").expect("static pattern"));

/// Scan one template's raw text. Performance checks are skipped for
/// syntax-invalid templates; security checks always run.
pub fn scan(source: &TemplateSource, syntax_valid: bool, config: &AnalysisConfig) -> Vec<Finding> {
    let content = &source.content;
    let longest_line = content.lines().map(str::len).max().unwrap_or(0);
    let bound = config.effective_max_scan_line_len();
    let mut findings = Vec::new();

    apply_rules(&table::SECURITY_RULES, content, longest_line, bound, &mut findings);
    check_missing_escaping(content, &mut findings);

    if syntax_valid {
        apply_rules(&table::PERFORMANCE_RULES, content, longest_line, bound, &mut findings);
        check_nested_loops(content, &mut findings);
        check_complex_conditionals(content, &mut findings);
        check_large_template(source, config, &mut findings);
    }

    findings
}

fn apply_rules(
    rules: &'static [Rule],
    content: &str,
    longest_line: usize,
    bound: usize,
    findings: &mut Vec<Finding>,
) {
    for rule in rules {
        if longest_line > bound {
            push_evidence(
                findings,
                FindingCategory::ScanBoundExceeded,
                Severity::Info,
                format!(
                    "{} scan abandoned: line of {longest_line} bytes exceeds bound {bound}",
                    rule.category.as_str()
                ),
            );
            continue;
        }
        let mut evidence: SmallVec<[String; 2]> = SmallVec::new();
        let mut total = 0usize;
        for pattern in rule.patterns {
            for m in pattern.find_iter(content) {
                total += 1;
                if evidence.len() < MAX_EVIDENCE {
                    evidence.push(format!(
                        "line {}: {}",
                        line_of(content, m.start()),
                        snippet(m.as_str())
                    ));
                }
            }
        }
        if total > MAX_EVIDENCE {
            evidence.push(format!("{} further matches", total - MAX_EVIDENCE));
        }
        for item in evidence {
            push_evidence(findings, rule.category, rule.severity, item);
        }
    }
}

/// Variable output with no escape filter anywhere in the template.
fn check_missing_escaping(content: &str, findings: &mut Vec<Finding>) {
    if content.contains("{{") && !ESCAPE_FILTER.is_match(content) {
        push_evidence(
            findings,
            FindingCategory::MissingEscaping,
            Severity::Medium,
            "variable output without any escape filter".to_string(),
        );
    }
}

/// A `for` loop lexically containing another `for` loop. Sequential loops
/// do not count; only actual nesting depth >= 2 does.
fn check_nested_loops(content: &str, findings: &mut Vec<Finding>) {
    let mut depth = 0u32;
    for caps in LOOP_TAG.captures_iter(content) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
        if &caps[1] == "for" {
            depth += 1;
            if depth >= 2 {
                push_evidence(
                    findings,
                    FindingCategory::NestedLoop,
                    Severity::High,
                    format!("line {}: loop nested at depth {depth}", line_of(content, whole)),
                );
            }
        } else {
            depth = depth.saturating_sub(1);
        }
    }
}

/// An `if`/`elif` condition mixing `and` with `or`, in either order.
fn check_complex_conditionals(content: &str, findings: &mut Vec<Finding>) {
    for caps in IF_TAG.captures_iter(content) {
        let cond = &caps[1];
        if AND_WORD.is_match(cond) && OR_WORD.is_match(cond) {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            push_evidence(
                findings,
                FindingCategory::ComplexConditional,
                Severity::Medium,
                format!("line {}: {}", line_of(content, start), snippet(cond.trim())),
            );
        }
    }
}

fn check_large_template(
    source: &TemplateSource,
    config: &AnalysisConfig,
    findings: &mut Vec<Finding>,
) {
    let threshold = config.effective_large_template_lines();
    if source.line_count > threshold {
        push_evidence(
            findings,
            FindingCategory::LargeTemplate,
            Severity::Medium,
            format!("{} lines exceed threshold {threshold}", source.line_count),
        );
    }
}

/// Append evidence to the category's finding, creating it on first use.
/// Categories are unique within a template's findings list.
fn push_evidence(
    findings: &mut Vec<Finding>,
    category: FindingCategory,
    severity: Severity,
    item: String,
) {
    if let Some(existing) = findings.iter_mut().find(|f| f.category == category) {
        existing.evidence.push(item);
    } else {
        findings.push(Finding {
            category,
            severity,
            evidence: SmallVec::from_iter([item]),
        });
    }
}

fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].bytes().filter(|&b| b == b'\n').count() + 1
}

fn snippet(text: &str) -> String {
    let mut s: String = text.chars().take(60).collect();
    if s.len() < text.len() {
        s.push_str("...");
    }
    s
}
