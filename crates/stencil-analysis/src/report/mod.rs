//! Report schema: the serialized output of a corpus run.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::extract::{MacroFacts, TemplateFacts};
use crate::graph::InheritanceGraph;
use crate::parser::ParsedTemplate;
use crate::rules::{Finding, RuleDomain};
use crate::scoring::Scores;

/// Schema version of the report.
pub const REPORT_VERSION: &str = "1.0.0";

/// The per-template analysis record. Created once, immutable afterward.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateAnalysis {
    #[serde(skip)]
    pub name: String,
    pub path: String,
    pub size: u64,
    pub lines: usize,
    pub hash: String,
    pub syntax_valid: bool,
    pub variables: BTreeSet<String>,
    pub blocks: Vec<String>,
    pub macros: Vec<MacroFacts>,
    pub includes: Vec<String>,
    pub extends: Option<String>,
    pub security_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity_score: Option<f64>,
    pub security_issues: Vec<Finding>,
    pub performance_issues: Vec<Finding>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub informational: Vec<Finding>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub super_calls: u32,
}

impl TemplateAnalysis {
    /// Assemble the record for a template that loaded successfully.
    pub fn from_parts(
        parsed: &ParsedTemplate,
        facts: Option<TemplateFacts>,
        findings: Vec<Finding>,
        scores: Scores,
        super_calls: u32,
    ) -> Self {
        let mut security_issues = Vec::new();
        let mut performance_issues = Vec::new();
        let mut informational = Vec::new();
        for finding in findings {
            match finding.category.domain() {
                RuleDomain::Security => security_issues.push(finding),
                RuleDomain::Performance => performance_issues.push(finding),
                RuleDomain::Informational => informational.push(finding),
            }
        }
        let facts = facts.unwrap_or_default();
        Self {
            name: parsed.source.name.clone(),
            path: parsed.source.name.clone(),
            size: parsed.source.size,
            lines: parsed.source.line_count,
            hash: parsed.source.content_hash.clone(),
            syntax_valid: parsed.syntax_valid(),
            variables: facts.variables,
            blocks: facts.blocks,
            macros: facts.macros,
            includes: facts.includes,
            extends: facts.extends,
            security_score: scores.security_score,
            performance_score: scores.performance_score,
            complexity_score: scores.complexity_score,
            security_issues,
            performance_issues,
            informational,
            recommendations: scores.recommendations,
            syntax_error: parsed.syntax_error.as_ref().map(ToString::to_string),
            error: None,
            super_calls,
        }
    }

    /// The record for a template that could not be read or decoded.
    pub fn load_failure(name: String, error: String) -> Self {
        Self {
            path: name.clone(),
            name,
            size: 0,
            lines: 0,
            hash: String::new(),
            syntax_valid: false,
            variables: BTreeSet::new(),
            blocks: Vec::new(),
            macros: Vec::new(),
            includes: Vec::new(),
            extends: None,
            security_score: 0,
            performance_score: None,
            complexity_score: None,
            security_issues: Vec::new(),
            performance_issues: Vec::new(),
            informational: Vec::new(),
            recommendations: Vec::new(),
            syntax_error: None,
            error: Some(error),
            super_calls: 0,
        }
    }

    /// Count of scored (HIGH/MEDIUM) findings on this template.
    pub fn issue_count(&self) -> usize {
        self.security_issues.len() + self.performance_issues.len()
    }
}

/// Corpus-wide statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total_templates: usize,
    pub valid_templates: usize,
    pub invalid_templates: usize,
    pub total_issues: usize,
    pub average_security_score: f64,
    pub average_performance_score: f64,
    pub inheritance_depth: usize,
}

/// The full report of one run. Built once, read-only thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub timestamp: String,
    pub version: String,
    pub summary: Summary,
    pub templates: BTreeMap<String, TemplateAnalysis>,
    pub inheritance_analysis: InheritanceGraph,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CorpusReport {
    /// CI gate: non-zero exit when any issue or unreadable template exists.
    pub fn gate_failed(&self) -> bool {
        self.summary.total_issues > 0 || self.summary.invalid_templates > 0
    }
}
