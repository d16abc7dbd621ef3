//! Corpus pipeline: parallel per-template analysis, then graph and summary.
//!
//! Phases loader through scoring run independently per template on the
//! rayon pool; nothing is shared or mutated across templates, and one
//! template's failure never blocks another. The inheritance graph and the
//! summary run single-threaded after the join, since they need every
//! template's facts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use stencil_core::config::AnalysisConfig;
use stencil_core::errors::PipelineError;
use tracing::{debug, info, warn};

use crate::extract;
use crate::graph::{self, GraphInput};
use crate::loader;
use crate::parser::ParsedTemplate;
use crate::report::{CorpusReport, Summary, TemplateAnalysis, REPORT_VERSION};
use crate::rules;
use crate::scoring;

static SUPER_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsuper\s*\(\s*\)").expect("static pattern"));

/// Analyzes a template corpus. Owns the base directory and configuration;
/// no process-wide state, so analyzers can run concurrently.
pub struct CorpusAnalyzer {
    base: PathBuf,
    config: AnalysisConfig,
}

impl CorpusAnalyzer {
    pub fn new(base: impl Into<PathBuf>, config: AnalysisConfig) -> Self {
        Self {
            base: base.into(),
            config,
        }
    }

    /// Run the full pipeline over the listed template paths.
    pub fn analyze(&self, listed: &[String]) -> CorpusReport {
        let analyses: Vec<TemplateAnalysis> = listed
            .par_iter()
            .map(|path| self.analyze_one(path))
            .collect();

        let inputs: Vec<GraphInput> = analyses
            .iter()
            .filter(|a| a.error.is_none())
            .map(|a| GraphInput {
                name: a.name.clone(),
                extends: a.extends.clone(),
                blocks: a.blocks.clone(),
                super_calls: a.super_calls,
            })
            .collect();
        let inheritance = graph::build(&inputs);

        let mut errors = Vec::new();
        if let Some(template) = &inheritance.cycle {
            warn!(template = %template, "inheritance cycle detected, classification skipped");
            errors.push(
                PipelineError::InheritanceCycle {
                    template: template.clone(),
                }
                .to_string(),
            );
        }

        let summary = summarize(listed.len(), &analyses, inheritance.base_templates.len());
        info!(
            total = summary.total_templates,
            valid = summary.valid_templates,
            issues = summary.total_issues,
            avg_security = summary.average_security_score,
            avg_performance = summary.average_performance_score,
            "corpus analysis complete"
        );

        CorpusReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: REPORT_VERSION.to_string(),
            summary,
            templates: analyses.into_iter().map(|a| (a.name.clone(), a)).collect(),
            inheritance_analysis: inheritance,
            errors,
        }
    }

    fn analyze_one(&self, listed: &str) -> TemplateAnalysis {
        let source = match loader::load_template(&self.base, listed) {
            Ok(source) => source,
            Err(err) => {
                warn!(template = %err.path(), error = %err, "skipping unreadable template");
                return TemplateAnalysis::load_failure(
                    loader::template_name(&self.base, listed),
                    err.to_string(),
                );
            }
        };
        debug!(template = %source.name, lines = source.line_count, "analyzing");

        let super_calls = SUPER_CALL.find_iter(&source.content).count() as u32;
        let parsed = ParsedTemplate::parse(source);
        let facts = parsed.ast.as_deref().map(extract::extract);
        let findings = rules::scan(&parsed.source, parsed.syntax_valid(), &self.config);
        let scores = scoring::score(
            &parsed.source,
            parsed.syntax_valid(),
            facts.as_ref(),
            &findings,
            &self.config,
        );
        TemplateAnalysis::from_parts(&parsed, facts, findings, scores, super_calls)
    }
}

/// Averages run over loaded templates only; load failures count as invalid.
/// An empty corpus yields zero averages with no division.
fn summarize(total: usize, analyses: &[TemplateAnalysis], depth: usize) -> Summary {
    let loaded: Vec<&TemplateAnalysis> = analyses.iter().filter(|a| a.error.is_none()).collect();
    let valid = loaded.len();
    let total_issues: usize = loaded.iter().map(|a| a.issue_count()).sum();
    let security_sum: u64 = loaded.iter().map(|a| u64::from(a.security_score)).sum();
    let performance_sum: u64 = loaded
        .iter()
        .map(|a| u64::from(a.performance_score.unwrap_or(0)))
        .sum();

    let average = |sum: u64| {
        if valid == 0 {
            0.0
        } else {
            round2(sum as f64 / valid as f64)
        }
    };

    Summary {
        total_templates: total,
        valid_templates: valid,
        invalid_templates: total - valid,
        total_issues,
        average_security_score: average(security_sum),
        average_performance_score: average(performance_sum),
        inheritance_depth: depth,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Read the newline-delimited template list. Failure here is fatal: the run
/// aborts with no partial report.
pub fn read_template_list(path: &Path) -> Result<Vec<String>, PipelineError> {
    let text = fs::read_to_string(path).map_err(|source| PipelineError::FatalInput {
        path: path.display().to_string(),
        source,
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_corpus_has_zero_averages_and_no_division_error() {
        let dir = tempfile::tempdir().unwrap();
        let analyzer = CorpusAnalyzer::new(dir.path(), AnalysisConfig::default());
        let report = analyzer.analyze(&[]);
        assert_eq!(report.summary.total_templates, 0);
        assert_eq!(report.summary.average_security_score, 0.0);
        assert_eq!(report.summary.average_performance_score, 0.0);
        assert!(!report.gate_failed());
    }

    #[test]
    fn unreadable_template_is_invalid_but_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.tmpl"), "{{ x|e }}{# doc #}").unwrap();
        let analyzer = CorpusAnalyzer::new(dir.path(), AnalysisConfig::default());
        let report = analyzer.analyze(&["ok.tmpl".into(), "gone.tmpl".into()]);

        assert_eq!(report.summary.total_templates, 2);
        assert_eq!(report.summary.valid_templates, 1);
        assert_eq!(report.summary.invalid_templates, 1);
        assert!(report.templates["gone.tmpl"].error.is_some());
        // the failed template is excluded from averages
        assert_eq!(report.summary.average_security_score, 100.0);
        assert!(report.gate_failed());
    }

    #[test]
    fn template_list_reading() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("templates.txt");
        let mut f = fs::File::create(&list).unwrap();
        writeln!(f, "a.tmpl").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "  b.tmpl  ").unwrap();

        let paths = read_template_list(&list).unwrap();
        assert_eq!(paths, vec!["a.tmpl", "b.tmpl"]);

        let err = read_template_list(&dir.path().join("absent.txt")).unwrap_err();
        assert!(err.is_fatal());
    }
}
