//! Scoring engine: findings in, bounded scores and recommendations out.
//!
//! One declarative category-to-deduction table feeds both scores, and each
//! distinct category deducts exactly once. Scoring is pure: identical input
//! always produces identical scores.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use stencil_core::config::AnalysisConfig;

use crate::extract::TemplateFacts;
use crate::loader::TemplateSource;
use crate::rules::{Finding, FindingCategory, RuleDomain};

/// Fixed deduction applied when a template fails to parse.
pub const SYNTAX_ERROR_PENALTY: u32 = 20;

/// The single source of truth for per-category deductions.
pub fn deduction(category: FindingCategory) -> u32 {
    match category {
        FindingCategory::HardcodedSecret => 15,
        FindingCategory::UnsafeOperation => 10,
        FindingCategory::PathTraversal => 10,
        FindingCategory::MissingEscaping => 10,
        FindingCategory::NestedLoop => 20,
        FindingCategory::ComplexConditional => 10,
        FindingCategory::RepeatedFilterChain => 10,
        FindingCategory::LargeTemplate => 15,
        FindingCategory::ScanBoundExceeded => 0,
    }
}

/// Scores and recommendations for one template.
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    pub security_score: u32,
    /// Absent when the template is syntax-invalid.
    pub performance_score: Option<u32>,
    /// Absent when the template is syntax-invalid.
    pub complexity_score: Option<f64>,
    pub recommendations: Vec<String>,
}

static CONTROL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*(?:if|for|while)\b").expect("static pattern"));
static ELIF_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*elif\b").expect("static pattern"));
static FILTER_APP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\s*\w+").expect("static pattern"));
static SNAKE_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static pattern"));

/// Score one template from its findings, facts and raw text.
pub fn score(
    source: &TemplateSource,
    syntax_valid: bool,
    facts: Option<&TemplateFacts>,
    findings: &[Finding],
    config: &AnalysisConfig,
) -> Scores {
    let (security_deductions, performance_deductions) = distinct_deductions(findings);

    let mut security = 100i64 - i64::from(security_deductions);
    if !syntax_valid {
        security -= i64::from(SYNTAX_ERROR_PENALTY);
    }
    let security_score = security.clamp(0, 100) as u32;

    let performance_score = syntax_valid
        .then(|| (100i64 - i64::from(performance_deductions)).clamp(0, 100) as u32);

    let complexity_score = syntax_valid.then(|| complexity(&source.content, facts));

    let mut recommendations = Vec::new();
    if let Some(value) = complexity_score {
        if value > config.effective_complexity_threshold() {
            recommendations
                .push("Consider breaking down complex template into smaller components".to_string());
        }
    }
    best_practices(source, facts, &mut recommendations);

    Scores {
        security_score,
        performance_score,
        complexity_score,
        recommendations,
    }
}

/// Sum deductions once per distinct category, split by domain.
fn distinct_deductions(findings: &[Finding]) -> (u32, u32) {
    let mut seen: FxHashSet<FindingCategory> = FxHashSet::default();
    let mut security = 0u32;
    let mut performance = 0u32;
    for finding in findings {
        if !seen.insert(finding.category) {
            continue;
        }
        match finding.category.domain() {
            RuleDomain::Security => security += deduction(finding.category),
            RuleDomain::Performance => performance += deduction(finding.category),
            RuleDomain::Informational => {}
        }
    }
    (security, performance)
}

/// control tags + 0.5 per elif + 0.3 per filter application + 0.1 per free
/// variable, rounded to two decimals.
fn complexity(content: &str, facts: Option<&TemplateFacts>) -> f64 {
    let controls = CONTROL_TAG.find_iter(content).count() as f64;
    let elifs = ELIF_TAG.find_iter(content).count() as f64;
    let filters = FILTER_APP.find_iter(content).count() as f64;
    let variables = facts.map_or(0, |f| f.variables.len()) as f64;
    let raw = controls + 0.5 * elifs + 0.3 * filters + 0.1 * variables;
    (raw * 100.0).round() / 100.0
}

fn best_practices(
    source: &TemplateSource,
    facts: Option<&TemplateFacts>,
    recommendations: &mut Vec<String>,
) {
    if !source.content.contains("{#") {
        recommendations.push("Add template documentation using {# comments #}".to_string());
    }
    if has_mixed_indentation(&source.content) {
        recommendations.push("Use consistent indentation (spaces or tabs, not mixed)".to_string());
    }
    if let Some(facts) = facts {
        for var in &facts.variables {
            if !SNAKE_CASE.is_match(var) {
                recommendations
                    .push(format!("Variable '{var}' doesn't follow snake_case convention"));
            }
        }
    }
}

fn has_mixed_indentation(content: &str) -> bool {
    let mut uses_tabs: Option<bool> = None;
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent: &str = &line[..line.len() - line.trim_start().len()];
        if indent.is_empty() {
            continue;
        }
        let tabs = indent.contains('\t');
        let spaces = indent.contains(' ');
        if tabs && spaces {
            return true;
        }
        match uses_tabs {
            None => uses_tabs = Some(tabs),
            Some(t) if t != tabs => return true,
            Some(_) => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{scan, Severity};
    use smallvec::smallvec;

    fn score_src(content: &str) -> Scores {
        let source = TemplateSource::from_content("t.tmpl", content);
        let config = AnalysisConfig::default();
        let ast = crate::parser::parse(&source.content).ok();
        let facts = ast.as_deref().map(crate::extract::extract);
        let findings = scan(&source, ast.is_some(), &config);
        score(&source, ast.is_some(), facts.as_ref(), &findings, &config)
    }

    #[test]
    fn single_secret_scores_85() {
        let scores = score_src("password = \"abc12345\"");
        assert_eq!(scores.security_score, 85);
    }

    #[test]
    fn single_nested_loop_scores_80() {
        let scores = score_src(
            "{% for i in x %}{% for j in y %}{{ i|e }}{{ j|e }}{% endfor %}{% endfor %}",
        );
        assert_eq!(scores.performance_score, Some(80));
    }

    #[test]
    fn syntax_invalid_penalizes_security_and_skips_the_rest() {
        let scores = score_src("{% if broken %}{{ x|e }}");
        assert_eq!(scores.security_score, 80);
        assert_eq!(scores.performance_score, None);
        assert_eq!(scores.complexity_score, None);
    }

    #[test]
    fn duplicate_categories_deduct_only_once() {
        let source = TemplateSource::from_content("t.tmpl", "{{ x|e }}");
        let config = AnalysisConfig::default();
        let findings = vec![
            Finding {
                category: FindingCategory::HardcodedSecret,
                severity: Severity::High,
                evidence: smallvec!["line 1: password = \"a\"".to_string()],
            },
            Finding {
                category: FindingCategory::HardcodedSecret,
                severity: Severity::High,
                evidence: smallvec!["line 2: secret = 'b'".to_string()],
            },
        ];
        let scores = score(&source, true, None, &findings, &config);
        assert_eq!(scores.security_score, 85);
    }

    #[test]
    fn complexity_formula() {
        // 1 if + 1 elif (0.5) + 1 filter (0.3) + vars a, b, x (0.3)
        let scores = score_src("{% if a %}{% elif b %}{% endif %}{{ x | e }}");
        assert_eq!(scores.complexity_score, Some(2.1));
    }

    #[test]
    fn high_complexity_recommends_decomposition() {
        let mut content = String::new();
        for i in 0..25 {
            content.push_str(&format!("{{% if c{i} %}}ok{{% endif %}}\n"));
        }
        content.push_str("{{ x|e }}{# doc #}");
        let scores = score_src(&content);
        assert!(scores.complexity_score.unwrap() > 20.0);
        assert!(scores
            .recommendations
            .iter()
            .any(|r| r.contains("breaking down")));
    }

    #[test]
    fn best_practice_recommendations() {
        let scores = score_src("  spaces\n\ttabs\n{{ BadName|e }}");
        assert!(scores.recommendations.iter().any(|r| r.contains("{# comments #}")));
        assert!(scores.recommendations.iter().any(|r| r.contains("consistent indentation")));
        assert!(scores.recommendations.iter().any(|r| r.contains("'BadName'")));
    }

    #[test]
    fn scoring_is_deterministic() {
        let content = "password = \"x\"\n{% for i in xs %}{{ i }}{% endfor %}";
        assert_eq!(score_src(content), score_src(content));
    }
}
