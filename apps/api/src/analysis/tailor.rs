//! Tailoring engine — rewrites resume lines so a job's missing keywords
//! appear in the text, then rescores.
//!
//! Suggestions are whole-line `original → suggested` substitutions. Each
//! generator claims a distinct resume line, so applying one suggestion never
//! invalidates another's `original`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::ats_scorer::AtsScorer;
use crate::analysis::keywords::{
    rank_job_keywords, KeywordCategory, KeywordImportance, ResumeIndex,
};
use crate::analysis::sections::{split_sections, ResumeSection, SectionKind};
use crate::analysis::text::{
    count_occurrences, insert_after_first_ignore_case, is_bullet, word_count,
};

const MAX_KEYWORD_SUGGESTIONS: usize = 8;
const MIN_SECTION_COVERAGE: usize = 2;
const REINFORCEMENT_IMPACT: i32 = 10;
const LOW_DENSITY_IMPACT: i32 = 9;
const HIGH_DENSITY_IMPACT: i32 = -5;

const HIGH_PATTERNS: &[&str] = &[
    "python",
    "java",
    "javascript",
    "typescript",
    "react",
    "node",
    "sql",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "terraform",
    "machine learning",
    "cloud",
    "data",
    "api",
    "rust",
    "architect",
    "senior",
    "lead",
];

const MEDIUM_PATTERNS: &[&str] = &[
    "develop",
    "design",
    "manage",
    "test",
    "agile",
    "scrum",
    "team",
    "communicat",
    "analy",
    "project",
    "deploy",
    "optimi",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceTier {
    High,
    Medium,
    Low,
}

impl ImportanceTier {
    pub fn classify(keyword: &str) -> Self {
        let keyword = keyword.to_lowercase();
        if HIGH_PATTERNS.iter().any(|p| keyword.contains(p)) {
            ImportanceTier::High
        } else if MEDIUM_PATTERNS.iter().any(|p| keyword.contains(p)) {
            ImportanceTier::Medium
        } else {
            ImportanceTier::Low
        }
    }

    fn placement(&self) -> &'static str {
        match self {
            ImportanceTier::High => "Skills section and at least one experience bullet",
            ImportanceTier::Medium => "Experience section bullets",
            ImportanceTier::Low => "Summary section",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatch {
    pub keyword: String,
    pub present: bool,
    pub frequency: usize,
    pub importance: ImportanceTier,
    pub suggested_placement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailorSuggestion {
    pub section: String,
    /// Exact resume text to replace. Empty for advisory suggestions.
    pub original: String,
    pub suggested: String,
    pub reason: String,
    pub impact: i32,
}

impl TailorSuggestion {
    /// Advisory suggestions carry no text to substitute.
    pub fn is_applicable(&self) -> bool {
        !self.original.is_empty() && self.original != self.suggested
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoringResult {
    pub tailored_resume: String,
    pub ats_score: u8,
    pub original_score: u8,
    pub keyword_matches: Vec<KeywordMatch>,
    /// Highest impact first.
    pub suggestions: Vec<TailorSuggestion>,
    pub improvements: Vec<String>,
    pub applied_suggestions: usize,
}

/// Applies suggestions in order, each replacing the first resume line equal
/// to its `original`. Suggestions whose line no longer exists are skipped.
pub fn apply_suggestions<'a, I>(resume: &str, suggestions: I) -> (String, usize)
where
    I: IntoIterator<Item = &'a TailorSuggestion>,
{
    let mut text = resume.to_string();
    let mut applied = 0;
    for suggestion in suggestions.into_iter().filter(|s| s.is_applicable()) {
        match replace_line(&text, &suggestion.original, &suggestion.suggested) {
            Some(rewritten) => {
                text = rewritten;
                applied += 1;
            }
            None => {
                debug!(section = %suggestion.section, "suggestion original not found, skipping")
            }
        }
    }
    (text, applied)
}

/// Replaces the first whole line equal to `original`, keeping line endings.
fn replace_line(text: &str, original: &str, suggested: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len() + suggested.len());
    let mut replaced = false;
    for segment in text.split_inclusive('\n') {
        let body = segment.trim_end_matches(['\r', '\n']);
        if !replaced && body == original {
            out.push_str(suggested);
            out.push_str(&segment[body.len()..]);
            replaced = true;
        } else {
            out.push_str(segment);
        }
    }
    replaced.then_some(out)
}

#[derive(Debug, Clone, Default)]
pub struct TailorEngine {
    scorer: AtsScorer,
}

impl TailorEngine {
    pub fn new(scorer: AtsScorer) -> Self {
        Self { scorer }
    }

    /// Job keywords ranked by importance; the target role, when given, is
    /// analysed alongside the job description.
    pub fn job_keywords(&self, job_description: &str, target_role: Option<&str>) -> Vec<KeywordImportance> {
        match target_role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(role) => rank_job_keywords(&format!("{role}\n{job_description}")),
            None => rank_job_keywords(job_description),
        }
    }

    pub fn tailor(
        &self,
        resume_text: &str,
        job_description: &str,
        target_role: Option<&str>,
    ) -> TailoringResult {
        let job_keywords = self.job_keywords(job_description, target_role);
        let original = self.scorer.score(resume_text, &job_keywords);

        let keyword_matches = match_keywords(resume_text, &job_keywords);
        let sections = split_sections(resume_text);

        let mut claimed = HashSet::new();
        let mut suggestions =
            missing_keyword_suggestions(&sections, &job_keywords, &keyword_matches, &mut claimed);
        let added_keywords = suggestions.len();
        let reinforcement = reinforcement_suggestions(&sections, &job_keywords, &mut claimed);
        let reinforced_sections = reinforcement.len();
        suggestions.extend(reinforcement);
        suggestions.extend(self.density_suggestions(resume_text, &keyword_matches));
        suggestions.sort_by(|a, b| b.impact.cmp(&a.impact));

        let (tailored_resume, applied_suggestions) = apply_suggestions(resume_text, &suggestions);
        let tailored = self.scorer.score(&tailored_resume, &job_keywords);

        let mut improvements = Vec::new();
        if added_keywords > 0 {
            improvements.push(format!("Added {added_keywords} missing high-importance keywords"));
        }
        if reinforced_sections > 0 {
            improvements.push(format!(
                "Reinforced keyword coverage in {reinforced_sections} sections"
            ));
        }
        if tailored.score > original.score {
            improvements.push(format!(
                "ATS score improved from {} to {}",
                original.score, tailored.score
            ));
        }
        if applied_suggestions == 0 {
            improvements.push("No textual changes were applicable".to_string());
        }

        debug!(
            before = original.score,
            after = tailored.score,
            applied = applied_suggestions,
            "resume tailored"
        );

        TailoringResult {
            tailored_resume,
            ats_score: tailored.score,
            original_score: original.score,
            keyword_matches,
            suggestions,
            improvements,
            applied_suggestions,
        }
    }

    /// Advisory suggestions for keywords used too often or too rarely.
    fn density_suggestions(&self, resume_text: &str, matches: &[KeywordMatch]) -> Vec<TailorSuggestion> {
        let t = &self.scorer.thresholds;
        let words = word_count(resume_text).max(1) as f64;

        matches
            .iter()
            .filter(|m| m.present && m.frequency > 0)
            .filter_map(|m| {
                let density = m.frequency as f64 * 100.0 / words;
                if density > t.high_density_pct {
                    Some(TailorSuggestion {
                        section: "General".to_string(),
                        original: String::new(),
                        suggested: format!("Reduce repetition of '{}'", m.keyword),
                        reason: format!(
                            "Keyword density {density:.1}% exceeds {}% and may look like keyword stuffing",
                            t.high_density_pct
                        ),
                        impact: HIGH_DENSITY_IMPACT,
                    })
                } else if density < t.low_density_pct && m.importance == ImportanceTier::High {
                    Some(TailorSuggestion {
                        section: "General".to_string(),
                        original: String::new(),
                        suggested: format!("Mention '{}' in more places", m.keyword),
                        reason: format!(
                            "High-importance keyword density {density:.2}% is below {}%",
                            t.low_density_pct
                        ),
                        impact: LOW_DENSITY_IMPACT,
                    })
                } else {
                    None
                }
            })
            .collect()
    }
}

fn match_keywords(resume_text: &str, job_keywords: &[KeywordImportance]) -> Vec<KeywordMatch> {
    let index = ResumeIndex::new(resume_text);
    job_keywords
        .iter()
        .map(|kw| {
            let importance = ImportanceTier::classify(&kw.keyword);
            KeywordMatch {
                keyword: kw.keyword.clone(),
                present: index.contains(&kw.keyword),
                frequency: count_occurrences(index.text(), &kw.keyword.to_lowercase()),
                importance,
                suggested_placement: importance.placement().to_string(),
            }
        })
        .collect()
}

/// Skills for technical keywords, experience for action verbs, otherwise the
/// first section after the contact block.
fn best_section<'a>(sections: &'a [ResumeSection], category: KeywordCategory) -> Option<&'a ResumeSection> {
    let preferred = match category {
        KeywordCategory::Technical => Some(SectionKind::Skills),
        KeywordCategory::Action => Some(SectionKind::Experience),
        _ => None,
    };
    preferred
        .and_then(|kind| sections.iter().find(|s| s.kind == kind))
        .or_else(|| sections.iter().find(|s| s.kind != SectionKind::Header))
}

/// Picks an unclaimed line to rewrite: a bullet or a line mentioning
/// experience if present, else the first non-empty line.
fn pick_line<'a>(section: &'a ResumeSection, claimed: &HashSet<String>) -> Option<&'a String> {
    let mut candidates = section.content_lines().filter(|l| !claimed.contains(*l));
    let first = candidates.next()?;
    if is_bullet(first) || first.to_lowercase().contains("experience") {
        return Some(first);
    }
    candidates
        .find(|l| is_bullet(l) || l.to_lowercase().contains("experience"))
        .or(Some(first))
}

fn rewrite_with_keyword(line: &str, keyword: &str) -> String {
    if let Some(rewritten) = insert_after_first_ignore_case(line, "experience", &format!(" with {keyword}")) {
        rewritten
    } else if is_bullet(line) {
        format!("{} utilizing {keyword}", line.trim_end())
    } else {
        format!("{} ({keyword})", line.trim_end())
    }
}

fn missing_keyword_suggestions(
    sections: &[ResumeSection],
    job_keywords: &[KeywordImportance],
    matches: &[KeywordMatch],
    claimed: &mut HashSet<String>,
) -> Vec<TailorSuggestion> {
    let missing_high: Vec<&KeywordImportance> = job_keywords
        .iter()
        .zip(matches)
        .filter(|(_, m)| !m.present && m.importance == ImportanceTier::High)
        .map(|(kw, _)| kw)
        .take(MAX_KEYWORD_SUGGESTIONS)
        .collect();

    let mut suggestions = Vec::new();
    for kw in missing_high {
        let Some(section) = best_section(sections, kw.category) else {
            continue;
        };
        let Some(line) = pick_line(section, claimed) else {
            continue;
        };
        claimed.insert(line.clone());
        suggestions.push(TailorSuggestion {
            section: section.kind.label().to_string(),
            original: line.clone(),
            suggested: rewrite_with_keyword(line, &kw.keyword),
            reason: format!("Add missing high-importance keyword '{}'", kw.keyword),
            impact: (8 + kw.importance as i32).min(20),
        });
    }
    suggestions
}

/// Strengthens summary, experience and skills sections that mention fewer
/// than two job keywords.
fn reinforcement_suggestions(
    sections: &[ResumeSection],
    job_keywords: &[KeywordImportance],
    claimed: &mut HashSet<String>,
) -> Vec<TailorSuggestion> {
    let mut suggestions = Vec::new();

    for section in sections.iter().filter(|s| {
        matches!(
            s.kind,
            SectionKind::Summary | SectionKind::Experience | SectionKind::Skills
        )
    }) {
        let text = section.text().to_lowercase();
        let coverage = job_keywords
            .iter()
            .filter(|k| text.contains(&k.keyword.to_lowercase()))
            .count();
        if coverage >= MIN_SECTION_COVERAGE {
            continue;
        }

        let additions: Vec<&str> = job_keywords
            .iter()
            .filter(|k| ImportanceTier::classify(&k.keyword) != ImportanceTier::Low)
            .filter(|k| !text.contains(&k.keyword.to_lowercase()))
            .take(MIN_SECTION_COVERAGE - coverage)
            .map(|k| k.keyword.as_str())
            .collect();
        if additions.is_empty() {
            continue;
        }
        let Some(line) = pick_line(section, claimed) else {
            continue;
        };
        claimed.insert(line.clone());

        let suggested = if section.kind == SectionKind::Skills {
            format!("{}, {}", line.trim_end(), additions.join(", "))
        } else {
            format!("{} leveraging {}", line.trim_end(), additions.join(" and "))
        };
        suggestions.push(TailorSuggestion {
            section: section.kind.label().to_string(),
            original: line.clone(),
            suggested,
            reason: format!(
                "{} section mentions only {coverage} job keyword(s)",
                section.kind.label()
            ),
            impact: REINFORCEMENT_IMPACT,
        });
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Doe\n\
        Summary\n\
        Engineer focused on reliable services.\n\
        Experience\n\
        - Built internal tools for the support team\n\
        - Maintained billing services\n\
        Education\n\
        BSc Computer Science\n\
        Skills\n\
        Rust, Go\n";

    const JOB: &str = "We need Docker and Kubernetes. Python is required. Terraform preferred.";

    fn kw(keyword: &str, importance: u8, category: KeywordCategory) -> KeywordImportance {
        KeywordImportance {
            keyword: keyword.to_string(),
            importance,
            category,
            context: vec![],
        }
    }

    #[test]
    fn test_importance_tier_classifier() {
        assert_eq!(ImportanceTier::classify("python"), ImportanceTier::High);
        assert_eq!(ImportanceTier::classify("database"), ImportanceTier::High);
        assert_eq!(ImportanceTier::classify("testing"), ImportanceTier::Medium);
        assert_eq!(ImportanceTier::classify("kindness"), ImportanceTier::Low);
    }

    #[test]
    fn test_technical_keyword_targets_skills_section() {
        let sections = split_sections(RESUME);
        let keywords = vec![kw("docker", 8, KeywordCategory::Technical)];
        let matches = match_keywords(RESUME, &keywords);
        let mut claimed = HashSet::new();
        let suggestions = missing_keyword_suggestions(&sections, &keywords, &matches, &mut claimed);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].section, "Skills");
        assert_eq!(suggestions[0].original, "Rust, Go");
        assert_eq!(suggestions[0].suggested, "Rust, Go (docker)");
        assert_eq!(suggestions[0].impact, 16);
    }

    #[test]
    fn test_bullet_and_experience_rewrites() {
        assert_eq!(
            rewrite_with_keyword("- Built internal tools", "python"),
            "- Built internal tools utilizing python"
        );
        assert_eq!(
            rewrite_with_keyword("3 years of Experience in retail", "sql"),
            "3 years of Experience with sql in retail"
        );
        assert_eq!(rewrite_with_keyword("Rust, Go", "aws"), "Rust, Go (aws)");
    }

    #[test]
    fn test_action_keyword_without_experience_falls_back() {
        let resume = "Summary\n- Built things\n";
        let sections = split_sections(resume);
        let section = best_section(&sections, KeywordCategory::Action).unwrap();
        assert_eq!(section.kind, SectionKind::Summary);
    }

    #[test]
    fn test_suggestions_claim_distinct_lines() {
        let sections = split_sections(RESUME);
        let keywords = vec![
            kw("docker", 9, KeywordCategory::Technical),
            kw("kubernetes", 9, KeywordCategory::Technical),
        ];
        let matches = match_keywords(RESUME, &keywords);
        let mut claimed = HashSet::new();
        let suggestions = missing_keyword_suggestions(&sections, &keywords, &matches, &mut claimed);
        // Skills has a single line, so kubernetes gets no second rewrite of it.
        assert_eq!(suggestions.len(), 1);
        let (text, applied) = apply_suggestions(RESUME, &suggestions);
        assert_eq!(applied, 1);
        assert!(text.contains("Rust, Go (docker)"));
    }

    #[test]
    fn test_apply_rewrites_whole_line_not_earlier_substring() {
        let resume = "Summary\nRust, Go developer\nSkills\nRust, Go\n";
        let suggestions = vec![TailorSuggestion {
            section: "Skills".to_string(),
            original: "Rust, Go".to_string(),
            suggested: "Rust, Go (docker)".to_string(),
            reason: String::new(),
            impact: 16,
        }];
        let (text, applied) = apply_suggestions(resume, &suggestions);
        assert_eq!(applied, 1);
        assert_eq!(text, "Summary\nRust, Go developer\nSkills\nRust, Go (docker)\n");
    }

    #[test]
    fn test_replace_line_keeps_crlf_endings() {
        let text = "Skills\r\nRust, Go\r\n";
        assert_eq!(
            replace_line(text, "Rust, Go", "Rust, Go, Docker").as_deref(),
            Some("Skills\r\nRust, Go, Docker\r\n")
        );
        assert_eq!(replace_line(text, "Rust", "x"), None);
    }

    #[test]
    fn test_tailor_applies_every_claimed_line_when_lines_share_a_prefix() {
        let resume = "Summary\n\
            Rust, Go developer\n\
            Experience\n\
            - Maintained services\n\
            Education\n\
            BSc\n\
            Skills\n\
            Rust, Go\n";
        let result = TailorEngine::default().tailor(resume, "We need Docker.", None);

        let applicable = result.suggestions.iter().filter(|s| s.is_applicable()).count();
        assert!(applicable > 0);
        assert_eq!(result.applied_suggestions, applicable);
        assert_eq!(result.tailored_resume.lines().last(), Some("Rust, Go (docker)"));
        assert!(!result.tailored_resume.contains("Rust, Go (docker) developer"));
    }

    #[test]
    fn test_apply_skips_missing_originals_and_advisories() {
        let suggestions = vec![
            TailorSuggestion {
                section: "Skills".to_string(),
                original: "not in resume".to_string(),
                suggested: "x".to_string(),
                reason: String::new(),
                impact: 15,
            },
            TailorSuggestion {
                section: "General".to_string(),
                original: String::new(),
                suggested: "Reduce repetition".to_string(),
                reason: String::new(),
                impact: -5,
            },
            TailorSuggestion {
                section: "Skills".to_string(),
                original: "Rust, Go".to_string(),
                suggested: "Rust, Go, Docker".to_string(),
                reason: String::new(),
                impact: 10,
            },
        ];
        let (text, applied) = apply_suggestions(RESUME, &suggestions);
        assert_eq!(applied, 1);
        assert!(text.contains("Rust, Go, Docker"));
    }

    #[test]
    fn test_tailor_adds_keywords_and_never_reduces_coverage() {
        let engine = TailorEngine::default();
        let keywords = engine.job_keywords(JOB, None);
        let before = match_keywords(RESUME, &keywords).iter().filter(|m| m.present).count();

        let result = engine.tailor(RESUME, JOB, None);
        let after = match_keywords(&result.tailored_resume, &keywords)
            .iter()
            .filter(|m| m.present)
            .count();

        assert!(result.applied_suggestions > 0);
        assert!(after > before, "before {before}, after {after}");
        assert!(result.ats_score >= result.original_score);
        assert!(result
            .suggestions
            .windows(2)
            .all(|w| w[0].impact >= w[1].impact));
    }

    #[test]
    fn test_keyword_matches_cover_every_job_keyword() {
        let engine = TailorEngine::default();
        let result = engine.tailor(RESUME, JOB, None);
        let keywords = engine.job_keywords(JOB, None);
        assert_eq!(result.keyword_matches.len(), keywords.len());
        let rust = match_keywords(RESUME, &[kw("rust", 5, KeywordCategory::Technical)]);
        assert!(rust[0].present);
        assert_eq!(rust[0].frequency, 1);
    }

    #[test]
    fn test_high_density_produces_negative_advisory() {
        let resume = "Skills\nsql sql sql sql sql sql\nExperience\n- Wrote reports";
        let engine = TailorEngine::default();
        let matches = match_keywords(resume, &[kw("sql", 9, KeywordCategory::Technical)]);
        let advisories = engine.density_suggestions(resume, &matches);
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].impact, HIGH_DENSITY_IMPACT);
        assert!(!advisories[0].is_applicable());
    }

    #[test]
    fn test_reinforcement_targets_low_coverage_sections() {
        let sections = split_sections(RESUME);
        let keywords = vec![
            kw("python", 12, KeywordCategory::Technical),
            kw("docker", 9, KeywordCategory::Technical),
        ];
        let mut claimed = HashSet::new();
        let suggestions = reinforcement_suggestions(&sections, &keywords, &mut claimed);
        let skills = suggestions.iter().find(|s| s.section == "Skills").unwrap();
        assert_eq!(skills.suggested, "Rust, Go, python, docker");
        let experience = suggestions.iter().find(|s| s.section == "Experience").unwrap();
        assert_eq!(
            experience.suggested,
            "- Built internal tools for the support team leveraging python and docker"
        );
    }

    #[test]
    fn test_target_role_contributes_keywords() {
        let engine = TailorEngine::default();
        let with_role = engine.job_keywords("Build services.", Some("Kubernetes Engineer"));
        assert!(with_role.iter().any(|k| k.keyword == "kubernetes"));
        let without = engine.job_keywords("Build services.", None);
        assert!(!without.iter().any(|k| k.keyword == "kubernetes"));
    }
}
