//! ATS Scorer — a 0–100 compatibility score from five weighted sub-scores.
//!
//! overall = round(0.40·keywords + 0.25·content + 0.15·structure
//!                 + 0.10·format + 0.10·length)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::keywords::{KeywordImportance, ResumeIndex};
use crate::analysis::sections::{detect_sections, SectionKind};
use crate::analysis::text::{contains_whole_word, word_count};

const COMPLEX_FORMATTING_MARKERS: &[char] = &['|', '│', '┃', '┌', '└', '═', '║', '╔'];

const ACTION_VERBS: &[&str] = &[
    "achieved",
    "improved",
    "developed",
    "managed",
    "created",
    "implemented",
    "designed",
    "led",
    "increased",
    "reduced",
];

const GENERIC_PHRASES: &[&str] = &["responsible for", "duties included", "worked on"];

const ESSENTIAL_SECTIONS: &[SectionKind] = &[
    SectionKind::Experience,
    SectionKind::Skills,
    SectionKind::Education,
];

const BENEFICIAL_SECTIONS: &[SectionKind] = &[
    SectionKind::Summary,
    SectionKind::Projects,
    SectionKind::Certifications,
];

const IDEAL_ORDER: &[SectionKind] = &[
    SectionKind::Summary,
    SectionKind::Experience,
    SectionKind::Education,
    SectionKind::Skills,
    SectionKind::Projects,
    SectionKind::Certifications,
];

static UNUSUAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,!?()-]").expect("valid character class regex"));

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Sub-score weights. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub keyword_match: f64,
    pub content: f64,
    pub structure: f64,
    pub format: f64,
    pub length: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword_match: 0.40,
            content: 0.25,
            structure: 0.15,
            format: 0.10,
            length: 0.10,
        }
    }
}

impl ScoringWeights {
    /// Weighted sum of the five sub-scores, rounded and clamped to 0–100.
    pub fn combine(&self, s: &SubScores) -> u8 {
        let total = self.keyword_match * s.keyword_match as f64
            + self.content * s.content as f64
            + self.structure * s.structure as f64
            + self.format * s.format as f64
            + self.length * s.length as f64;
        total.round().clamp(0.0, 100.0) as u8
    }
}

/// Policy thresholds with no derivation beyond convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringThresholds {
    pub passing_score: u8,
    /// Keywords at or above this importance are "critical".
    pub critical_importance: u8,
    pub keyword_cutoff: u8,
    pub section_cutoff: u8,
    pub max_recommendations: usize,
    /// Keyword density bounds in percent of resume words.
    pub low_density_pct: f64,
    pub high_density_pct: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            passing_score: 70,
            critical_importance: 8,
            keyword_cutoff: 70,
            section_cutoff: 80,
            max_recommendations: 5,
            low_density_pct: 0.5,
            high_density_pct: 3.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub keyword_match: u8,
    pub content: u8,
    pub structure: u8,
    pub format: u8,
    pub length: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatchScore {
    pub score: u8,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    pub score: u8,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureScore {
    pub score: u8,
    pub sections_found: Vec<SectionKind>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthScore {
    pub score: u8,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub keyword_match: KeywordMatchScore,
    pub content: DimensionScore,
    pub structure: StructureScore,
    pub format: DimensionScore,
    pub length: LengthScore,
}

impl ScoreBreakdown {
    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            keyword_match: self.keyword_match.score,
            content: self.content.score,
            structure: self.structure.score,
            format: self.format.score,
            length: self.length.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsScoreResult {
    /// 0 – 100
    pub score: u8,
    pub breakdown: ScoreBreakdown,
    /// At most five, most pressing first.
    pub recommendations: Vec<String>,
    #[serde(rename = "passesATS")]
    pub passes_ats: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

/// Stateless scorer; weights and thresholds are fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct AtsScorer {
    pub weights: ScoringWeights,
    pub thresholds: ScoringThresholds,
}

impl AtsScorer {
    pub fn new(weights: ScoringWeights, thresholds: ScoringThresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    pub fn score(&self, resume_text: &str, job_keywords: &[KeywordImportance]) -> AtsScoreResult {
        let index = ResumeIndex::new(resume_text);

        let breakdown = ScoreBreakdown {
            keyword_match: keyword_match_score(&index, job_keywords),
            content: content_score(index.text()),
            structure: structure_score(resume_text),
            format: format_score(resume_text),
            length: length_score(resume_text),
        };

        let score = self.weights.combine(&breakdown.sub_scores());
        let critical_missing: Vec<&str> = job_keywords
            .iter()
            .filter(|k| k.importance >= self.thresholds.critical_importance)
            .filter(|k| breakdown.keyword_match.missing.contains(&k.keyword))
            .take(3)
            .map(|k| k.keyword.as_str())
            .collect();
        let recommendations = self.recommendations(&breakdown, &critical_missing);

        AtsScoreResult {
            score,
            passes_ats: score >= self.thresholds.passing_score,
            breakdown,
            recommendations,
        }
    }

    fn recommendations(&self, b: &ScoreBreakdown, critical_missing: &[&str]) -> Vec<String> {
        let t = &self.thresholds;
        let mut recs = Vec::new();

        if b.keyword_match.score < t.keyword_cutoff {
            if critical_missing.is_empty() {
                recs.push("Incorporate more keywords from the job description".to_string());
            } else {
                recs.push(format!(
                    "Add missing critical keywords: {}",
                    critical_missing.join(", ")
                ));
            }
        }
        if b.content.score < t.section_cutoff {
            recs.push(
                "Quantify achievements with numbers, percentages, or dollar amounts and lead with strong action verbs"
                    .to_string(),
            );
        }
        if b.structure.score < t.section_cutoff {
            recs.push(
                "Use standard section headings (Summary, Experience, Education, Skills) in a conventional order"
                    .to_string(),
            );
        }
        if b.format.score < t.section_cutoff {
            recs.push(
                "Simplify formatting: avoid tables, special characters, and irregular spacing"
                    .to_string(),
            );
        }
        if b.length.score < t.section_cutoff {
            if b.length.word_count < 400 {
                recs.push("Expand your resume with more detail on roles and results (aim for 400-800 words)".to_string());
            } else {
                recs.push("Condense your resume to roughly 400-800 words".to_string());
            }
        }

        recs.truncate(t.max_recommendations);
        recs
    }
}

fn percent(part: u32, total: u32) -> u8 {
    if total == 0 {
        return 100;
    }
    ((part as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

/// Importance-weighted share of job keywords found in the resume.
fn keyword_match_score(index: &ResumeIndex, job_keywords: &[KeywordImportance]) -> KeywordMatchScore {
    let mut matched = Vec::new();
    let mut missing = Vec::new();
    let mut total = 0u32;
    let mut found = 0u32;

    for kw in job_keywords {
        total += kw.importance as u32;
        if index.contains(&kw.keyword) {
            found += kw.importance as u32;
            matched.push(kw.keyword.clone());
        } else {
            missing.push(kw.keyword.clone());
        }
    }

    KeywordMatchScore {
        score: percent(found, total),
        matched,
        missing,
    }
}

fn format_score(text: &str) -> DimensionScore {
    let lower = text.to_lowercase();
    let mut score = 100i32;
    let mut issues = Vec::new();

    let complex = text.contains(COMPLEX_FORMATTING_MARKERS)
        || text.lines().any(|l| l.matches('\t').count() >= 2);
    if complex {
        score -= 15;
        issues.push("Complex formatting such as tables or columns detected".to_string());
    }
    if UNUSUAL_CHARS.is_match(text) {
        score -= 10;
        issues.push("Unusual characters may not parse correctly".to_string());
    }
    if text.contains('\t') || text.contains("  ") {
        score -= 5;
        issues.push("Inconsistent spacing (tabs or double spaces)".to_string());
    }
    let missing_markers: Vec<&str> = ["experience", "education", "skill"]
        .into_iter()
        .filter(|m| !lower.contains(m))
        .collect();
    if !missing_markers.is_empty() {
        score -= 20;
        issues.push(format!("Missing standard sections: {}", missing_markers.join(", ")));
    }

    DimensionScore {
        score: score.max(0) as u8,
        issues,
    }
}

/// Expects lower-cased resume text.
fn content_score(lower: &str) -> DimensionScore {
    let mut score = 100i32;
    let mut issues = Vec::new();

    let quantified = lower.chars().any(|c| c.is_ascii_digit() || c == '%' || c == '$');
    if !quantified {
        score -= 15;
        issues.push("No quantifiable achievements (numbers, percentages, dollar amounts)".to_string());
    }
    if !ACTION_VERBS.iter().any(|v| contains_whole_word(lower, v)) {
        score -= 10;
        issues.push("No strong action verbs".to_string());
    }
    if !lower.contains("skill") {
        score -= 20;
        issues.push("No skills mentioned".to_string());
    }
    if GENERIC_PHRASES.iter().any(|p| lower.contains(p)) {
        score -= 12;
        issues.push("Generic phrases such as \"responsible for\" weaken impact".to_string());
    }

    DimensionScore {
        score: score.max(0) as u8,
        issues,
    }
}

/// Word-count bands: 400–800 optimal, widening bands score lower.
pub fn length_band_score(words: usize) -> u8 {
    match words {
        400..=800 => 100,
        300..=1000 => 85,
        200..=1200 => 70,
        0..=199 => 40,
        _ => 50,
    }
}

fn length_score(text: &str) -> LengthScore {
    let words = word_count(text);
    LengthScore {
        score: length_band_score(words),
        word_count: words,
    }
}

fn in_ideal_order(sections: &[SectionKind]) -> bool {
    let positions: Vec<usize> = sections
        .iter()
        .filter_map(|s| IDEAL_ORDER.iter().position(|i| i == s))
        .collect();
    positions.len() >= 2 && positions.windows(2).all(|w| w[0] < w[1])
}

fn structure_score(text: &str) -> StructureScore {
    let sections = detect_sections(text);
    let mut score = 0u32;
    let mut issues = Vec::new();

    let missing: Vec<&str> = ESSENTIAL_SECTIONS
        .iter()
        .filter(|s| !sections.contains(s))
        .map(|s| s.label())
        .collect();
    if missing.is_empty() {
        score += 60;
    } else {
        issues.push(format!("Missing essential sections: {}", missing.join(", ")));
    }

    let beneficial = BENEFICIAL_SECTIONS
        .iter()
        .filter(|s| sections.contains(s))
        .count() as u32;
    score += (beneficial * 10).min(30);
    if beneficial < BENEFICIAL_SECTIONS.len() as u32 {
        let absent: Vec<&str> = BENEFICIAL_SECTIONS
            .iter()
            .filter(|s| !sections.contains(s))
            .map(|s| s.label())
            .collect();
        issues.push(format!("Consider adding: {}", absent.join(", ")));
    }

    if in_ideal_order(&sections) {
        score += 20;
    } else if sections.len() >= 2 {
        issues.push("Sections are not in a conventional order".to_string());
    }

    StructureScore {
        score: score.min(100) as u8,
        sections_found: sections,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::keywords::KeywordCategory;

    fn kw(keyword: &str, importance: u8) -> KeywordImportance {
        KeywordImportance {
            keyword: keyword.to_string(),
            importance,
            category: KeywordCategory::Technical,
            context: vec![],
        }
    }

    fn filler(words: usize) -> String {
        vec!["delivery"; words].join(" ")
    }

    fn strong_resume() -> String {
        format!(
            "Professional Summary\nBackend engineer with 8 years building Rust and Python services.\n\n\
             Experience\n- Led a team of 6 engineers and reduced latency by 40%\n- Developed billing APIs handling $2M monthly\n\n\
             Education\nBSc Computer Science\n\n\
             Skills\nRust, Python, SQL, Kubernetes\n\n\
             Projects\n- Implemented an open source job scheduler\n\n\
             Certifications\nAWS Certified Developer\n{}",
            filler(420)
        )
    }

    #[test]
    fn test_empty_keywords_give_full_keyword_score() {
        let result = AtsScorer::default().score("Anything at all", &[]);
        assert_eq!(result.breakdown.keyword_match.score, 100);
    }

    #[test]
    fn test_keyword_match_is_importance_weighted() {
        let keywords = vec![kw("rust", 12), kw("haskell", 4)];
        let result = AtsScorer::default().score("Shipped Rust services", &keywords);
        // 12 / 16 = 75%
        assert_eq!(result.breakdown.keyword_match.score, 75);
        assert_eq!(result.breakdown.keyword_match.matched, vec!["rust"]);
        assert_eq!(result.breakdown.keyword_match.missing, vec!["haskell"]);
    }

    #[test]
    fn test_keyword_match_uses_synonyms() {
        let keywords = vec![kw("javascript", 10), kw("frontend", 5)];
        let result = AtsScorer::default().score("Built front-end apps in JS", &keywords);
        assert_eq!(result.breakdown.keyword_match.score, 100);
    }

    #[test]
    fn test_weighted_sum_matches_formula() {
        let weights = ScoringWeights::default();
        let subs = SubScores {
            keyword_match: 100,
            content: 75,
            structure: 60,
            format: 90,
            length: 40,
        };
        // 40 + 18.75 + 9 + 9 + 4 = 80.75
        assert_eq!(weights.combine(&subs), 81);

        let sum = weights.keyword_match + weights.content + weights.structure + weights.format + weights.length;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_overall_score_is_weighted_breakdown() {
        let scorer = AtsScorer::default();
        let result = scorer.score(&strong_resume(), &[kw("rust", 10), kw("go", 6)]);
        assert_eq!(result.score, scorer.weights.combine(&result.breakdown.sub_scores()));
    }

    #[test]
    fn test_passes_ats_iff_score_at_least_threshold() {
        let scorer = AtsScorer::default();
        for resume in [strong_resume(), "hello".to_string(), filler(900)] {
            let result = scorer.score(&resume, &[kw("rust", 10)]);
            assert_eq!(result.passes_ats, result.score >= 70, "score {}", result.score);
        }
        assert!(scorer.score(&strong_resume(), &[kw("rust", 10)]).passes_ats);
        assert!(!scorer.score("hello", &[kw("rust", 10)]).passes_ats);
    }

    #[test]
    fn test_all_scores_bounded() {
        let scorer = AtsScorer::default();
        let inputs = ["", "|| ## ~~ \t\t", "responsible for worked on duties included"];
        for input in inputs {
            let r = scorer.score(input, &[kw("rust", 15), kw("sql", 0)]);
            let s = r.breakdown.sub_scores();
            for v in [r.score, s.keyword_match, s.content, s.structure, s.format, s.length] {
                assert!(v <= 100);
            }
        }
    }

    #[test]
    fn test_content_deductions_without_numbers_or_verbs() {
        let result = content_score("i wrote some code for a shop and liked the skills involved");
        assert!(result.score <= 75);
        assert_eq!(result.score, 75);
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn test_content_generic_phrases_and_missing_skills() {
        let result = content_score("responsible for 3 things");
        // -10 verbs, -20 skills, -12 generic
        assert_eq!(result.score, 58);
    }

    #[test]
    fn test_length_bands() {
        assert_eq!(length_band_score(850), 85);
        assert_eq!(length_band_score(400), 100);
        assert_eq!(length_band_score(800), 100);
        assert_eq!(length_band_score(300), 85);
        assert_eq!(length_band_score(1000), 85);
        assert_eq!(length_band_score(250), 70);
        assert_eq!(length_band_score(1200), 70);
        assert_eq!(length_band_score(199), 40);
        assert_eq!(length_band_score(1500), 50);
    }

    #[test]
    fn test_format_deductions() {
        let clean = format_score("Experience\nEducation\nSkills\n");
        assert_eq!(clean.score, 100);

        let messy = format_score("Experience  here\tand | pipes\nEducation\nSkills");
        // complex 15 + unusual 10 + spacing 5
        assert_eq!(messy.score, 70);

        let bare = format_score("just some words");
        assert_eq!(bare.score, 80);
    }

    #[test]
    fn test_structure_full_marks_in_ideal_order() {
        let result = structure_score(&strong_resume());
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_structure_without_essentials() {
        let result = structure_score("Summary\nHello\nProjects\nThings");
        // beneficial 20 + ordered 20
        assert_eq!(result.score, 40);
        assert!(result.issues[0].contains("Experience"));
    }

    #[test]
    fn test_recommendations_mention_critical_missing_keywords() {
        let keywords = vec![kw("kubernetes", 12), kw("terraform", 9), kw("teamwork", 3)];
        let result = AtsScorer::default().score("hello", &keywords);
        assert!(result.recommendations.len() <= 5);
        assert!(result.recommendations[0].contains("kubernetes"));
        assert!(result.recommendations[0].contains("terraform"));
        assert!(!result.recommendations[0].contains("teamwork"));
    }
}
