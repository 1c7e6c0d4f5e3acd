//! Keyword extraction and importance ranking.
//!
//! Extraction is lexical: lower-case, strip punctuation, then take the union
//! of known multi-word phrases and individual non-stop-word tokens.
//! Importance combines a static category weight with contextual boosts and is
//! capped at [`MAX_IMPORTANCE`].

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::text::{contains_whole_word, count_occurrences, sentences_containing};

pub const MAX_IMPORTANCE: u8 = 15;
const BASE_IMPORTANCE: u8 = 5;
const PARTIAL_MATCH_FACTOR: f32 = 0.8;
const MAX_CONTEXT_SENTENCES: usize = 3;

static NON_KEYWORD_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.-]").expect("valid punctuation regex"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from", "up",
    "about", "into", "through", "during", "before", "after", "above", "below", "between", "among",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "must", "can", "this", "that", "these",
    "those", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them", "my",
    "your", "his", "its", "our", "their", "an", "as", "if", "then", "than", "so", "such", "very",
    "just", "also", "not", "only", "all", "any", "each", "who", "what", "which", "when", "where",
    "how", "own", "other", "some", "more", "most", "new", "etc",
];

/// Multi-word technical and business phrases recognised as single keywords.
const KNOWN_PHRASES: &[&str] = &[
    "machine learning",
    "artificial intelligence",
    "data science",
    "data analysis",
    "deep learning",
    "natural language processing",
    "computer vision",
    "software engineering",
    "software development",
    "web development",
    "project management",
    "product management",
    "user experience",
    "user interface",
    "cloud computing",
    "business intelligence",
    "digital marketing",
    "customer service",
    "quality assurance",
    "continuous integration",
    "continuous deployment",
    "agile methodology",
    "version control",
    "rest api",
    "full stack",
    "front end",
    "back end",
];

const TECHNICAL_WEIGHTS: &[(&str, u8)] = &[
    ("machine learning", 10),
    ("python", 9),
    ("java", 8),
    // Exact entry, so "java" never partially claims it.
    ("javascript", BASE_IMPORTANCE),
    ("typescript", 9),
    ("react", 9),
    ("node.js", 8),
    ("sql", 9),
    ("aws", 9),
    ("azure", 8),
    ("docker", 8),
    ("kubernetes", 9),
    ("microservices", 8),
    ("api", 7),
    ("graphql", 7),
    ("mongodb", 7),
    ("postgresql", 7),
    ("linux", 6),
    ("git", 6),
    ("html", 5),
    ("css", 5),
    ("cloud", 7),
    ("devops", 8),
    ("terraform", 8),
    ("data science", 9),
];

const ACTION_WEIGHTS: &[(&str, u8)] = &[
    ("led", 8),
    ("managed", 8),
    ("architected", 8),
    ("developed", 7),
    ("implemented", 7),
    ("designed", 7),
    ("optimized", 7),
    ("delivered", 7),
    ("increased", 7),
    ("reduced", 7),
    ("achieved", 6),
    ("created", 6),
    ("improved", 6),
    ("launched", 6),
];

const CERTIFICATION_WEIGHTS: &[(&str, u8)] = &[
    ("aws certified", 10),
    ("pmp", 9),
    ("cissp", 9),
    ("cpa", 9),
    ("six sigma", 8),
    ("certified", 7),
    ("certification", 7),
    ("scrum", 7),
    ("itil", 6),
];

const INDUSTRY_WEIGHTS: &[(&str, u8)] = &[
    ("fintech", 7),
    ("healthcare", 7),
    ("e-commerce", 7),
    ("saas", 7),
    ("analytics", 7),
    ("compliance", 6),
    ("finance", 6),
    ("marketing", 6),
    ("logistics", 6),
    ("enterprise", 5),
];

const REQUIRED_MARKERS: &[&str] = &["required", "must", "essential"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordCategory {
    Technical,
    Soft,
    Industry,
    Action,
    Certification,
}

/// A keyword ranked by how much it matters for a given piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordImportance {
    pub keyword: String,
    /// 0 – 15
    pub importance: u8,
    pub category: KeywordCategory,
    /// Up to three source sentences containing the keyword.
    pub context: Vec<String>,
}

/// Weight tables in category priority order.
fn weight_tables() -> [(KeywordCategory, &'static [(&'static str, u8)]); 4] {
    [
        (KeywordCategory::Technical, TECHNICAL_WEIGHTS),
        (KeywordCategory::Action, ACTION_WEIGHTS),
        (KeywordCategory::Certification, CERTIFICATION_WEIGHTS),
        (KeywordCategory::Industry, INDUSTRY_WEIGHTS),
    ]
}

fn substring_related(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Lower-cases, strips characters outside `[\w\s.-]` and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_KEYWORD_CHARS.replace_all(&lowered, " ");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Extracts the deduplicated keyword set of `text`.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    let cleaned = normalize(text);
    let mut keywords = BTreeSet::new();
    if cleaned.is_empty() {
        return keywords;
    }

    for phrase in KNOWN_PHRASES {
        if cleaned.contains(phrase) {
            keywords.insert((*phrase).to_string());
        }
    }

    for token in cleaned.split(' ') {
        // Sentence punctuation sticks to tokens after normalisation.
        let token = token.trim_matches(|c: char| c == '.' || c == '-');
        if token.chars().count() > 2 && !STOP_WORDS.contains(&token) {
            keywords.insert(token.to_string());
        }
    }

    keywords
}

/// Assigns a category by checking the weight tables in priority order.
pub fn categorize(keyword: &str) -> KeywordCategory {
    let keyword = keyword.to_lowercase();
    weight_tables()
        .into_iter()
        .find(|(_, table)| table.iter().any(|(entry, _)| substring_related(&keyword, entry)))
        .map(|(category, _)| category)
        .unwrap_or(KeywordCategory::Soft)
}

/// Static catalog weight: exact match, else 0.8× the best substring match,
/// else the base value.
fn catalog_weight(keyword: &str) -> u8 {
    let tables = weight_tables();
    let all_entries = || tables.iter().flat_map(|(_, table)| table.iter());

    if let Some((_, weight)) = all_entries().find(|(entry, _)| *entry == keyword) {
        return *weight;
    }

    all_entries()
        .filter(|(entry, _)| substring_related(keyword, entry))
        .map(|(_, weight)| (*weight as f32 * PARTIAL_MATCH_FACTOR).round() as u8)
        .max()
        .unwrap_or(BASE_IMPORTANCE)
}

/// Importance of a single keyword within `context_text`, capped at 15.
pub fn keyword_importance(keyword: &str, context_text: &str) -> u8 {
    let keyword = keyword.to_lowercase();
    let context_lower = context_text.to_lowercase();
    let mut importance = catalog_weight(&keyword) as u32;

    if REQUIRED_MARKERS.iter().any(|m| context_lower.contains(m)) {
        importance += 3;
    }

    let mentions_years = sentences_containing(context_text, &keyword)
        .iter()
        .any(|s| s.to_lowercase().contains("years"));
    if mentions_years {
        importance += 2;
    }

    let frequency = count_occurrences(&context_lower, &keyword) as u32;
    importance += frequency.saturating_sub(1).min(3);

    importance.min(MAX_IMPORTANCE as u32) as u8
}

/// Ranks `keywords` by importance within `context_text`, highest first.
pub fn analyze_importance<'a, I>(keywords: I, context_text: &str) -> Vec<KeywordImportance>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut ranked: Vec<KeywordImportance> = keywords
        .into_iter()
        .map(|keyword| KeywordImportance {
            keyword: keyword.clone(),
            importance: keyword_importance(keyword, context_text),
            category: categorize(keyword),
            context: sentences_containing(context_text, keyword)
                .into_iter()
                .take(MAX_CONTEXT_SENTENCES)
                .map(str::to_string)
                .collect(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.importance
            .cmp(&a.importance)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    ranked
}

/// Extracts and ranks the keywords of a job description in one step.
pub fn rank_job_keywords(job_text: &str) -> Vec<KeywordImportance> {
    analyze_importance(&extract_keywords(job_text), job_text)
}

// ────────────────────────────────────────────────────────────────────────────
// Matching against a resume
// ────────────────────────────────────────────────────────────────────────────

/// Interchangeable spellings treated as the same keyword.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["javascript", "js", "ecmascript"],
    &["typescript", "ts"],
    &["python", "py"],
    &["database", "db", "sql"],
    &["frontend", "front-end", "front end"],
    &["backend", "back-end", "back end"],
    &["fullstack", "full-stack", "full stack"],
    &["kubernetes", "k8s"],
    &["postgresql", "postgres"],
    &["machine learning", "ml"],
    &["artificial intelligence", "ai"],
];

/// A resume prepared once for repeated keyword lookups.
pub struct ResumeIndex {
    lower: String,
    keywords: BTreeSet<String>,
}

impl ResumeIndex {
    pub fn new(resume_text: &str) -> Self {
        Self {
            lower: resume_text.to_lowercase(),
            keywords: extract_keywords(resume_text),
        }
    }

    pub fn text(&self) -> &str {
        &self.lower
    }

    /// Case-insensitive presence check: substring match in either direction
    /// against the resume's keywords, or a synonym appearing as a whole word.
    pub fn contains(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        if keyword.is_empty() {
            return false;
        }
        if self.lower.contains(&keyword) {
            return true;
        }
        if self.keywords.iter().any(|rk| keyword.contains(rk.as_str())) {
            return true;
        }
        SYNONYM_GROUPS
            .iter()
            .filter(|group| group.contains(&keyword.as_str()))
            .flat_map(|group| group.iter())
            .any(|alias| contains_whole_word(&self.lower, alias))
    }
}
