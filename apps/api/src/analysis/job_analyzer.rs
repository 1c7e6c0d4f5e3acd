//! Job posting analyzer — best-effort structured extraction from raw job text.
//!
//! Every extractor is an ordered list of independent matcher strategies; the
//! first strategy that returns `Some` wins. Nothing here fails: absent fields
//! fall back to fixed sentinels.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::keywords::{extract_keywords, normalize};
use crate::analysis::text::{
    capitalize_first, contains_whole_word, find_whole_word, is_bullet,
    sentences, strip_bullet, word_count,
};

pub const TITLE_NOT_FOUND: &str = "Position Title Not Found";
pub const COMPANY_NOT_FOUND: &str = "Company Not Specified";
pub const LOCATION_NOT_FOUND: &str = "Location Not Specified";

const MAX_KEYWORDS: usize = 50;
const MAX_FIELD_LEN: usize = 100;
const MAX_SECTION_HEADER_LEN: usize = 60;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementPriority {
    Required,
    Preferred,
    NiceToHave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementCategory {
    Technical,
    Education,
    Experience,
    Certification,
    SoftSkill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequirement {
    pub text: String,
    pub priority: RequirementPriority,
    pub category: RequirementCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSkill {
    pub name: String,
    /// 0 – 15
    pub importance: u8,
    pub years_required: Option<u32>,
    pub proficiency: Option<Proficiency>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityLevel {
    Entry,
    #[default]
    Mid,
    Senior,
    Lead,
    Executive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceRequirement {
    pub minimum_years: u32,
    pub seniority_level: SeniorityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
    pub currency: String,
    pub period: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Temporary,
    Internship,
    Freelance,
}

/// Full structured output of job posting analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAnalysisResult {
    pub title: String,
    pub company: String,
    pub location: String,
    pub requirements: Vec<JobRequirement>,
    pub skills: Vec<JobSkill>,
    pub experience: ExperienceRequirement,
    /// Frequency-ranked, at most 50.
    pub keywords: Vec<String>,
    pub salary: Option<SalaryRange>,
    pub job_type: JobType,
    pub benefits: Vec<String>,
    /// 0 – 100
    pub analysis_score: u8,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Analyzes a raw job posting. Never fails; malformed input yields sentinels.
pub fn analyze_job(job_text: &str) -> JobAnalysisResult {
    let text = clean_text(job_text);

    let skills = extract_skills(&text);
    let benefits = extract_benefits(&text);
    let experience = extract_experience(&text);

    let result = JobAnalysisResult {
        title: first_match(TITLE_STRATEGIES, &text).unwrap_or_else(|| TITLE_NOT_FOUND.to_string()),
        company: first_match(COMPANY_STRATEGIES, &text)
            .unwrap_or_else(|| COMPANY_NOT_FOUND.to_string()),
        location: first_match(LOCATION_STRATEGIES, &text)
            .unwrap_or_else(|| LOCATION_NOT_FOUND.to_string()),
        requirements: extract_requirements(&text),
        analysis_score: analysis_score(&text, &skills, &experience, &benefits),
        skills,
        experience,
        keywords: ranked_keywords(&text),
        salary: extract_salary(&text),
        job_type: extract_job_type(&text),
        benefits,
    };

    debug!(
        title = %result.title,
        skills = result.skills.len(),
        requirements = result.requirements.len(),
        score = result.analysis_score,
        "job posting analyzed"
    );
    result
}

static INLINE_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid whitespace regex"));

static UNUSUAL_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\w\s.,;:!?()&$%/+#'"*•·@–-]"#).expect("valid character class regex")
});

/// Strips unusual characters and collapses whitespace within each line.
/// Line structure is kept since headers and bullets are line-based.
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            let stripped = UNUSUAL_CHARS.replace_all(line, " ");
            INLINE_WHITESPACE.replace_all(&stripped, " ").trim().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

type Strategy = fn(&str) -> Option<String>;

fn first_match(strategies: &[Strategy], text: &str) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(text))
}

fn tidy(value: &str) -> Option<String> {
    let value = value
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':'))
        .trim();
    if value.is_empty() {
        return None;
    }
    Some(value.chars().take(MAX_FIELD_LEN).collect())
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| tidy(m.as_str()))
}

// ────────────────────────────────────────────────────────────────────────────
// Title / company / location strategies
// ────────────────────────────────────────────────────────────────────────────

static TITLE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:job[ \t]+)?title[ \t]*:[ \t]*(.+)$").expect("valid title label regex")
});
static POSITION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*position[ \t]*:[ \t]*(.+)$").expect("valid position regex"));
static ROLE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*role[ \t]*:[ \t]*(.+)$").expect("valid role regex"));
static TITLE_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b((?:(?:senior|junior|lead|principal|staff|sr|jr)\.?\s+)?(?:[a-z]+\s+)?(?:engineer|developer|manager|analyst|designer|scientist|architect|consultant|specialist|administrator|coordinator|director))\b",
    )
    .expect("valid title noun regex")
});

const TITLE_STRATEGIES: &[Strategy] = &[
    title_from_label,
    title_from_position,
    title_from_role,
    title_from_first_line,
    title_from_common_nouns,
];

fn title_from_label(text: &str) -> Option<String> {
    capture(&TITLE_LABEL, text)
}

fn title_from_position(text: &str) -> Option<String> {
    capture(&POSITION_LABEL, text)
}

fn title_from_role(text: &str) -> Option<String> {
    capture(&ROLE_LABEL, text)
}

/// A short opening line without label punctuation is usually the title.
fn title_from_first_line(text: &str) -> Option<String> {
    let first = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let chars = first.chars().count();
    let looks_like_title = (3..=80).contains(&chars)
        && word_count(first) <= 10
        && !first.contains(':')
        && !first.ends_with('.');
    if looks_like_title {
        tidy(first)
    } else {
        None
    }
}

fn title_from_common_nouns(text: &str) -> Option<String> {
    let found = TITLE_NOUN.captures(text)?.get(1)?.as_str();
    let titled: Vec<String> = found
        .split_whitespace()
        .map(|w| capitalize_first(&w.to_lowercase()))
        .collect();
    tidy(&titled.join(" "))
}

static COMPANY_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*company(?:[ \t]+name)?[ \t]*:[ \t]*(.+)$").expect("valid company label regex")
});
static COMPANY_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:at|@)\s+([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*){0,3})")
        .expect("valid company 'at' regex")
});
static COMPANY_JOIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[Jj]oin\s+(?:us\s+at\s+|the\s+team\s+at\s+)?([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*){0,3})")
        .expect("valid company 'join' regex")
});
static COMPANY_HIRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][\w&.'-]*(?:\s+[A-Z][\w&.'-]*){0,3})\s+is\s+(?:hiring|looking|seeking)")
        .expect("valid company 'hiring' regex")
});

const COMPANY_STRATEGIES: &[Strategy] = &[
    company_from_label,
    company_from_at,
    company_from_join,
    company_from_hiring,
];

fn company_from_label(text: &str) -> Option<String> {
    capture(&COMPANY_LABEL, text)
}

fn company_from_at(text: &str) -> Option<String> {
    capture(&COMPANY_AT, text)
}

fn company_from_join(text: &str) -> Option<String> {
    capture(&COMPANY_JOIN, text)
}

fn company_from_hiring(text: &str) -> Option<String> {
    capture(&COMPANY_HIRING, text)
}

static LOCATION_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^[ \t]*location[ \t]*:[ \t]*(.+)$").expect("valid location regex"));
static WORK_MODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(fully remote|remote|hybrid|on-site|onsite)\b").expect("valid work mode regex")
});
static CITY_STATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*,\s*[A-Z]{2})\b").expect("valid city regex")
});

const LOCATION_STRATEGIES: &[Strategy] =
    &[location_from_label, location_from_work_mode, location_from_city_state];

fn location_from_label(text: &str) -> Option<String> {
    capture(&LOCATION_LABEL, text)
}

fn location_from_work_mode(text: &str) -> Option<String> {
    let found = WORK_MODE.captures(text)?.get(1)?.as_str().to_lowercase();
    Some(capitalize_first(&found))
}

fn location_from_city_state(text: &str) -> Option<String> {
    capture(&CITY_STATE, text)
}

// ────────────────────────────────────────────────────────────────────────────
// Requirements
// ────────────────────────────────────────────────────────────────────────────

const REQUIREMENT_HEADERS: &[&str] = &[
    "requirements",
    "qualifications",
    "what you need",
    "what you'll need",
    "what we're looking for",
    "must have",
    "nice to have",
    "skills",
    "bonus",
];

const TERMINATING_HEADERS: &[&str] = &[
    "responsibilities",
    "what you'll do",
    "benefits",
    "perks",
    "what we offer",
    "about us",
    "about the company",
];

const TECHNICAL_TERMS: &[&str] = &[
    "programming",
    "software",
    "framework",
    "database",
    "cloud",
    "api",
    "javascript",
    "typescript",
    "python",
    "java",
    "sql",
    "aws",
    "docker",
    "kubernetes",
    "react",
    "linux",
    "git",
];
const EDUCATION_TERMS: &[&str] = &["degree", "bachelor", "master", "phd", "university", "education"];
const EXPERIENCE_TERMS: &[&str] = &["years", "experience"];
const CERTIFICATION_TERMS: &[&str] = &["certif", "license", "licence"];

fn is_short_line(line: &str) -> bool {
    line.chars().count() < MAX_SECTION_HEADER_LEN && !is_bullet(line)
}

fn priority_for_header(header: &str) -> RequirementPriority {
    if header.contains("preferred") {
        RequirementPriority::Preferred
    } else if ["bonus", "plus", "nice to have"].iter().any(|w| header.contains(w)) {
        RequirementPriority::NiceToHave
    } else {
        RequirementPriority::Required
    }
}

fn categorize_requirement(text: &str) -> RequirementCategory {
    let lower = text.to_lowercase();
    let has_any = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));
    if has_any(TECHNICAL_TERMS) {
        RequirementCategory::Technical
    } else if has_any(EDUCATION_TERMS) {
        RequirementCategory::Education
    } else if has_any(EXPERIENCE_TERMS) {
        RequirementCategory::Experience
    } else if has_any(CERTIFICATION_TERMS) {
        RequirementCategory::Certification
    } else {
        RequirementCategory::SoftSkill
    }
}

/// Collects bulleted lines under requirement-like headers until a
/// terminating header (responsibilities, benefits, about us) is reached.
fn extract_requirements(text: &str) -> Vec<JobRequirement> {
    let mut requirements = Vec::new();
    let mut current: Option<RequirementPriority> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if is_short_line(line) {
            if TERMINATING_HEADERS.iter().any(|h| lower.contains(h)) {
                current = None;
                continue;
            }
            if REQUIREMENT_HEADERS.iter().any(|h| lower.contains(h)) {
                current = Some(priority_for_header(&lower));
                continue;
            }
        }

        if let Some(priority) = current {
            if is_bullet(line) {
                let item = strip_bullet(line);
                if !item.is_empty() {
                    requirements.push(JobRequirement {
                        text: item.to_string(),
                        priority,
                        category: categorize_requirement(item),
                    });
                }
            }
        }
    }

    requirements
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

/// (match term, display name)
const SKILL_CATALOG: &[(&str, &str)] = &[
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("python", "Python"),
    ("java", "Java"),
    ("c++", "C++"),
    ("c#", "C#"),
    ("rust", "Rust"),
    ("react", "React"),
    ("angular", "Angular"),
    ("vue", "Vue"),
    ("node.js", "Node.js"),
    ("sql", "SQL"),
    ("postgresql", "PostgreSQL"),
    ("mongodb", "MongoDB"),
    ("aws", "AWS"),
    ("azure", "Azure"),
    ("gcp", "GCP"),
    ("docker", "Docker"),
    ("kubernetes", "Kubernetes"),
    ("git", "Git"),
    ("graphql", "GraphQL"),
    ("linux", "Linux"),
    ("terraform", "Terraform"),
    ("machine learning", "Machine Learning"),
];

static YEARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s*\+?\s*(?:(?:-|to)\s*\d{1,2}\s*)?\+?\s*years?").expect("valid years regex")
});

fn first_years(text: &str) -> Option<u32> {
    YEARS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn skill_importance(mentions: &[String], frequency: usize) -> u8 {
    let any = |words: &[&str]| mentions.iter().any(|s| words.iter().any(|w| s.contains(w)));
    let mut importance = 5u32;
    if any(&["required", "must"]) {
        importance += 5;
    }
    if any(&["preferred", "desired"]) {
        importance += 3;
    }
    if any(&["years"]) {
        importance += 2;
    }
    importance += (frequency as u32).saturating_sub(1).min(3);
    importance.min(15) as u8
}

fn proficiency(mentions: &[String]) -> Option<Proficiency> {
    let any = |words: &[&str]| mentions.iter().any(|s| words.iter().any(|w| s.contains(w)));
    if any(&["expert"]) {
        Some(Proficiency::Expert)
    } else if any(&["senior", "lead"]) {
        Some(Proficiency::Advanced)
    } else if any(&["intermediate", "mid"]) {
        Some(Proficiency::Intermediate)
    } else if any(&["junior", "entry"]) {
        Some(Proficiency::Beginner)
    } else {
        None
    }
}

fn extract_skills(text: &str) -> Vec<JobSkill> {
    let lower = text.to_lowercase();
    let lower_sentences: Vec<String> = sentences(&lower).into_iter().map(str::to_string).collect();

    SKILL_CATALOG
        .iter()
        .filter_map(|(term, name)| {
            let frequency = find_whole_word(&lower, term).len();
            if frequency == 0 {
                return None;
            }
            let mentions: Vec<String> = lower_sentences
                .iter()
                .filter(|s| contains_whole_word(s, term))
                .cloned()
                .collect();
            Some(JobSkill {
                name: (*name).to_string(),
                importance: skill_importance(&mentions, frequency),
                years_required: mentions.iter().find_map(|s| first_years(s)),
                proficiency: proficiency(&mentions),
            })
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Experience, salary, job type, benefits
// ────────────────────────────────────────────────────────────────────────────

fn extract_experience(text: &str) -> ExperienceRequirement {
    let lower = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| contains_whole_word(&lower, w));

    let seniority_level = if has(&["senior", "sr"]) {
        SeniorityLevel::Senior
    } else if has(&["lead", "principal"]) {
        SeniorityLevel::Lead
    } else if has(&["director", "vp", "executive"]) {
        SeniorityLevel::Executive
    } else if has(&["junior", "entry", "entry-level", "graduate"]) {
        SeniorityLevel::Entry
    } else {
        SeniorityLevel::Mid
    };

    ExperienceRequirement {
        minimum_years: first_years(text).unwrap_or(0),
        seniority_level,
    }
}

static SALARY_DOLLAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\s*(\d[\d,]*(?:\.\d+)?)\s*(?:-|–|to)\s*\$\s*(\d[\d,]*(?:\.\d+)?)\b")
        .expect("valid salary regex")
});
static SALARY_DOLLAR_K: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$\s*(\d+(?:\.\d+)?)\s*k\s*(?:-|–|to)\s*\$?\s*(\d+(?:\.\d+)?)\s*k\b")
        .expect("valid salary k regex")
});
static SALARY_BARE_K: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?)\s*k\s*(?:-|–|to)\s*(\d+(?:\.\d+)?)\s*k\b")
        .expect("valid bare salary regex")
});

/// Salary patterns in priority order; the flag marks 'k' (×1000) amounts.
fn salary_patterns() -> [(&'static Regex, bool); 3] {
    [
        (&*SALARY_DOLLAR_RANGE, false),
        (&*SALARY_DOLLAR_K, true),
        (&*SALARY_BARE_K, true),
    ]
}

fn parse_amount(raw: &str, thousands: bool) -> Option<u64> {
    let value: f64 = raw.replace(',', "").parse().ok()?;
    let value = if thousands { value * 1000.0 } else { value };
    (value > 0.0).then(|| value.round() as u64)
}

fn extract_salary(text: &str) -> Option<SalaryRange> {
    salary_patterns().into_iter().find_map(|(re, thousands)| {
        let caps = re.captures(text)?;
        let min = parse_amount(caps.get(1)?.as_str(), thousands)?;
        let max = parse_amount(caps.get(2)?.as_str(), thousands)?;
        Some(SalaryRange {
            min,
            max,
            currency: "USD".to_string(),
            period: "yearly".to_string(),
        })
    })
}

const JOB_TYPES: &[(&[&str], JobType)] = &[
    (&["full-time", "full time"], JobType::FullTime),
    (&["part-time", "part time"], JobType::PartTime),
    (&["contract"], JobType::Contract),
    (&["temporary"], JobType::Temporary),
    (&["internship"], JobType::Internship),
    (&["freelance"], JobType::Freelance),
];

fn extract_job_type(text: &str) -> JobType {
    let lower = text.to_lowercase();
    JOB_TYPES
        .iter()
        .find(|(aliases, _)| aliases.iter().any(|a| lower.contains(a)))
        .map(|(_, job_type)| *job_type)
        .unwrap_or_default()
}

const BENEFIT_CATALOG: &[(&str, &[&str])] = &[
    ("Health insurance", &["health insurance", "medical"]),
    ("Dental insurance", &["dental"]),
    ("Vision insurance", &["vision insurance", "vision coverage"]),
    ("401(k)", &["401k", "401(k)"]),
    ("Retirement plan", &["retirement", "pension"]),
    ("Paid time off", &["paid time off", "pto"]),
    ("Vacation", &["vacation"]),
    ("Remote work", &["remote work", "work from home"]),
    ("Flexible hours", &["flexible hours", "flexible schedule", "flexible working"]),
    ("Parental leave", &["parental leave", "maternity", "paternity"]),
    ("Stock options", &["stock options", "equity", "rsu", "rsus"]),
    ("Bonus", &["bonus"]),
    ("Professional development", &["professional development", "learning budget", "training budget"]),
    ("Gym membership", &["gym", "wellness"]),
    ("Life insurance", &["life insurance"]),
    ("Tuition reimbursement", &["tuition"]),
];

fn extract_benefits(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    BENEFIT_CATALOG
        .iter()
        .filter(|(_, aliases)| aliases.iter().any(|a| contains_whole_word(&lower, a)))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Keywords and analysis score
// ────────────────────────────────────────────────────────────────────────────

fn ranked_keywords(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let mut counted: Vec<(String, usize)> = extract_keywords(text)
        .into_iter()
        .map(|kw| {
            let frequency = find_whole_word(&normalized, &kw).len();
            (kw, frequency)
        })
        .collect();
    counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counted
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(kw, _)| kw)
        .collect()
}

/// Detail (≤30) + structure (≤30) + content richness (≤40).
fn analysis_score(
    text: &str,
    skills: &[JobSkill],
    experience: &ExperienceRequirement,
    benefits: &[String],
) -> u8 {
    let lower = text.to_lowercase();

    let detail = match word_count(text) {
        n if n > 500 => 30,
        n if n > 300 => 25,
        n if n > 150 => 15,
        n if n > 50 => 10,
        _ => 5,
    };

    let structure: u32 = ["requirements", "responsibilities", "qualifications"]
        .iter()
        .filter(|h| lower.contains(*h))
        .count() as u32
        * 10;

    let richness_flags = [
        !skills.is_empty(),
        experience.minimum_years > 0 || lower.contains("experience"),
        EDUCATION_TERMS.iter().any(|t| lower.contains(t)),
        !benefits.is_empty(),
    ];
    let richness = richness_flags.iter().filter(|f| **f).count() as u32 * 10;

    (detail + structure + richness).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSTING: &str = "Senior Backend Engineer\n\
        Company: Acme Robotics\n\
        Location: Austin, TX\n\
        \n\
        About Us\n\
        We build warehouse robots.\n\
        \n\
        Responsibilities\n\
        - Design services\n\
        \n\
        Requirements\n\
        - 5+ years of experience with Python\n\
        - Strong SQL skills are required\n\
        - Bachelor's degree\n\
        \n\
        Preferred Qualifications\n\
        - Kubernetes experience\n\
        - Excellent communication\n\
        \n\
        Benefits\n\
        - Health insurance and dental\n\
        - 401k matching\n\
        - This line is not a requirement\n\
        \n\
        Salary: $120,000 - $160,000 per year. Full-time.";

    #[test]
    fn test_labeled_fields_are_extracted() {
        let result = analyze_job(POSTING);
        assert_eq!(result.title, "Senior Backend Engineer");
        assert_eq!(result.company, "Acme Robotics");
        assert_eq!(result.location, "Austin, TX");
        assert_eq!(result.job_type, JobType::FullTime);
    }

    #[test]
    fn test_salary_with_commas_per_year() {
        let salary = extract_salary("Pay: $120,000 - $160,000 per year").unwrap();
        assert_eq!(
            salary,
            SalaryRange {
                min: 120_000,
                max: 160_000,
                currency: "USD".to_string(),
                period: "yearly".to_string(),
            }
        );
    }

    #[test]
    fn test_salary_k_suffix_patterns() {
        let dollar_k = extract_salary("Range $90k - $110k").unwrap();
        assert_eq!((dollar_k.min, dollar_k.max), (90_000, 110_000));
        let bare_k = extract_salary("Comp 80k to 95k plus equity").unwrap();
        assert_eq!((bare_k.min, bare_k.max), (80_000, 95_000));
        assert!(extract_salary("Competitive pay").is_none());
    }

    #[test]
    fn test_requirements_sections_and_priorities() {
        let reqs = analyze_job(POSTING).requirements;
        let texts: Vec<&str> = reqs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "5+ years of experience with Python",
                "Strong SQL skills are required",
                "Bachelor's degree",
                "Kubernetes experience",
                "Excellent communication",
            ]
        );
        assert_eq!(reqs[0].priority, RequirementPriority::Required);
        assert_eq!(reqs[0].category, RequirementCategory::Technical);
        assert_eq!(reqs[2].category, RequirementCategory::Education);
        assert_eq!(reqs[3].priority, RequirementPriority::Preferred);
        assert_eq!(reqs[4].category, RequirementCategory::SoftSkill);
    }

    #[test]
    fn test_nice_to_have_priority() {
        let reqs = extract_requirements("Nice to have\n- Rust\n- Go");
        assert!(reqs.iter().all(|r| r.priority == RequirementPriority::NiceToHave));
        assert_eq!(reqs.len(), 2);
    }

    #[test]
    fn test_single_unqualified_skill_mention_has_base_importance() {
        let skills = extract_skills("we use javascript");
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "JavaScript");
        assert_eq!(skills[0].importance, 5);
        assert_eq!(skills[0].years_required, None);
        assert_eq!(skills[0].proficiency, None);
    }

    #[test]
    fn test_skill_importance_boosts_and_annotations() {
        let skills = extract_skills(
            "Expert Python is required with 5+ years. Python scripting. More python tooling.",
        );
        let python = skills.iter().find(|s| s.name == "Python").unwrap();
        // 5 + required 5 + years 2 + frequency 2
        assert_eq!(python.importance, 14);
        assert_eq!(python.years_required, Some(5));
        assert_eq!(python.proficiency, Some(Proficiency::Expert));
    }

    #[test]
    fn test_java_does_not_match_javascript() {
        let names: Vec<String> = extract_skills("JavaScript and SQL")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["JavaScript", "SQL"]);
    }

    #[test]
    fn test_experience_and_seniority() {
        let exp = extract_experience("Senior role, 7+ years of experience");
        assert_eq!(exp.minimum_years, 7);
        assert_eq!(exp.seniority_level, SeniorityLevel::Senior);
        let junior = extract_experience("Graduate program for new engineers");
        assert_eq!(junior.seniority_level, SeniorityLevel::Entry);
        assert_eq!(junior.minimum_years, 0);
        assert_eq!(extract_experience("").seniority_level, SeniorityLevel::Mid);
    }

    #[test]
    fn test_benefits_and_job_type() {
        let result = analyze_job(POSTING);
        assert!(result.benefits.contains(&"Health insurance".to_string()));
        assert!(result.benefits.contains(&"Dental insurance".to_string()));
        assert!(result.benefits.contains(&"401(k)".to_string()));
        assert_eq!(extract_job_type("Contract role, 6 months"), JobType::Contract);
        assert_eq!(extract_job_type("No type given"), JobType::FullTime);
    }

    #[test]
    fn test_sentinels_for_empty_input() {
        let result = analyze_job("");
        assert_eq!(result.title, TITLE_NOT_FOUND);
        assert_eq!(result.company, COMPANY_NOT_FOUND);
        assert_eq!(result.location, LOCATION_NOT_FOUND);
        assert!(result.requirements.is_empty());
        assert!(result.keywords.is_empty());
        assert!(result.salary.is_none());
    }

    #[test]
    fn test_unlabeled_company_and_remote_location() {
        let text = "We are growing fast and need help with our backend platform services.\n\
            Join Globex Corporation and work fully remote.";
        let result = analyze_job(text);
        assert_eq!(result.company, "Globex Corporation");
        assert_eq!(result.location, "Fully remote");
    }

    #[test]
    fn test_position_label_outranks_role_label_and_first_line() {
        let text = "Acme Robotics careers\nRole: Staff Engineer\nPosition: Platform Engineer\n";
        assert_eq!(analyze_job(text).title, "Platform Engineer");
    }

    #[test]
    fn test_role_label_outranks_first_line() {
        let text = "Acme Robotics careers\nRole: Data Analyst\nWe crunch numbers.";
        assert_eq!(analyze_job(text).title, "Data Analyst");
    }

    #[test]
    fn test_city_state_location_without_label() {
        let text = "We are growing our analytics team this year.\n\
            The office is in San Francisco, CA with flexible hours.";
        assert_eq!(analyze_job(text).location, "San Francisco, CA");
    }

    #[test]
    fn test_work_mode_outranks_city_state() {
        let text = "We are growing our analytics team this year.\n\
            Hybrid schedule from our Denver, CO office.";
        assert_eq!(analyze_job(text).location, "Hybrid");
    }

    #[test]
    fn test_title_falls_back_to_common_nouns() {
        let text = "We are hiring now. Looking for a senior data engineer to join the platform team.";
        assert_eq!(analyze_job(text).title, "Senior Data Engineer");
    }

    #[test]
    fn test_keywords_are_capped_and_frequency_ranked() {
        let mut text = String::from("rust rust rust python python ");
        for i in 0..80 {
            text.push_str(&format!("term{i}x "));
        }
        let keywords = analyze_job(&text).keywords;
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "rust");
        assert_eq!(keywords[1], "python");
    }

    #[test]
    fn test_analysis_score_bounded() {
        let score = analyze_job(POSTING).analysis_score;
        assert!(score <= 100);
        // structure 30 + richness 40 + detail at least 5
        assert!(score >= 75, "score was {score}");
    }
}
