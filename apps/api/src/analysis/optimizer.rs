//! Resume optimizer — sequences job analysis, scoring and tailoring into a
//! single optimization result, with an optional workflow-backed path that
//! falls back to the local pipeline on any failure.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::analysis::ats_scorer::{AtsScoreResult, AtsScorer};
use crate::analysis::job_analyzer::{
    analyze_job, JobAnalysisResult, COMPANY_NOT_FOUND, TITLE_NOT_FOUND,
};
use crate::analysis::keywords::{KeywordImportance, ResumeIndex};
use crate::analysis::sections::{split_sections, SectionKind};
use crate::analysis::tailor::{apply_suggestions, TailorEngine, TailorSuggestion, TailoringResult};
use crate::analysis::text::{capitalize_first, is_bullet, strip_bullet};
use crate::workflow_client::{WorkflowError, WorkflowExecutor, WorkflowId, WorkflowResult};

const SOURCE_LOCAL: &str = "local";
const SOURCE_WORKFLOW: &str = "workflow";
const SKILL_GAP_IMPORTANCE: u8 = 10;
const MAX_SKILL_GAPS: usize = 3;

static WEAK_VERBS: Lazy<Vec<(&'static str, Regex, &'static str)>> = Lazy::new(|| {
    [
        ("worked on", "developed"),
        ("responsible for", "managed"),
        ("assisted with", "supported"),
        ("was involved in", "contributed to"),
        ("helped", "facilitated"),
        ("handled", "managed"),
    ]
    .into_iter()
    .map(|(weak, strong)| {
        let pattern = format!(r"(?i)\b{}\b", regex::escape(weak));
        (weak, Regex::new(&pattern).expect("valid weak verb regex"), strong)
    })
    .collect()
});

// ────────────────────────────────────────────────────────────────────────────
// Request / result models
// ────────────────────────────────────────────────────────────────────────────

/// Which tailoring suggestions are applied to the resume text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Only mid-impact rewrites (12 < impact < 20).
    Basic,
    #[default]
    Standard,
    /// Everything, plus weak-verb replacement.
    Aggressive,
}

impl OptimizationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationLevel::Basic => "basic",
            OptimizationLevel::Standard => "standard",
            OptimizationLevel::Aggressive => "aggressive",
        }
    }

    pub fn admits(&self, impact: i32) -> bool {
        match self {
            OptimizationLevel::Basic => impact > 12 && impact < 20,
            OptimizationLevel::Standard => impact > 8,
            OptimizationLevel::Aggressive => true,
        }
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(OptimizationLevel::Basic),
            "standard" => Ok(OptimizationLevel::Standard),
            "aggressive" => Ok(OptimizationLevel::Aggressive),
            other => Err(format!(
                "Invalid optimization level '{other}'; expected basic, standard or aggressive"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequest {
    pub resume_text: String,
    pub job_description: String,
    #[serde(default)]
    pub optimization_level: OptimizationLevel,
    #[serde(default)]
    pub target_role: Option<String>,
    #[serde(default, rename = "useAI")]
    pub use_ai: bool,
}

impl OptimizationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.resume_text.trim().is_empty() || self.job_description.trim().is_empty() {
            return Err("Resume text and job description are required".to_string());
        }
        Ok(())
    }

    fn target_role(&self) -> Option<&str> {
        self.target_role.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub category: String,
    pub message: String,
}

impl Recommendation {
    fn new(priority: RecommendationPriority, category: &str, message: impl Into<String>) -> Self {
        Self {
            priority,
            category: category.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordReport {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// Missing keywords at or above the critical importance threshold.
    pub critical_missing: Vec<String>,
    /// Percentage of job keywords found, 0 – 100.
    pub match_rate: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub original_resume: String,
    pub optimized_resume: String,
    pub before_score: u8,
    pub after_score: u8,
    pub improvement: i32,
    pub key_changes: Vec<String>,
    pub ats_analysis: AtsScoreResult,
    pub job_analysis: JobAnalysisResult,
    pub tailoring: TailoringResult,
    pub keyword_report: KeywordReport,
    /// Highest priority first.
    pub recommendations: Vec<Recommendation>,
    pub optimization_level: OptimizationLevel,
    /// `"local"` or `"workflow"`.
    pub source: String,
    pub processing_time_ms: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationPreview {
    pub current_score: u8,
    pub projected_score: u8,
    pub key_changes: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub estimated_impact: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetter {
    pub cover_letter: String,
    pub source: String,
}

/// One entry of a batch run: either a result or the reason it failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<OptimizationResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Optimizer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ResumeOptimizer {
    scorer: AtsScorer,
    tailor: TailorEngine,
    workflows: Option<WorkflowExecutor>,
}

impl Default for ResumeOptimizer {
    fn default() -> Self {
        Self::new(AtsScorer::default(), None)
    }
}

impl ResumeOptimizer {
    pub fn new(scorer: AtsScorer, workflows: Option<WorkflowExecutor>) -> Self {
        Self {
            tailor: TailorEngine::new(scorer.clone()),
            scorer,
            workflows,
        }
    }

    /// Scores a resume on its own, or against keywords drawn from a target
    /// role when one is given.
    pub fn analyze(&self, resume_text: &str, target_role: Option<&str>) -> AtsScoreResult {
        let keywords = match target_role.map(str::trim).filter(|r| !r.is_empty()) {
            Some(role) => self.tailor.job_keywords(role, None),
            None => Vec::new(),
        };
        self.scorer.score(resume_text, &keywords)
    }

    /// Runs the full local pipeline. Callers validate the request first.
    pub fn optimize(&self, request: &OptimizationRequest) -> OptimizationResult {
        let started = Instant::now();
        let level = request.optimization_level;

        let job_analysis = analyze_job(&request.job_description);
        let job_keywords = self
            .tailor
            .job_keywords(&request.job_description, request.target_role());
        let before = self.scorer.score(&request.resume_text, &job_keywords);
        let keyword_report = self.keyword_report(&before, &job_keywords);

        let tailoring =
            self.tailor
                .tailor(&request.resume_text, &request.job_description, request.target_role());

        let selected: Vec<&TailorSuggestion> = tailoring
            .suggestions
            .iter()
            .filter(|s| level.admits(s.impact))
            .collect();
        let (mut optimized_resume, _) =
            apply_suggestions(&request.resume_text, selected.iter().copied());
        let mut key_changes: Vec<String> = selected
            .iter()
            .filter(|s| s.is_applicable() && optimized_resume.contains(&s.suggested))
            .map(|s| format!("{}: {}", s.section, s.reason))
            .collect();

        if level == OptimizationLevel::Aggressive {
            let (strengthened, replaced) = strengthen_verbs(&optimized_resume);
            optimized_resume = strengthened;
            key_changes.extend(replaced);
        }
        if key_changes.is_empty() {
            key_changes.push(format!("No changes applied at the {level} optimization level"));
        }

        let after = self.scorer.score(&optimized_resume, &job_keywords);
        let recommendations = self.recommendations(
            &after,
            &keyword_report,
            &job_analysis,
            &optimized_resume,
            level,
        );

        info!(
            before = before.score,
            after = after.score,
            level = %level,
            "resume optimized"
        );

        OptimizationResult {
            original_resume: request.resume_text.clone(),
            optimized_resume,
            before_score: before.score,
            after_score: after.score,
            improvement: after.score as i32 - before.score as i32,
            key_changes,
            ats_analysis: after,
            job_analysis,
            tailoring,
            keyword_report,
            recommendations,
            optimization_level: level,
            source: SOURCE_LOCAL.to_string(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            generated_at: Utc::now(),
        }
    }

    /// Local optimization followed by an attempt at workflow enhancement.
    /// Any workflow failure leaves the local result untouched.
    pub async fn optimize_with_ai(&self, request: &OptimizationRequest) -> OptimizationResult {
        let started = Instant::now();
        let mut result = self.optimize(request);

        let outcome = self
            .run_workflow(
                WorkflowId::ResumeOptimization,
                enhancement_input(request, &result),
            )
            .await;
        self.apply_enhancement(request, &mut result, outcome);

        result.processing_time_ms = started.elapsed().as_millis() as u64;
        result
    }

    /// Swaps in the workflow's resume and rescores it, or logs why the local
    /// result stands.
    fn apply_enhancement(
        &self,
        request: &OptimizationRequest,
        result: &mut OptimizationResult,
        outcome: Result<WorkflowResult, WorkflowError>,
    ) {
        match outcome {
            Ok(output) => match text_field(&output.data, "optimizedResume") {
                Some(enhanced) => {
                    let job_keywords = self
                        .tailor
                        .job_keywords(&request.job_description, request.target_role());
                    let after = self.scorer.score(&enhanced, &job_keywords);
                    result.after_score = after.score;
                    result.improvement = after.score as i32 - result.before_score as i32;
                    result.ats_analysis = after;
                    result.optimized_resume = enhanced;
                    result
                        .key_changes
                        .push(format!("Enhanced by workflow execution {}", output.execution_id));
                    result.source = SOURCE_WORKFLOW.to_string();
                }
                None => warn!("Resume optimization workflow returned no resume text, using local result"),
            },
            Err(WorkflowError::NotConfigured) => {
                debug!("No workflow executor configured, using local optimization")
            }
            Err(e) => warn!("Resume optimization workflow failed, using local result: {e}"),
        }
    }

    pub async fn generate_cover_letter(
        &self,
        resume_text: &str,
        job_description: &str,
        company_name: Option<&str>,
    ) -> CoverLetter {
        let job = analyze_job(job_description);
        let highlights = matched_skills(resume_text, &job);

        let input = json!({
            "resumeText": resume_text,
            "jobDescription": job_description,
            "companyName": company_name,
            "highlights": highlights,
        });
        match self.run_workflow(WorkflowId::CoverLetter, input).await {
            Ok(output) => {
                if let Some(letter) = text_field(&output.data, "coverLetter") {
                    return CoverLetter {
                        cover_letter: letter,
                        source: SOURCE_WORKFLOW.to_string(),
                    };
                }
                warn!("Cover letter workflow returned no text, using local template");
            }
            Err(WorkflowError::NotConfigured) => {
                debug!("No workflow executor configured, using local cover letter template")
            }
            Err(e) => warn!("Cover letter workflow failed, using local template: {e}"),
        }

        CoverLetter {
            cover_letter: local_cover_letter(resume_text, &job, company_name, &highlights),
            source: SOURCE_LOCAL.to_string(),
        }
    }

    async fn run_workflow(
        &self,
        workflow: WorkflowId,
        input: Value,
    ) -> Result<WorkflowResult, WorkflowError> {
        match &self.workflows {
            Some(executor) => executor.execute(workflow, input).await,
            None => Err(WorkflowError::NotConfigured),
        }
    }

    /// Optimizes each slot in turn; slots that failed to parse or validate
    /// are reported in place without stopping the rest. Entries asking for AI
    /// enhancement are sent to the workflow executor as one concurrent batch.
    pub async fn batch_optimize(
        &self,
        requests: Vec<Result<OptimizationRequest, String>>,
    ) -> Vec<BatchEntry> {
        let mut entries = Vec::with_capacity(requests.len());
        let mut enhance = Vec::new();

        for (index, slot) in requests.into_iter().enumerate() {
            match slot.and_then(|request| request.validate().map(|()| request)) {
                Ok(request) => {
                    let result = self.optimize(&request);
                    if request.use_ai {
                        let input = enhancement_input(&request, &result);
                        enhance.push((index, request, input));
                    }
                    entries.push(BatchEntry {
                        index,
                        result: Some(Box::new(result)),
                        error: None,
                    });
                }
                Err(message) => {
                    warn!("Batch entry {index} rejected: {message}");
                    entries.push(BatchEntry {
                        index,
                        result: None,
                        error: Some(message),
                    });
                }
            }
        }

        if enhance.is_empty() {
            return entries;
        }

        let outcomes = match &self.workflows {
            Some(executor) => {
                let jobs = enhance
                    .iter_mut()
                    .map(|(_, _, input)| (WorkflowId::ResumeOptimization, input.take()))
                    .collect();
                executor.execute_batch(jobs).await
            }
            None => enhance
                .iter()
                .map(|_| Err(WorkflowError::NotConfigured))
                .collect(),
        };

        for ((index, request, _), outcome) in enhance.iter().zip(outcomes) {
            if let Some(result) = entries[*index].result.as_deref_mut() {
                self.apply_enhancement(request, result, outcome);
            }
        }
        entries
    }

    fn keyword_report(&self, score: &AtsScoreResult, job_keywords: &[KeywordImportance]) -> KeywordReport {
        let km = &score.breakdown.keyword_match;
        let critical_missing = job_keywords
            .iter()
            .filter(|k| k.importance >= self.scorer.thresholds.critical_importance)
            .filter(|k| km.missing.contains(&k.keyword))
            .map(|k| k.keyword.clone())
            .collect();
        let total = km.matched.len() + km.missing.len();
        let match_rate = if total == 0 {
            100
        } else {
            (km.matched.len() as f64 * 100.0 / total as f64).round() as u8
        };
        KeywordReport {
            matched: km.matched.clone(),
            missing: km.missing.clone(),
            critical_missing,
            match_rate,
        }
    }

    fn recommendations(
        &self,
        score: &AtsScoreResult,
        keywords: &KeywordReport,
        job: &JobAnalysisResult,
        optimized_resume: &str,
        level: OptimizationLevel,
    ) -> Vec<Recommendation> {
        use RecommendationPriority::{High, Low, Medium};

        let cutoff = self.scorer.thresholds.section_cutoff;
        let b = &score.breakdown;
        let mut recs = Vec::new();

        if !keywords.critical_missing.is_empty() {
            let top: Vec<&str> = keywords
                .critical_missing
                .iter()
                .take(5)
                .map(String::as_str)
                .collect();
            recs.push(Recommendation::new(
                High,
                "keywords",
                format!("Add critical job keywords: {}", top.join(", ")),
            ));
        }

        let index = ResumeIndex::new(optimized_resume);
        for skill in job
            .skills
            .iter()
            .filter(|s| s.importance >= SKILL_GAP_IMPORTANCE && !index.contains(&s.name))
            .take(MAX_SKILL_GAPS)
        {
            recs.push(Recommendation::new(
                High,
                "skills",
                format!("Highlight hands-on experience with {}", skill.name),
            ));
        }

        if b.content.score < cutoff {
            recs.extend(
                b.content
                    .issues
                    .iter()
                    .map(|issue| Recommendation::new(Medium, "content", issue.clone())),
            );
        }
        if b.structure.score < cutoff {
            recs.extend(
                b.structure
                    .issues
                    .iter()
                    .map(|issue| Recommendation::new(Medium, "structure", issue.clone())),
            );
        }
        if b.format.score < cutoff {
            recs.extend(
                b.format
                    .issues
                    .iter()
                    .map(|issue| Recommendation::new(Medium, "format", issue.clone())),
            );
        }
        if b.length.score < cutoff {
            recs.push(Recommendation::new(
                Low,
                "length",
                format!(
                    "Adjust resume length toward 400-800 words (currently {})",
                    b.length.word_count
                ),
            ));
        }
        if level == OptimizationLevel::Aggressive {
            recs.push(Recommendation::new(
                Low,
                "strategy",
                "Create role-specific resume variants for each type of position you target",
            ));
        }

        recs.sort_by_key(|r| r.priority);
        recs
    }
}

/// Replaces weak phrases with stronger verbs, keeping a leading capital.
/// Returns the new text and one change note per phrase replaced.
fn enhancement_input(request: &OptimizationRequest, local: &OptimizationResult) -> Value {
    json!({
        "resumeText": request.resume_text,
        "jobDescription": request.job_description,
        "targetRole": request.target_role,
        "optimizationLevel": request.optimization_level.as_str(),
        "keywords": local.keyword_report.critical_missing,
    })
}

pub fn strengthen_verbs(text: &str) -> (String, Vec<String>) {
    let mut current = text.to_string();
    let mut changes = Vec::new();

    for (weak, pattern, strong) in WEAK_VERBS.iter() {
        let count = pattern.find_iter(&current).count();
        if count == 0 {
            continue;
        }
        current = pattern
            .replace_all(&current, |caps: &Captures| {
                let starts_upper = caps[0].chars().next().is_some_and(char::is_uppercase);
                if starts_upper {
                    capitalize_first(strong)
                } else {
                    strong.to_string()
                }
            })
            .into_owned();
        changes.push(format!("Replaced weak phrase '{weak}' with '{strong}' ({count}x)"));
    }

    (current, changes)
}

fn text_field(data: &Value, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .or_else(|| data.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Job skills the resume already shows, most important first.
fn matched_skills(resume_text: &str, job: &JobAnalysisResult) -> Vec<String> {
    let index = ResumeIndex::new(resume_text);
    let mut skills: Vec<_> = job.skills.iter().filter(|s| index.contains(&s.name)).collect();
    skills.sort_by(|a, b| b.importance.cmp(&a.importance));
    skills.into_iter().take(3).map(|s| s.name.clone()).collect()
}

fn join_natural(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn local_cover_letter(
    resume_text: &str,
    job: &JobAnalysisResult,
    company_name: Option<&str>,
    highlights: &[String],
) -> String {
    let company = company_name
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .or_else(|| (job.company != COMPANY_NOT_FOUND).then(|| job.company.clone()))
        .unwrap_or_else(|| "your company".to_string());
    let title = if job.title == TITLE_NOT_FOUND {
        "open".to_string()
    } else {
        job.title.clone()
    };

    let sections = split_sections(resume_text);
    let name = sections
        .iter()
        .find(|s| s.kind == SectionKind::Header)
        .and_then(|s| s.content_lines().next())
        .map(|l| l.trim().to_string());
    let achievement = sections
        .iter()
        .filter(|s| s.kind == SectionKind::Experience)
        .flat_map(|s| s.content_lines())
        .find(|l| is_bullet(l))
        .map(|l| strip_bullet(l).trim_end_matches('.').to_string());

    let skills_sentence = if highlights.is_empty() {
        "My background aligns closely with the requirements of this role.".to_string()
    } else {
        format!(
            "My background in {} aligns closely with the requirements of this role.",
            join_natural(highlights)
        )
    };
    let experience_sentence = match achievement {
        Some(a) => format!("Among my recent accomplishments: {a}."),
        None => "I bring a track record of delivering measurable results and collaborating across teams."
            .to_string(),
    };

    let mut letter = format!(
        "Dear Hiring Manager,\n\n\
         I am excited to apply for the {title} position at {company}. {skills_sentence}\n\n\
         {experience_sentence}\n\n\
         Thank you for considering my application. I would welcome the opportunity to discuss how I can contribute to {company}.\n\n\
         Sincerely,"
    );
    if let Some(name) = name {
        letter.push('\n');
        letter.push_str(&name);
    }
    letter
}
