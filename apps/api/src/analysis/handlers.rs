use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::analysis::ats_scorer::AtsScoreResult;
use crate::analysis::job_analyzer::{analyze_job, JobAnalysisResult};
use crate::analysis::optimizer::{
    BatchEntry, CoverLetter, OptimizationLevel, OptimizationPreview, OptimizationRequest,
    Recommendation,
};
use crate::errors::AppError;
use crate::state::AppState;

/// Envelope for every successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Non-blank text, else `None`.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// POST /api/optimize
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeBody {
    pub resume_text: Option<String>,
    pub job_description: Option<String>,
    pub optimization_level: Option<String>,
    pub target_role: Option<String>,
    #[serde(rename = "useAI")]
    pub use_ai: Option<bool>,
}

impl OptimizeBody {
    /// Converts without checking the texts; only the level can fail here.
    fn into_request(self) -> Result<OptimizationRequest, String> {
        let optimization_level = match present(self.optimization_level) {
            Some(level) => level.parse::<OptimizationLevel>()?,
            None => OptimizationLevel::default(),
        };
        Ok(OptimizationRequest {
            resume_text: self.resume_text.unwrap_or_default(),
            job_description: self.job_description.unwrap_or_default(),
            optimization_level,
            target_role: present(self.target_role),
            use_ai: self.use_ai.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    pub optimized_resume: String,
    pub ats_score: u8,
    pub improvement: i32,
    pub key_changes: Vec<String>,
    /// Milliseconds.
    pub processing_time: u64,
    pub recommendations: Vec<Recommendation>,
    pub source: String,
}

/// POST /api/optimize
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(body): Json<OptimizeBody>,
) -> Result<Json<ApiResponse<OptimizeResponse>>, AppError> {
    let request = body.into_request().map_err(AppError::Validation)?;
    request.validate().map_err(AppError::Validation)?;

    let result = if request.use_ai {
        state.optimizer.optimize_with_ai(&request).await
    } else {
        state.optimizer.optimize(&request)
    };

    Ok(ApiResponse::ok(OptimizeResponse {
        optimized_resume: result.optimized_resume,
        ats_score: result.after_score,
        improvement: result.improvement,
        key_changes: result.key_changes,
        processing_time: result.processing_time_ms,
        recommendations: result.recommendations,
        source: result.source,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// POST /api/analyze
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    pub resume_text: Option<String>,
    pub target_role: Option<String>,
}

/// POST /api/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<ApiResponse<AtsScoreResult>>, AppError> {
    let resume_text = present(body.resume_text)
        .ok_or_else(|| AppError::Validation("Resume text is required".to_string()))?;
    let target_role = present(body.target_role);

    let result = state
        .optimizer
        .analyze(&resume_text, target_role.as_deref());
    Ok(ApiResponse::ok(result))
}

// ────────────────────────────────────────────────────────────────────────────
// POST /api/preview
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBody {
    pub resume_text: Option<String>,
    pub job_description: Option<String>,
}

/// POST /api/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(body): Json<PreviewBody>,
) -> Result<Json<ApiResponse<OptimizationPreview>>, AppError> {
    let (Some(resume_text), Some(job_description)) =
        (present(body.resume_text), present(body.job_description))
    else {
        return Err(AppError::Validation(
            "Resume text and job description are required".to_string(),
        ));
    };

    Ok(ApiResponse::ok(
        state.optimizer.preview(&resume_text, &job_description),
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// POST /api/cover-letter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterBody {
    pub resume_text: Option<String>,
    pub job_description: Option<String>,
    pub company_name: Option<String>,
}

/// POST /api/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(body): Json<CoverLetterBody>,
) -> Result<Json<ApiResponse<CoverLetter>>, AppError> {
    let (Some(resume_text), Some(job_description)) =
        (present(body.resume_text), present(body.job_description))
    else {
        return Err(AppError::Validation(
            "Resume text and job description are required".to_string(),
        ));
    };
    let company_name = present(body.company_name);

    let letter = state
        .optimizer
        .generate_cover_letter(&resume_text, &job_description, company_name.as_deref())
        .await;
    Ok(ApiResponse::ok(letter))
}

// ────────────────────────────────────────────────────────────────────────────
// POST /api/job/analyze
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAnalyzeBody {
    pub job_description: Option<String>,
}

/// POST /api/job/analyze
pub async fn handle_job_analyze(
    Json(body): Json<JobAnalyzeBody>,
) -> Result<Json<ApiResponse<JobAnalysisResult>>, AppError> {
    let job_description = present(body.job_description)
        .ok_or_else(|| AppError::Validation("Job description is required".to_string()))?;
    Ok(ApiResponse::ok(analyze_job(&job_description)))
}

// ────────────────────────────────────────────────────────────────────────────
// POST /api/optimize/batch
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct BatchBody {
    #[serde(default)]
    pub requests: Vec<OptimizeBody>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub total: usize,
    pub succeeded: usize,
    pub results: Vec<BatchEntry>,
}

/// POST /api/optimize/batch
pub async fn handle_batch_optimize(
    State(state): State<AppState>,
    Json(body): Json<BatchBody>,
) -> Result<Json<ApiResponse<BatchResponse>>, AppError> {
    if body.requests.is_empty() {
        return Err(AppError::Validation(
            "At least one optimization request is required".to_string(),
        ));
    }
    let requests = body
        .requests
        .into_iter()
        .map(OptimizeBody::into_request)
        .collect();

    let results = state.optimizer.batch_optimize(requests).await;
    let succeeded = results.iter().filter(|e| e.result.is_some()).count();
    Ok(ApiResponse::ok(BatchResponse {
        total: results.len(),
        succeeded,
        results,
    }))
}
