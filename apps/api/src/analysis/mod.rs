//! Resume analysis — keyword extraction, job posting analysis, ATS scoring,
//! tailoring and the optimizer that ties them together.

pub mod ats_scorer;
pub mod handlers;
pub mod job_analyzer;
pub mod keywords;
pub mod optimizer;
pub mod sections;
pub mod tailor;
pub mod text;
