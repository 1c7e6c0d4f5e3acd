//! Resume section detection.
//!
//! A section header is any short, non-bullet line containing a known section
//! name. Everything before the first header is the contact/header block.

use serde::{Deserialize, Serialize};

use crate::analysis::text::is_bullet;

const MAX_HEADER_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    /// Contact block above the first recognised header.
    Header,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Awards,
    Publications,
    Volunteer,
    Languages,
}

impl SectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Header => "Header",
            SectionKind::Summary => "Summary",
            SectionKind::Experience => "Experience",
            SectionKind::Education => "Education",
            SectionKind::Skills => "Skills",
            SectionKind::Projects => "Projects",
            SectionKind::Certifications => "Certifications",
            SectionKind::Awards => "Awards",
            SectionKind::Publications => "Publications",
            SectionKind::Volunteer => "Volunteer",
            SectionKind::Languages => "Languages",
        }
    }
}

/// Longer names first so "work experience" wins over "experience".
const SECTION_NAMES: &[(&str, SectionKind)] = &[
    ("professional summary", SectionKind::Summary),
    ("summary", SectionKind::Summary),
    ("objective", SectionKind::Summary),
    ("profile", SectionKind::Summary),
    ("work experience", SectionKind::Experience),
    ("work history", SectionKind::Experience),
    ("experience", SectionKind::Experience),
    ("employment", SectionKind::Experience),
    ("education", SectionKind::Education),
    ("academic", SectionKind::Education),
    ("technical skills", SectionKind::Skills),
    ("skills", SectionKind::Skills),
    ("competencies", SectionKind::Skills),
    ("projects", SectionKind::Projects),
    ("certifications", SectionKind::Certifications),
    ("certificates", SectionKind::Certifications),
    ("licenses", SectionKind::Certifications),
    ("awards", SectionKind::Awards),
    ("achievements", SectionKind::Awards),
    ("publications", SectionKind::Publications),
    ("volunteer", SectionKind::Volunteer),
    ("languages", SectionKind::Languages),
];

/// Returns the section a line introduces, if it looks like a header.
pub fn detect_header(line: &str) -> Option<SectionKind> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() >= MAX_HEADER_LEN || is_bullet(trimmed) {
        return None;
    }
    let lower = trimmed.to_lowercase();
    SECTION_NAMES
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, kind)| *kind)
}

/// Distinct sections in order of first appearance.
pub fn detect_sections(text: &str) -> Vec<SectionKind> {
    let mut found = Vec::new();
    for kind in text.lines().filter_map(detect_header) {
        if !found.contains(&kind) {
            found.push(kind);
        }
    }
    found
}

/// A labelled block of resume lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeSection {
    pub kind: SectionKind,
    pub title: String,
    pub lines: Vec<String>,
}

impl ResumeSection {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn content_lines(&self) -> impl Iterator<Item = &String> {
        self.lines.iter().filter(|l| !l.trim().is_empty())
    }
}

/// Splits a resume into sections. Lines before the first header form a
/// `Header` section, which is omitted when empty.
pub fn split_sections(text: &str) -> Vec<ResumeSection> {
    let mut sections = vec![ResumeSection {
        kind: SectionKind::Header,
        title: String::new(),
        lines: Vec::new(),
    }];

    for line in text.lines() {
        match detect_header(line) {
            Some(kind) => sections.push(ResumeSection {
                kind,
                title: line.trim().to_string(),
                lines: Vec::new(),
            }),
            None => {
                if let Some(current) = sections.last_mut() {
                    current.lines.push(line.to_string());
                }
            }
        }
    }

    if sections[0].content_lines().next().is_none() {
        sections.remove(0);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Doe\njane@example.com\n\nSUMMARY\nBackend engineer.\n\nWork Experience\n- Built APIs\n- Led migrations\n\nEducation\nBSc Computer Science\n\nSkills\nRust, Go, SQL\n";

    #[test]
    fn test_detect_header_requires_short_line() {
        assert_eq!(detect_header("Skills"), Some(SectionKind::Skills));
        assert_eq!(detect_header("  WORK EXPERIENCE  "), Some(SectionKind::Experience));
        assert_eq!(
            detect_header("I have a lot of experience building distributed systems at scale"),
            None
        );
    }

    #[test]
    fn test_bullets_are_never_headers() {
        assert_eq!(detect_header("- 5 years experience"), None);
    }

    #[test]
    fn test_detect_sections_in_order() {
        assert_eq!(
            detect_sections(RESUME),
            vec![
                SectionKind::Summary,
                SectionKind::Experience,
                SectionKind::Education,
                SectionKind::Skills
            ]
        );
    }

    #[test]
    fn test_split_sections_keeps_header_block() {
        let sections = split_sections(RESUME);
        assert_eq!(sections[0].kind, SectionKind::Header);
        assert!(sections[0].text().contains("jane@example.com"));
        let experience = sections
            .iter()
            .find(|s| s.kind == SectionKind::Experience)
            .unwrap();
        assert_eq!(experience.title, "Work Experience");
        assert_eq!(experience.content_lines().count(), 2);
    }

    #[test]
    fn test_split_sections_without_header_block() {
        let sections = split_sections("Skills\nRust");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Skills);
    }
}
