//! Report rendering: severity tiers and the plain-text report printed by the CLI.

use serde::Serialize;
use std::fmt::Write;

use crate::analysis::AnalysisResult;

pub const AUTHENTIC_THRESHOLD: f64 = 90.0;
pub const CAUTION_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Authentic,
    Caution,
    Suspicious,
}

impl SeverityTier {
    /// Thresholds are inclusive: 90 is authentic, 70 is caution.
    pub fn classify(similarity: f64) -> Self {
        if similarity >= AUTHENTIC_THRESHOLD {
            SeverityTier::Authentic
        } else if similarity >= CAUTION_THRESHOLD {
            SeverityTier::Caution
        } else {
            SeverityTier::Suspicious
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SeverityTier::Authentic => "authentic",
            SeverityTier::Caution => "caution",
            SeverityTier::Suspicious => "suspicious",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Authentic => "Likely authentic",
            SeverityTier::Caution => "Use caution",
            SeverityTier::Suspicious => "Suspicious",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SeverityTier::Authentic => "This logo closely matches the official brand mark.",
            SeverityTier::Caution => {
                "This logo differs from the official mark in some details. Check the source."
            }
            SeverityTier::Suspicious => {
                "This logo deviates significantly from the official mark and may be counterfeit."
            }
        }
    }
}

/// Tier plus its display strings, as returned to the browser
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub tier: SeverityTier,
    pub label: &'static str,
    pub message: &'static str,
}

impl Verdict {
    pub fn for_analysis(analysis: &AnalysisResult) -> Self {
        let tier = SeverityTier::classify(analysis.similarity_percentage);
        Self {
            tier,
            label: tier.label(),
            message: tier.message(),
        }
    }
}

/// Analysis and verdict together
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis: AnalysisResult,
    pub verdict: Verdict,
}

impl AnalysisReport {
    pub fn new(analysis: AnalysisResult) -> Self {
        let verdict = Verdict::for_analysis(&analysis);
        Self { analysis, verdict }
    }
}

/// Render a report for terminal output
pub fn render_text(report: &AnalysisReport) -> String {
    let a = &report.analysis;
    let mut out = String::new();
    let _ = writeln!(out, "Brand: {}", a.brand_name);
    // Floored so the shown percentage never crosses a threshold its tier did not
    let _ = writeln!(
        out,
        "Similarity: {}% [{}]",
        a.similarity_percentage.floor(),
        report.verdict.label
    );
    let _ = writeln!(out, "{}", report.verdict.message);
    let _ = writeln!(out);
    for (title, body) in [
        ("Company", &a.company_info),
        ("Founding background", &a.founding_background),
        ("Symbolic meaning", &a.symbolic_meaning),
        ("Originality", &a.originality_interpretation),
    ] {
        let _ = writeln!(out, "{}:", title);
        let _ = writeln!(out, "  {}", body.trim());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(SeverityTier::classify(100.0), SeverityTier::Authentic);
        assert_eq!(SeverityTier::classify(90.0), SeverityTier::Authentic);
        assert_eq!(SeverityTier::classify(89.0), SeverityTier::Caution);
        assert_eq!(SeverityTier::classify(89.99), SeverityTier::Caution);
        assert_eq!(SeverityTier::classify(70.0), SeverityTier::Caution);
        assert_eq!(SeverityTier::classify(69.0), SeverityTier::Suspicious);
        assert_eq!(SeverityTier::classify(69.99), SeverityTier::Suspicious);
        assert_eq!(SeverityTier::classify(0.0), SeverityTier::Suspicious);
    }

    #[test]
    fn test_tier_serializes_as_key() {
        for tier in [
            SeverityTier::Authentic,
            SeverityTier::Caution,
            SeverityTier::Suspicious,
        ] {
            assert_eq!(serde_json::to_value(tier).unwrap(), tier.key());
        }
    }

    #[test]
    fn test_render_text_includes_sections() {
        let report = AnalysisReport::new(AnalysisResult {
            brand_name: "Acme".into(),
            company_info: "Anvils".into(),
            founding_background: "1920".into(),
            symbolic_meaning: "Strength".into(),
            similarity_percentage: 72.4,
            originality_interpretation: "Minor differences".into(),
        });
        let text = render_text(&report);
        assert!(text.starts_with("Brand: Acme\n"));
        assert!(text.contains("Similarity: 72% [Use caution]"));
        assert!(text.contains("Symbolic meaning:\n  Strength"));
    }

    fn render_score(score: f64) -> String {
        render_text(&AnalysisReport::new(AnalysisResult {
            brand_name: "Acme".into(),
            company_info: String::new(),
            founding_background: String::new(),
            symbolic_meaning: String::new(),
            similarity_percentage: score,
            originality_interpretation: String::new(),
        }))
    }

    #[test]
    fn test_render_text_score_agrees_with_tier_near_thresholds() {
        assert!(render_score(89.6).contains("Similarity: 89% [Use caution]"));
        assert!(render_score(90.0).contains("Similarity: 90% [Likely authentic]"));
        assert!(render_score(69.5).contains("Similarity: 69% [Suspicious]"));
        assert!(render_score(70.0).contains("Similarity: 70% [Use caution]"));
    }
}
