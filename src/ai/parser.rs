use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured outcome of a completed evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_summary: String,
}

/// Errors raised while extracting the result from raw model output
#[derive(Debug)]
pub enum ParseError {
    /// Raw text contains no brace-enclosed candidate JSON
    NoJsonFound,

    /// Candidate substring failed to decode into the result shape
    MalformedJson(serde_json::Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::NoJsonFound => write!(f, "no JSON found in response"),
            ParseError::MalformedJson(e) => write!(f, "failed to decode JSON: {}", e),
        }
    }
}

impl std::error::Error for ParseError {}

/// Extract and validate the evaluation result embedded in raw model output.
///
/// The model wraps its answer in prose, so the candidate document is whatever
/// sits between the first `{` and the last `}`. Out-of-range scores are
/// replaced with neutral defaults rather than rejected, keeping an otherwise
/// usable response.
pub fn parse(raw: &str) -> Result<EvaluationResult, ParseError> {
    let start = raw.find('{').ok_or(ParseError::NoJsonFound)?;
    let end = raw.rfind('}').ok_or(ParseError::NoJsonFound)?;
    if end < start {
        return Err(ParseError::NoJsonFound);
    }

    let candidate = &raw[start..=end];

    let mut result: EvaluationResult =
        serde_json::from_str(candidate).map_err(ParseError::MalformedJson)?;

    if !(0.0..=1.0).contains(&result.cv_match_rate) {
        result.cv_match_rate = 0.5;
    }
    if !(0.0..=10.0).contains(&result.project_score) {
        result.project_score = 5.0;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cv_match_rate: f64, project_score: f64) -> String {
        format!(
            r#"{{
                "cv_match_rate": {},
                "cv_feedback": "solid backend profile",
                "project_score": {},
                "project_feedback": "clean architecture",
                "overall_summary": "good fit"
            }}"#,
            cv_match_rate, project_score
        )
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let raw = format!(
            "Here is the evaluation you asked for:\n```json\n{}\n```\nHope this helps!",
            sample(0.8, 7.5)
        );
        let result = parse(&raw).unwrap();
        assert_eq!(result.cv_match_rate, 0.8);
        assert_eq!(result.project_score, 7.5);
        assert_eq!(result.cv_feedback, "solid backend profile");
    }

    #[test]
    fn in_range_scores_pass_through_unchanged() {
        let result = parse(&sample(0.0, 10.0)).unwrap();
        assert_eq!(result.cv_match_rate, 0.0);
        assert_eq!(result.project_score, 10.0);
    }

    #[test]
    fn clamps_cv_match_rate_above_range() {
        let result = parse(&sample(1.7, 6.0)).unwrap();
        assert_eq!(result.cv_match_rate, 0.5);
        assert_eq!(result.project_score, 6.0);
    }

    #[test]
    fn clamps_negative_cv_match_rate() {
        let result = parse(&sample(-0.2, 6.0)).unwrap();
        assert_eq!(result.cv_match_rate, 0.5);
    }

    #[test]
    fn clamps_project_score_outside_range() {
        let result = parse(&sample(0.9, 42.0)).unwrap();
        assert_eq!(result.project_score, 5.0);
        assert_eq!(result.cv_match_rate, 0.9);

        let result = parse(&sample(0.9, -1.0)).unwrap();
        assert_eq!(result.project_score, 5.0);
    }

    #[test]
    fn fails_when_no_braces_present() {
        let err = parse("the model refused to answer").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonFound));
    }

    #[test]
    fn fails_when_braces_are_reversed() {
        let err = parse("} nothing useful {").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonFound));
    }

    #[test]
    fn fails_on_invalid_json_between_braces() {
        let err = parse("prefix { not json at all } suffix").unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson(_)));
    }
}
