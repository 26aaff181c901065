//! Prompt builders for the two evaluation stages.

/// Build the stage-1 analysis prompt covering skills, experience level,
/// project complexity and alignment between the two documents.
pub fn stage1_analysis(cv: &str, report: &str) -> String {
    format!(
        r#"
You are an expert CV and project evaluator. Analyze the provided CV and project report.

CV Content:
{cv}

Project Report Content:
{report}

Please provide an initial analysis focusing on:
1. Key skills and experience from the CV
2. Project complexity and technical depth
3. Alignment between CV skills and project requirements
4. Initial impressions and areas that need deeper evaluation

Provide a structured analysis in JSON format with the following structure:
{{
  "cv_skills": ["skill1", "skill2", ...],
  "cv_experience_level": "junior/mid/senior",
  "project_complexity": "low/medium/high",
  "project_technologies": ["tech1", "tech2", ...],
  "skill_alignment": "poor/fair/good/excellent",
  "areas_for_deeper_evaluation": ["area1", "area2", ...]
}}
"#
    )
}

/// Build the stage-2 evaluation prompt, grounding the final scoring in the
/// stage-1 analysis and the retrieved guideline passages.
pub fn stage2_evaluation(stage1: &str, context: &[String], cv: &str, report: &str) -> String {
    let context_block = context.join("\n\n");

    format!(
        r#"
You are an expert CV and project evaluator. Based on the initial analysis and additional context, provide a comprehensive evaluation.

Initial Analysis:
{stage1}

Additional Context from Knowledge Base:
{context_block}

CV Content:
{cv}

Project Report Content:
{report}

Based on all this information, provide a comprehensive evaluation in the following JSON format:
{{
  "cv_match_rate": 0.0-1.0,
  "cv_feedback": "detailed feedback on CV quality, strengths, and areas for improvement",
  "project_score": 0.0-10.0,
  "project_feedback": "detailed feedback on project quality, technical implementation, and documentation",
  "overall_summary": "comprehensive summary of the candidate's suitability and recommendations"
}}

Scoring Guidelines:
- cv_match_rate: How well the CV matches the project requirements (0.0 = no match, 1.0 = perfect match)
- project_score: Overall project quality (0-10 scale, where 10 is exceptional)

Provide constructive, specific feedback that helps the candidate improve.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage1_embeds_both_documents() {
        let prompt = stage1_analysis("golang backend cv", "rest api project");
        assert!(prompt.contains("golang backend cv"));
        assert!(prompt.contains("rest api project"));
        assert!(prompt.contains("cv_experience_level"));
    }

    #[test]
    fn stage2_embeds_analysis_and_context() {
        let context = vec!["guideline one".to_string(), "guideline two".to_string()];
        let prompt = stage2_evaluation("analysis text", &context, "cv text", "report text");
        assert!(prompt.contains("analysis text"));
        assert!(prompt.contains("guideline one\n\nguideline two"));
        assert!(prompt.contains("cv_match_rate"));
        assert!(prompt.contains("overall_summary"));
    }
}
