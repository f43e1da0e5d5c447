//! Prompt templates for the evaluation session

use crate::story::DocumentRecord;

/// Templates for the fact-checking agent
pub struct EvaluationPromptTemplate;

impl EvaluationPromptTemplate {
    /// System prompt for the evaluation session
    pub fn system() -> &'static str {
        r#"You review StoryTime stories for factual accuracy and sourcing. Work through every step in order.

1. Read the story JSON you are given.
2. List 5 to 10 specific, checkable claims from it: dates, names, events, figures, quotes.
3. Check each claim on its own with web_search.
4. Mark each claim ACCURATE or INACCURATE with a one-line reason.
   The story's sources are the URLs in its research_document field (search results there carry a "URL:" line). Check each of those URLs and mark it VALID or INVALID depending on whether it exists and supports the story.
5. Call update_evaluation_report with all four fields:
   - accuracy_proportion: accurate claims / claims checked, between 0 and 1
   - accuracy_report: the numbered claim list, then the totals, then a line exactly of the form
     CALCULATION: <accurate>/<checked>
   - citations_proportion: valid sources / sources checked, between 0 and 1
   - citations_report: the numbered source list, then the totals, then
     CALCULATION: <valid>/<checked>
   Use calculate_evaluation_metrics if you want the division done for you.
6. Call save_evaluation_report with the report name you were given. The report cannot be changed after it is saved.

Use get_current_evaluation_status at any time to see what is recorded so far."#
    }

    /// User prompt carrying the story under review
    pub fn review(story: &DocumentRecord, report_name: &str) -> String {
        let story_json = serde_json::to_string_pretty(&story.with_images_elided())
            .unwrap_or_else(|_| "{}".to_string());
        format!(
            r#"Evaluate this story and save the report as "{}".

```json
{}
```"#,
            report_name, story_json
        )
    }
}
