//! Section templates for the LLM-facing prompt.

use flock_core::FunctionKind;

/// Placeholder sections recognized inside prompt templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// The user's task prompt
    UserPrompt,
    /// The serialized tuple block
    Tuples,
    /// The per-function response format contract
    ResponseFormat,
    /// The per-function processing instructions
    Instructions,
}

impl Section {
    /// The literal placeholder token for this section.
    pub fn token(&self) -> &'static str {
        match self {
            Section::UserPrompt => "{{USER_PROMPT}}",
            Section::Tuples => "{{TUPLES}}",
            Section::ResponseFormat => "{{RESPONSE_FORMAT}}",
            Section::Instructions => "{{INSTRUCTIONS}}",
        }
    }
}

/// Replace every occurrence of `token` in `template` with `content`.
pub fn replace_section(template: &str, token: &str, content: &str) -> String {
    template.replace(token, content)
}

const META_TEMPLATE: &str = "\
# System Setup
You are a semantic analysis engine embedded in a DBMS. You reason over a
structured table whose columns may mix plain text with content derived from
images or audio transcripts. Treat every column as part of the same logical
row.

## User's Task
**User Prompt**:
```
{{USER_PROMPT}}
```

## Table Data
```
{{TUPLES}}
```

## Instructions
```
{{INSTRUCTIONS}}
```

## Output Format
```
{{RESPONSE_FORMAT}}
```
Follow this format exactly, with no extra commentary.
";

const SCALAR_INSTRUCTIONS: &str = "\
- Treat each row independently as a standalone record.
- Answer the user prompt for that row alone, without referencing other rows.
- Return only the relevant answer, concise and context-aware.";

const AGGREGATE_INSTRUCTIONS: &str = "\
- First analyze each row according to the user prompt.
- Then combine the per-row results into a single answer for the whole table.
- Combining may mean summarizing, counting, ranking, or selecting.
- Return the combined answer in the expected response format, nothing else.";

const COMPLETE_FORMAT: &str = "\
For each row in the table, respond directly to the user's prompt. Address \
every row individually and omit none. Base each response solely on that row.";

const FILTER_FORMAT: &str = "\
For each row in the table, decide whether it satisfies the user's prompt. \
Return 'true' if it does and 'false' otherwise. Evaluate every row \
independently and skip none.";

const REDUCE_FORMAT: &str = "\
Extract from each row the information most pertinent to the user's prompt, \
then synthesize those insights into one coherent response covering all rows.";

const FIRST_OR_LAST_FORMAT: &str = "\
Identify the row that is {{RELEVANCE}} relevant to the user's prompt. Return \
only the single index number of that row from the `flock_row_id` field. The \
response must be one integer value, not an array.";

const RERANK_FORMAT: &str = "\
Rank the rows in descending order of relevance to the user's prompt. Return \
a flat array of the `flock_row_id` values in that order — plain integers, \
not nested arrays. Judge each row independently.";

fn instructions(kind: FunctionKind) -> &'static str {
    if kind.is_aggregate() {
        AGGREGATE_INSTRUCTIONS
    } else {
        SCALAR_INSTRUCTIONS
    }
}

fn response_format(kind: FunctionKind) -> String {
    match kind {
        FunctionKind::Complete | FunctionKind::Embedding => COMPLETE_FORMAT.to_string(),
        FunctionKind::Filter => FILTER_FORMAT.to_string(),
        FunctionKind::Reduce => REDUCE_FORMAT.to_string(),
        FunctionKind::First => replace_section(FIRST_OR_LAST_FORMAT, "{{RELEVANCE}}", "most"),
        FunctionKind::Last => replace_section(FIRST_OR_LAST_FORMAT, "{{RELEVANCE}}", "least"),
        FunctionKind::Rerank => RERANK_FORMAT.to_string(),
    }
}

/// The meta template for a function, with instructions and response format
/// filled in. `{{USER_PROMPT}}` and `{{TUPLES}}` remain for the renderer.
pub fn prompt_template(kind: FunctionKind) -> String {
    let template = replace_section(
        META_TEMPLATE,
        Section::Instructions.token(),
        instructions(kind),
    );
    replace_section(
        &template,
        Section::ResponseFormat.token(),
        &response_format(kind),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_keep_user_sections_open() {
        for kind in FunctionKind::ALL {
            let template = prompt_template(kind);
            assert!(template.contains("{{USER_PROMPT}}"), "{kind}");
            assert!(template.contains("{{TUPLES}}"), "{kind}");
            assert!(!template.contains("{{INSTRUCTIONS}}"), "{kind}");
            assert!(!template.contains("{{RESPONSE_FORMAT}}"), "{kind}");
        }
    }

    #[test]
    fn first_and_last_differ_by_relevance() {
        let first = prompt_template(FunctionKind::First);
        let last = prompt_template(FunctionKind::Last);
        assert!(first.contains("most relevant"));
        assert!(last.contains("least relevant"));
        assert!(first.contains("flock_row_id"));
    }

    #[test]
    fn replace_section_hits_every_occurrence() {
        let out = replace_section("{{X}} and {{X}}", "{{X}}", "y");
        assert_eq!(out, "y and y");
    }
}
