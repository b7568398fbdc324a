//! Prompt construction for SQL generation.

/// Builds the prompt for a question and a schema descriptor (possibly empty).
///
/// Both values are inserted in one pass, so braces inside either are kept
/// as written. Only the dialect is named; quoting and escaping rules are
/// left to the model.
pub fn build_prompt(question: &str, schema: &str) -> String {
    format!(
        r#"
You are an expert SQL assistant. Convert this natural language question into a valid SQLite SQL query.
Return ONLY the SQL query. No explanation. No formatting.

Question: {question}
{schema}
"#
    )
}
