//! Prompt templates for SQL generation.
//!
//! The schema description and the user's question are substituted verbatim.
//! The question is not escaped.

/// System message sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You write safe, read-only SQL for PostgreSQL.";

/// Instructional template; `{schema}` and `{question}` are substituted.
pub const BASE_PROMPT: &str = "\
You are an expert SQL assistant.
You receive:
1) A database schema.
2) A natural language question from the user.

You must:
- Return a single PostgreSQL SELECT query.
- Never use INSERT, UPDATE, DELETE, DROP, ALTER, or other DDL/DML.
- Use only tables and columns that exist in the schema.
- Do not include explanations, only the SQL.
Schema:
{schema}

User question:
{question}

Return ONLY the SQL query.
";

/// Render the generation prompt for a schema description and question.
pub fn build_prompt(schema: &str, question: &str) -> String {
    // Substitute the question last so schema text cannot inject a placeholder
    let (head, tail) = BASE_PROMPT
        .split_once("{question}")
        .unwrap_or((BASE_PROMPT, ""));
    let mut prompt = head.replacen("{schema}", schema, 1);
    prompt.push_str(question);
    prompt.push_str(tail);
    prompt
}
