//! # Prompts Module
//!
//! Fixed instructions sent to each provider, and the function schema the
//! OpenAI path forces the model to call.

use rig::completion::ToolDefinition;

/// Name of the function the OpenAI model must call.
pub const RESEARCH_FUNCTION_NAME: &str = "provide_research_results";

/// System turn for the OpenAI chat completion.
pub const OPENAI_SYSTEM_PROMPT: &str = "You are acting as a research assistant. \
Answer the user's question thoroughly and accurately, suggest follow-up questions \
that would deepen the research, and rate your confidence in the answer between 0 and 1. \
Always respond by calling the provide_research_results function.";

/// Instructions prepended to the query for Gemini, which has no forced
/// structured output. The whole text reply must be one JSON object.
pub const GEMINI_SYSTEM_PROMPT: &str = r#"You are acting as a research assistant.
Answer the research question below thoroughly and accurately.

Respond with ONLY a JSON object, with no surrounding text and no markdown code fences.
The object must have exactly these keys:
  "answer": a string with your comprehensive answer,
  "followUpQuestions": an array of strings with questions that would deepen the research,
  "confidence": a number between 0 and 1 rating your confidence in the answer.
You may add further keys with additional structure if it helps.

Research question:"#;

/// Build the single Gemini prompt: instructions, then the query.
pub fn gemini_prompt(query: &str) -> String {
    format!("{}\n{}", GEMINI_SYSTEM_PROMPT, query)
}

/// The function the OpenAI model is forced to call. All three parameters
/// are required.
pub fn research_function() -> ToolDefinition {
    ToolDefinition {
        name: RESEARCH_FUNCTION_NAME.to_string(),
        description: "Provide the research answer, follow-up questions and a confidence score."
            .to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "A comprehensive answer to the research question"
                },
                "followUpQuestions": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Questions that would deepen the research"
                },
                "confidence": {
                    "type": "number",
                    "description": "Confidence in the answer, from 0 to 1"
                }
            },
            "required": ["answer", "followUpQuestions", "confidence"]
        }),
    }
}
