//! Prompt contract for grounded answer synthesis

use citewise_common::models::INSUFFICIENT_EVIDENCE;

/// Appended to the prompt when the previous response failed to parse
pub const FORMAT_CORRECTION: &str = "Your previous response did not match the required format";

/// JSON schema the model's response must satisfy
pub const RESPONSE_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "answer": {"type": "string", "description": "Direct answer to the research question"},
    "key_points": {"type": "array", "items": {"type": "string"}, "description": "Key supporting points"},
    "evidence": {"type": "object", "additionalProperties": {"type": "string"}, "description": "Paper-wise evidence with paper names as keys"},
    "limitations": {"type": "string", "description": "Limitations or uncertainties"},
    "references": {"type": "array", "items": {"type": "string"}, "description": "List of cited papers"}
  },
  "required": ["answer", "key_points", "evidence", "limitations", "references"]
}"#;

/// Build the synthesis prompt for `question` over the assembled `context`
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are an AI research assistant.

Your task is to answer the user's question using ONLY the information provided
in the Context below.

STRICT CONSTRAINTS:
- Do NOT use any external knowledge.
- Do NOT guess, assume, or speculate.
- Every factual claim MUST be supported by the Context.
- If the Context does not contain enough information, respond EXACTLY with:
  "{insufficient}"

You MUST return your answer as a single JSON object that strictly follows
the schema below. Do not add any text outside the JSON.

Context:
{context}

Question:
{question}

STRUCTURED RESPONSE REQUIREMENTS:

- answer:
  A concise, direct answer to the question based strictly on the Context.

- key_points:
  A list of short statements summarizing the main findings directly
  supported by the Context.

- evidence:
  An object where each key is the name of a paper from a [Source: ...] tag
  in the Context, and each value is a short explanation of the evidence
  taken from that paper. Use each paper name at most once.

- limitations:
  Uncertainties, gaps, or limitations due to missing or incomplete
  information in the Context.

- references:
  The paper names from the Context that the answer relies on.

The response MUST conform to this JSON schema:
{schema}
"#,
        insufficient = INSUFFICIENT_EVIDENCE,
        context = context,
        question = question,
        schema = RESPONSE_SCHEMA,
    )
}

/// Re-prompt after a response that failed validation
pub fn corrective_prompt(base: &str, violation: &str) -> String {
    format!(
        "{base}\n{FORMAT_CORRECTION} ({violation}). Respond again with only the JSON object described above.\n"
    )
}
