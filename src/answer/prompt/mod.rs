
use super::INSUFFICIENT_ANSWER;

/// Assemble the answer prompt: raw context, summary and question, followed by
/// instructions that confine the answer to the raw context
#[inline]
pub fn build_prompt(question: &str, summary: &str, raw_context: &str) -> String {
    format!(
        "You are an academic STRICT RAG answer system.\n\n\
         RAW CONTEXT:\n{raw_context}\n\n\
         SUMMARY:\n{summary}\n\n\
         QUESTION:\n{question}\n\n\
         TASK:\n\
         - Answer ONLY using the RAW CONTEXT.\n\
         - If the context does not contain the information, say:\n  \
         \"{INSUFFICIENT_ANSWER}\"\n\
         - NO assumptions.\n\
         - NO outside reasoning.\n\
         - NO hallucination.\n\
         - ONE short paragraph (3–5 sentences)."
    )
}
