use redline_core::ReviewRequest;

/// Persona line sent as the system message for every review.
pub const SYSTEM_PROMPT: &str = "You are a precise and professional AI code reviewer.";

/// Build the user prompt: instructions, the required response fields, and
/// the code verbatim.
pub fn user_message(request: &ReviewRequest) -> String {
    format!(
        "You are an expert software engineer. Review this {language} code from {filename}.\n\
Give a detailed JSON response with the following fields:\n\
- summary: short purpose of the code\n\
- issues: list of bugs or potential issues\n\
- improvements: list of coding or design improvements\n\
- performance: list of performance optimizations\n\
- security: list of any security concerns\n\
- refactor: improved version or snippet if possible\n\n\
Respond ONLY with a valid JSON object. Do not include Markdown formatting, explanations, or comments.\n\n\
Code:\n{code}",
        language = request.language,
        filename = request.filename,
        code = request.code,
    )
}
