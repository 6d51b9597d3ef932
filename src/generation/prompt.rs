//! Prompts sent to the completion service.

/// Present in every question prompt; the keyword-template tier keys on it.
pub const QUESTION_MARKER: &str = "listening comprehension test question";
/// Present in exercise recommendation prompts.
pub const RECOMMEND_MARKER: &str = "recommend exercises";

const FORMAT_INSTRUCTIONS: &str = "\
Write exactly three question blocks separated by a blank line. Use this format for each block:

Question: <question text>
1. <option>
2. <option>
3. <option>
4. <option>
Correct answer: <number of the correct option, 1-4>
Difficulty: <beginner|intermediate|advanced>";

/// Prompt asking for questions about a transcript.
pub fn build_prompt(transcript: &str) -> String {
    format!(
        "Create a {QUESTION_MARKER} set for the following audio transcript.\n\n\
         Transcript:\n\"\"\"\n{}\n\"\"\"\n\n{FORMAT_INSTRUCTIONS}",
        transcript.trim()
    )
}

/// Prompt used when no transcript exists; only the recording's metadata is known.
pub fn build_metadata_prompt(title: &str, artist: Option<&str>, duration_secs: f64) -> String {
    let by = artist.map(|a| format!(" by {}", a)).unwrap_or_default();
    format!(
        "Create a {QUESTION_MARKER} set for a {:.0}-second audio recording titled \"{}\"{}. \
         No transcript is available, so ask about what such a recording is likely to cover.\n\n\
         {FORMAT_INSTRUCTIONS}",
        duration_secs.max(0.0),
        title,
        by
    )
}

/// Prompt asking for follow-up exercise recommendations.
pub fn build_recommendation_prompt(completed_titles: &[String]) -> String {
    format!(
        "Based on the listening exercises completed so far ({}), recommend exercises \
         the learner should try next. List three titles with a one-line reason each.",
        completed_titles.join(", ")
    )
}
