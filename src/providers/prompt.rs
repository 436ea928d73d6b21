/// Instruction prepended to text content such as the post caption
pub const TEXT_SUMMARY_PROMPT: &str =
    "Summarize the following content for a recipe instruction:";

/// Instruction sent alongside every image
pub const IMAGE_SUMMARY_PROMPT: &str =
    "Analyze the following image and summarize it as a recipe instruction";

/// Hint given to the transcription model for video soundtracks
pub const AUDIO_TRANSCRIPTION_PROMPT: &str =
    "Analyze the audio content for a recipe instruction";

/// The instruction used to merge all per-asset summaries into one recipe.
///
/// Loaded from `aggregate_prompt.txt` at compile time.
pub const RECIPE_AGGREGATION_PROMPT: &str = include_str!("aggregate_prompt.txt");

/// Build the text summarization request for one piece of content
pub fn text_summary_request(content: &str) -> String {
    format!("{}\n\n{}", TEXT_SUMMARY_PROMPT, content)
}

/// Build the final aggregation request from the newline-joined summaries
pub fn aggregation_request(combined: &str) -> String {
    format!("{}\n\n{}", RECIPE_AGGREGATION_PROMPT.trim_end(), combined)
}
