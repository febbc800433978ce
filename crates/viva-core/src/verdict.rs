//! Turns the judge's free-form rationale into a boolean.
//!
//! Canonical strategy: direct suffix inspection of the judge text. The rubric
//! makes the judge end with a lone digit, so after trimming trailing
//! whitespace a terminal `1` (with or without a closing period) is the accept
//! signal. Everything else, including empty or unrecognizable output, is a
//! rejection. This function never fails.

pub fn extract_verdict(judge_text: &str) -> bool {
    let trimmed = judge_text.trim_end();
    trimmed.ends_with('1') || trimmed.ends_with("1.")
}
