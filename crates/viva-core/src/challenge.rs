use crate::errors::ChallengeError;
use crate::model::{Challenge, ReferencePointer};

pub const ANSWER_SEPARATOR: &str = "\n\n# ANSWER\n\n";
pub const REFERENCES_SEPARATOR: &str = "\n\n# References\n\n";

/// Splits a raw challenge document into question, professor answer and
/// reference pointers.
///
/// Both separators must occur exactly once; anything else is a
/// `MalformedChallenge`. Reference lines are pipe-delimited
/// `filename|section_title`, blank lines skipped. Whether the referenced
/// files exist is checked later, by the resolver.
pub fn parse(raw: &str) -> Result<Challenge, ChallengeError> {
    let question_answer = split_once_exact(raw, ANSWER_SEPARATOR)?;
    let answer_references = split_once_exact(question_answer.1, REFERENCES_SEPARATOR)?;

    let mut references = Vec::new();
    for line in answer_references.1.split('\n') {
        if line.is_empty() {
            continue;
        }
        let (document_id, section_title) = line.split_once('|').ok_or_else(|| {
            ChallengeError::MalformedChallenge(format!(
                "reference line missing '|' delimiter: {line:?}"
            ))
        })?;
        references.push(ReferencePointer {
            document_id: document_id.to_string(),
            section_title: section_title.to_string(),
        });
    }

    Ok(Challenge {
        question: question_answer.0.to_string(),
        reference_answer: answer_references.0.to_string(),
        references,
    })
}

fn split_once_exact<'a>(
    text: &'a str,
    separator: &str,
) -> Result<(&'a str, &'a str), ChallengeError> {
    let count = text.matches(separator).count();
    if count != 1 {
        return Err(ChallengeError::MalformedChallenge(format!(
            "expected separator {separator:?} exactly once, found {count} times"
        )));
    }
    // count == 1, split cannot fail
    text.split_once(separator)
        .ok_or_else(|| ChallengeError::MalformedChallenge(format!("missing {separator:?}")))
}
