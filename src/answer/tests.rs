use super::*;

#[test]
fn sentinel_answer_is_insufficient_context() {
    assert_eq!(
        AnswerOutcome::from_answer_text(
            "The retrieved context is insufficient to answer this question."
        ),
        AnswerOutcome::InsufficientContext
    );
    assert_eq!(
        AnswerOutcome::from_answer_text(
            "\"The retrieved context is insufficient to answer this question.\""
        ),
        AnswerOutcome::InsufficientContext
    );
}

#[test]
fn ordinary_answer_is_answered() {
    assert_eq!(
        AnswerOutcome::from_answer_text("The lease runs for five years."),
        AnswerOutcome::Answered
    );
    assert_eq!(
        AnswerOutcome::from_answer_text(INSUFFICIENT_SUMMARY),
        AnswerOutcome::Answered
    );
}

#[test]
fn outcomes_display_as_labels() {
    assert_eq!(AnswerOutcome::NoChunksRetrieved.to_string(), "no chunks retrieved");
    assert_eq!(AnswerOutcome::GenerationFailed.to_string(), "generation failed");
}
