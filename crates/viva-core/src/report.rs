use crate::model::BatchScore;

pub fn summary_line(score: &BatchScore) -> String {
    format!(
        "correct: {} out of {}, {}%",
        score.accepted,
        score.attempted,
        score.percent()
    )
}

pub fn print_summary(score: &BatchScore) {
    println!("{}", summary_line(score));
}
