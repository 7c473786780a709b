use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizcoach_core::model::{QuizData, QuizQuestion, UserAnswers};
use quizcoach_core::scoring::score_quiz;

fn make_quiz() -> QuizData {
    let questions = (1..=20u32)
        .map(|id| QuizQuestion {
            id,
            text: format!("Question {id}?"),
            options: ["A", "B", "C", "D"].map(String::from),
            correct: (id % 4) as usize,
        })
        .collect();
    QuizData::new(questions).expect("bench quiz is valid")
}

fn make_answers(quiz: &QuizData, correct: usize) -> UserAnswers {
    let mut answers = UserAnswers::new();
    for (i, q) in quiz.questions().iter().enumerate() {
        let pick = if i < correct { q.correct } else { (q.correct + 1) % 4 };
        answers.record(q.id, pick).expect("fresh answer");
    }
    answers
}

fn bench_score_quiz(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_quiz");
    let quiz = make_quiz();

    group.bench_function("perfect", |b| {
        let answers = make_answers(&quiz, 20);
        b.iter(|| score_quiz(black_box(&quiz), black_box(&answers)))
    });

    group.bench_function("twelve_of_twenty", |b| {
        let answers = make_answers(&quiz, 12);
        b.iter(|| score_quiz(black_box(&quiz), black_box(&answers)))
    });

    group.bench_function("all_timed_out", |b| {
        let answers = UserAnswers::new();
        b.iter(|| score_quiz(black_box(&quiz), black_box(&answers)))
    });

    group.finish();
}

criterion_group!(benches, bench_score_quiz);
criterion_main!(benches);
