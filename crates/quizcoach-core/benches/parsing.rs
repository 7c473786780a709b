use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizcoach_core::ingest::strip_html;
use quizcoach_core::schema::{parse_feedback_response, parse_quiz_response};
use quizcoach_core::traits::extract_json_from_markdown;

fn quiz_json(count: u32) -> String {
    let questions: Vec<_> = (1..=count)
        .map(|id| {
            serde_json::json!({
                "id": id,
                "text": format!("Which statement about remote work number {id} is true?"),
                "options": ["Fewer commutes", "More commutes", "No laptops", "No meetings"],
                "correct": 0,
            })
        })
        .collect();
    serde_json::json!({ "questions": questions }).to_string()
}

fn bench_extract_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_json");

    let clean = quiz_json(20);
    let fenced = format!("Here is your quiz:\n\n```json\n{clean}\n```\n\nGood luck!");
    let prose = format!("Sure thing. {clean} Let me know if you need more.");

    group.bench_function("clean", |b| {
        b.iter(|| extract_json_from_markdown(black_box(&clean)))
    });

    group.bench_function("fenced", |b| {
        b.iter(|| extract_json_from_markdown(black_box(&fenced)))
    });

    group.bench_function("prose", |b| {
        b.iter(|| extract_json_from_markdown(black_box(&prose)))
    });

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    let valid = quiz_json(20);
    let short = quiz_json(12);
    let feedback = r#"{"feedback": "Not bad at all. But I saw you hesitate.", "flashcards": [
        {"front": "Right to disconnect", "back": "Employees may ignore work messages off hours."},
        {"front": "Asynchronous communication", "back": "Messages answered when convenient."}
    ]}"#;

    group.bench_function("quiz_valid", |b| {
        b.iter(|| parse_quiz_response(black_box(&valid)))
    });

    group.bench_function("quiz_wrong_count", |b| {
        b.iter(|| parse_quiz_response(black_box(&short)))
    });

    group.bench_function("feedback", |b| {
        b.iter(|| parse_feedback_response(black_box(feedback)))
    });

    group.finish();
}

fn bench_strip_html(c: &mut Criterion) {
    let mut group = c.benchmark_group("strip_html");

    let page = {
        let mut s = String::from("<html><head><title>Course</title><style>p{}</style></head><body>");
        for i in 0..500 {
            s.push_str(&format!(
                "<h2>Chapter {i}</h2><p>Remote work &amp; its <b>challenges</b>.</p><script>track({i});</script>"
            ));
        }
        s.push_str("</body></html>");
        s
    };

    group.bench_function("500_sections", |b| b.iter(|| strip_html(black_box(&page))));

    group.finish();
}

criterion_group!(benches, bench_extract_json, bench_validation, bench_strip_html);
criterion_main!(benches);
