use chainchat::{tokenize, ChainPair, ResponseGenerator, ResponseScorer, NounVocabulary, TokenSet};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

const LINES: &[&str] = &[
    "the dog runs home before the rain starts",
    "my cat sleeps on the warm mat all day",
    "where did the dog hide the old bone?",
    "the rain falls on the roof of the home",
    "a cat and a dog walk into the garden",
];

fn corpus(repeats: usize) -> Vec<Vec<String>> {
    (0..repeats)
        .flat_map(|i| LINES.iter().map(move |line| tokenize(&format!("{} {}", line, i % 17))))
        .collect()
}

fn benchmark_learn(c: &mut Criterion) {
    let mut group = c.benchmark_group("learn");
    for repeats in [10, 100, 1000].iter() {
        let lines = corpus(*repeats);
        group.throughput(Throughput::Elements(lines.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(repeats), &lines, |b, lines| {
            b.iter(|| {
                let mut pair = ChainPair::new();
                for tokens in lines {
                    pair.learn(tokens);
                }
                pair
            });
        });
    }
    group.finish();
}

fn benchmark_generate(c: &mut Criterion) {
    let mut pair = ChainPair::new();
    for tokens in corpus(200) {
        pair.learn(&tokens);
    }
    let nouns: NounVocabulary = ["dog", "cat", "rain", "home"].iter().map(|n| n.to_string()).collect();
    let priority: TokenSet = ["dog".to_string()].into_iter().collect();
    let scorer = ResponseScorer::default();
    let mut rng = StdRng::seed_from_u64(99);

    c.bench_function("generate and pick", |b| {
        b.iter(|| {
            let generator = ResponseGenerator::new(&pair);
            let candidates = generator.generate_candidates(&priority, 14, &mut rng);
            scorer.pick_best(&candidates, &priority, &nouns).map(|best| best.len()).ok()
        });
    });
}

fn benchmark_round_trip(c: &mut Criterion) {
    let mut pair = ChainPair::new();
    for tokens in corpus(500) {
        pair.learn(&tokens);
    }

    c.bench_function("model save + load", |b| {
        b.iter(|| {
            let bytes = pair.forward.to_bytes().unwrap();
            chainchat::ChainModel::from_bytes(&bytes).unwrap()
        });
    });
}

criterion_group!(benches, benchmark_learn, benchmark_generate, benchmark_round_trip);
criterion_main!(benches);
