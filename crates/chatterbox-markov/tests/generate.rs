//! Property-style tests for text generation.
//!
//! Each test runs many seeded generations and checks an invariant on
//! every one, so a failure names the seed that broke it.

use chatterbox_markov::{MAX_LENGTH, MAX_WORDS, MIN_LENGTH, MarkovModel, TERMINATOR};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SMALL: &str = "the cat sat. the dog ran.";

const LONGER: &str = "\
    a quick fox jumps over the lazy dog. the dog sleeps in the sun and the \
    fox runs into the woods. a bird sings over the woods while the sun sets. \
    the lazy dog dreams of the fox and the bird. night falls over the woods.";

fn appended(text: &str) -> Vec<&str> {
    // The start word is followed by a single space, then the output.
    let (_, rest) = text.split_once(' ').expect("start word is followed by a space");
    rest.split_whitespace().collect()
}

#[test]
fn test_generate_dog_seed_stops_at_dead_end() {
    let model = MarkovModel::train(SMALL);

    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = model.generate_with(&["dog"], &mut rng).unwrap();
        assert_eq!(text, "dog ran.", "seed {seed}");
    }
}

#[test]
fn test_generate_starts_with_a_seed_word() {
    let model = MarkovModel::train(LONGER);
    let seeds = ["fox", "unheard", "sun"];

    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = model.generate_with(&seeds, &mut rng).unwrap();
        let start = text.split(' ').next().unwrap();
        assert!(seeds.contains(&start), "seed {seed}: start {start:?}");
    }
}

#[test]
fn test_generate_without_seeds_starts_with_a_model_word() {
    let model = MarkovModel::train(LONGER);
    let none: [&str; 0] = [];

    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = model.generate_with(&none, &mut rng).unwrap();
        let start = text.split(' ').next().unwrap();
        assert!(model.contains(start), "seed {seed}: start {start:?}");
    }
}

#[test]
fn test_generate_length_or_dead_end() {
    let model = MarkovModel::train(LONGER);
    let none: [&str; 0] = [];

    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = model.generate_with(&none, &mut rng).unwrap();
        let words = appended(&text);

        match words.last() {
            Some(last) if words.len() >= MIN_LENGTH && last.contains(TERMINATOR) => {}
            Some(last) => assert!(
                model.successors(last).is_empty(),
                "seed {seed}: stopped early at {last:?} which has successors"
            ),
            None => {}
        }
    }
}

#[test]
fn test_generate_reaches_target_on_cyclic_corpus() {
    // Every word has a successor, so generation can only stop on length
    // plus terminator.
    let model = MarkovModel::train("one two three. one two three. one");
    let none: [&str; 0] = [];

    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = model.generate_with(&none, &mut rng).unwrap();
        let words = appended(&text);

        assert!(words.len() >= MIN_LENGTH, "seed {seed}: {} words", words.len());
        assert!(words.len() <= MAX_LENGTH + 2, "seed {seed}: {} words", words.len());
        assert!(words.last().unwrap().ends_with(TERMINATOR), "seed {seed}");
    }
}

#[test]
fn test_generate_terminator_free_cycle_stops_at_word_cap() {
    let model = MarkovModel::train("round and round and round");

    for seed in 0..5 {
        let mut rng = StdRng::seed_from_u64(seed);
        let text = model.generate_with(&["round"], &mut rng).unwrap();
        let words = appended(&text);

        assert_eq!(words.len(), MAX_WORDS, "seed {seed}");
        assert!(words.iter().all(|w| !w.contains(TERMINATOR)), "seed {seed}");
    }
}

#[test]
fn test_from_file_missing_path_is_io_error() {
    let result = MarkovModel::from_file("/definitely/not/a/corpus.txt");
    assert!(matches!(
        result,
        Err(chatterbox_markov::MarkovError::Io { .. })
    ));
}

#[test]
fn test_from_file_trains_on_contents() {
    let path = std::env::temp_dir().join(format!(
        "chatterbox-markov-corpus-{}.txt",
        std::process::id()
    ));
    std::fs::write(&path, SMALL).unwrap();

    let model = MarkovModel::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(model, MarkovModel::train(SMALL));
}
