//! Bigram Markov text generator.
//!
//! [`MarkovModel::train`] records, for every word in a corpus, the words
//! that followed it. [`MarkovModel::generate`] then walks that table from a
//! start word, picking a random successor each step, until the text is
//! long enough *and* ends a sentence, until it reaches a word nothing ever
//! followed, or until it hits [`MAX_WORDS`].
//!
//! The model is built once and only read afterwards, so it can be shared
//! between tasks behind an `Arc` without locking.

mod error;

use std::collections::HashMap;
use std::path::Path;

use rand::Rng;

pub use error::MarkovError;

/// Character that ends a sentence.
pub const TERMINATOR: char = '.';

/// Shortest target length, in appended words.
pub const MIN_LENGTH: usize = 20;

/// Longest target length, in appended words.
pub const MAX_LENGTH: usize = 40;

/// Hard cap on appended words. Only reached by a corpus whose chains
/// cycle without ever producing a terminator.
pub const MAX_WORDS: usize = 1_000;

/// Maps each word to every word that followed it, in corpus order.
///
/// Duplicates are kept: a pair seen three times is three times as likely
/// to be picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkovModel {
    chain: HashMap<String, Vec<String>>,
}

impl MarkovModel {
    /// Builds a model from whitespace-separated text.
    pub fn train(corpus: &str) -> Self {
        let words: Vec<&str> = corpus.split_whitespace().collect();
        let mut chain: HashMap<String, Vec<String>> = HashMap::new();

        for pair in words.windows(2) {
            chain
                .entry(pair[0].to_string())
                .or_default()
                .push(pair[1].to_string());
        }

        tracing::debug!(words = words.len(), keys = chain.len(), "markov model trained");
        Self { chain }
    }

    /// Reads the whole file at `path` and trains on it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MarkovError> {
        let path = path.as_ref();
        let corpus = std::fs::read_to_string(path).map_err(|source| MarkovError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::train(&corpus))
    }

    /// Words recorded after `word`, or an empty slice if none.
    pub fn successors(&self, word: &str) -> &[String] {
        self.chain.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if `word` has at least one successor.
    pub fn contains(&self, word: &str) -> bool {
        self.chain.contains_key(word)
    }

    /// Number of distinct words with successors.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Generates text using the thread-local RNG.
    ///
    /// See [`generate_with`](Self::generate_with).
    pub fn generate<S: AsRef<str>>(&self, seeds: &[S]) -> Option<String> {
        self.generate_with(seeds, &mut rand::rng())
    }

    /// Generates text starting from a random word.
    ///
    /// The start word is drawn from `seeds`, or from every word in the
    /// model when `seeds` is empty. A seed is used as-is even if the model
    /// has never seen it, in which case nothing is appended.
    ///
    /// Words are appended until one of three things happens:
    ///
    /// 1. at least the target length (drawn from
    ///    `MIN_LENGTH..=MAX_LENGTH`) is out and the last word contains
    ///    [`TERMINATOR`];
    /// 2. the last word has no recorded successor, so the text may be
    ///    shorter than the target;
    /// 3. [`MAX_WORDS`] words are out, which only happens on a chain that
    ///    cycles without a terminator.
    ///
    /// The result is the start word, a space, and the appended words
    /// joined by spaces. Returns `None` only when there is nothing to start
    /// from: no seeds and an empty model.
    pub fn generate_with<S, R>(&self, seeds: &[S], rng: &mut R) -> Option<String>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let target = rng.random_range(MIN_LENGTH..=MAX_LENGTH);

        let start = if seeds.is_empty() {
            if self.chain.is_empty() {
                return None;
            }
            let index = rng.random_range(0..self.chain.len());
            self.chain.keys().nth(index)?.as_str()
        } else {
            seeds[rng.random_range(0..seeds.len())].as_ref()
        };

        let words = self.walk(start, target, rng);
        Some(format!("{start} {}", words.join(" ")))
    }

    /// Appends successors to `start` until at least `target` words are out
    /// and the last word ends a sentence, a word has no successor, or the
    /// [`MAX_WORDS`] cap is reached.
    fn walk<'a, R>(&'a self, start: &'a str, target: usize, rng: &mut R) -> Vec<&'a str>
    where
        R: Rng + ?Sized,
    {
        let mut output = Vec::with_capacity(target);
        let mut word = start;

        while output.len() < target || !word.contains(TERMINATOR) {
            let choices = self.successors(word);
            if choices.is_empty() || output.len() >= MAX_WORDS {
                break;
            }
            let next = choices[rng.random_range(0..choices.len())].as_str();
            output.push(next);
            word = next;
        }

        output
    }
}
