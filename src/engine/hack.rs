//! Brute-force cryptanalysis of Caesar-family ciphertexts.
//!
//! [`HackDriver::hack`] enumerates the parameter space, decrypts the
//! ciphertext with each combination, scores samples of the result, and
//! yields [`HackCandidate`]s lazily in enumeration order.
//!
//! # Parameter Space
//! ```text
//! BASIC        key ∈ [1, 25]                               25 candidates
//! PROGRESSIVE  key ∈ [1, 25] × {GEOMETRIC, SHIFT}          50 candidates
//! SQUARE       key ∈ [-maxKey, maxKey], maxKey = ⌈len/2⌉   2·maxKey + 1 candidates
//! ```
//!
//! # Scoring
//! Up to `sample_count` equally spaced slices of `sample_len` characters are
//! taken from the candidate plaintext. The first slice picks the best
//! language with [`PlaintextScorer::find_best_dic`]; the others are scored
//! against that language with [`PlaintextScorer::get_match_level`]. The
//! candidate's score is the mean over all slices.
//!
//! A combination whose decryption or scoring fails is skipped.

use std::iter;
use std::ops::RangeInclusive;

use log::{debug, trace, warn};

use super::cipher::CipherTransform;
use super::scorer::PlaintextScorer;
use super::types::error::Result;
use super::types::models::{Algorithm, HackCandidate, Method};

/// Shift keys tried for BASIC and PROGRESSIVE.
pub const SHIFT_KEYS: RangeInclusive<i64> = 1..=25;

const PROGRESSIVE_METHODS: [Method; 2] = [Method::Geometric, Method::Shift];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HackOptions {
    /// Maximum number of slices scored per candidate.
    pub sample_count: usize,
    /// Length of each slice, in characters.
    pub sample_len: usize,
}

impl Default for HackOptions {
    fn default() -> Self {
        Self { sample_count: 3, sample_len: 50 }
    }
}

/// One point of the parameter space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parameters {
    pub algorithm: Algorithm,
    pub method: Option<Method>,
    pub key: i64,
}

/// Largest SQUARE key magnitude for a ciphertext of `len` characters.
pub fn max_square_key(len: usize) -> i64 {
    ((len + 1) / 2) as i64
}

/// Lazily enumerates the parameter space, optionally restricted to one algorithm.
pub fn parameter_space(len: usize, only: Option<Algorithm>) -> ParameterSpace {
    let wanted = move |algorithm: Algorithm| only.map_or(true, |a| a == algorithm);

    let basic = wanted(Algorithm::Basic)
        .then(|| SHIFT_KEYS.map(|key| Parameters { algorithm: Algorithm::Basic, method: None, key }))
        .into_iter()
        .flatten();

    let progressive = wanted(Algorithm::Progressive)
        .then(|| {
            SHIFT_KEYS.flat_map(|key| {
                PROGRESSIVE_METHODS.into_iter().map(move |method| Parameters {
                    algorithm: Algorithm::Progressive,
                    method: Some(method),
                    key,
                })
            })
        })
        .into_iter()
        .flatten();

    let max_key = max_square_key(len);
    let square = wanted(Algorithm::Square)
        .then(|| (-max_key..=max_key).map(|key| Parameters { algorithm: Algorithm::Square, method: None, key }))
        .into_iter()
        .flatten();

    ParameterSpace { inner: Box::new(basic.chain(progressive).chain(square)) }
}

/// Iterator over [`Parameters`], see [`parameter_space`].
pub struct ParameterSpace {
    inner: Box<dyn Iterator<Item = Parameters>>,
}

impl Iterator for ParameterSpace {
    type Item = Parameters;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Takes up to `count` equally spaced slices of `len` characters.
///
/// Text no longer than `len` yields a single slice with the whole text; the
/// number of slices never exceeds what is needed to cover the text.
pub fn sample_slices(text: &str, count: usize, len: usize) -> Vec<&str> {
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(iter::once(text.len())).collect();
    let total = bounds.len() - 1;
    let len = len.max(1);

    if total <= len {
        return vec![text];
    }

    let count = count.max(1).min((total + len - 1) / len);
    if count == 1 {
        return vec![&text[..bounds[len]]];
    }

    (0..count)
        .map(|i| {
            let start = i * (total - len) / (count - 1);
            &text[bounds[start]..bounds[start + len]]
        })
        .collect()
}

/// Sorts candidates by descending score; equal scores keep enumeration order.
pub fn rank<I: IntoIterator<Item = HackCandidate>>(candidates: I) -> Vec<HackCandidate> {
    let mut ranked: Vec<HackCandidate> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| b.average_score.total_cmp(&a.average_score));
    ranked
}

/// Combines a cipher transform and a scorer into a brute-force search.
pub struct HackDriver<'a, C: ?Sized, S: ?Sized> {
    cipher: &'a C,
    scorer: &'a S,
    options: HackOptions,
}

impl<'a, C: ?Sized, S: ?Sized> Clone for HackDriver<'a, C, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, C: ?Sized, S: ?Sized> Copy for HackDriver<'a, C, S> {}

impl<'a, C, S> HackDriver<'a, C, S>
where
    C: CipherTransform + ?Sized,
    S: PlaintextScorer + ?Sized,
{
    pub fn new(cipher: &'a C, scorer: &'a S) -> Self {
        Self { cipher, scorer, options: HackOptions::default() }
    }

    pub fn with_options(mut self, options: HackOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> HackOptions {
        self.options
    }

    /// Lazily yields one candidate per working parameter combination.
    pub fn hack<'t>(&self, ciphertext: &'t str, only: Option<Algorithm>) -> Hack<'a, 't, C, S> {
        let len = ciphertext.chars().count();
        debug!("Hacking {} characters (algorithm filter: {:?})", len, only);
        Hack {
            driver: *self,
            ciphertext,
            params: parameter_space(len, only),
            skipped: 0,
        }
    }

    /// Decrypts and scores a single parameter combination.
    pub fn evaluate(&self, ciphertext: &str, params: Parameters) -> Result<HackCandidate> {
        let plaintext = self.cipher.decrypt(ciphertext, params.algorithm, params.method, params.key)?;
        let slices = sample_slices(&plaintext, self.options.sample_count, self.options.sample_len);

        let scores = self.scorer.find_best_dic(slices[0])?;
        let best = scores.into_iter().fold(None, |best: Option<(String, f64)>, (language, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((language, score)),
        });

        let (language, average_score) = match best {
            Some((language, first_score)) => {
                let mut total = first_score;
                for slice in &slices[1..] {
                    total += self.scorer.get_match_level(&language, slice)?;
                }
                let average = total / slices.len() as f64;
                (Some(language), average)
            }
            None => (None, 0.0),
        };

        trace!(
            "{} {:?} key={} -> {:?} {:.3}",
            params.algorithm,
            params.method,
            params.key,
            language,
            average_score
        );
        Ok(HackCandidate {
            algorithm: params.algorithm,
            method: params.method,
            key: params.key,
            decrypted_text: plaintext,
            language,
            average_score,
        })
    }
}

/// Lazy candidate sequence returned by [`HackDriver::hack`].
pub struct Hack<'a, 't, C: ?Sized, S: ?Sized> {
    driver: HackDriver<'a, C, S>,
    ciphertext: &'t str,
    params: ParameterSpace,
    skipped: usize,
}

impl<'a, 't, C: ?Sized, S: ?Sized> Hack<'a, 't, C, S> {
    /// Combinations skipped so far because they failed.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<'a, 't, C, S> Iterator for Hack<'a, 't, C, S>
where
    C: CipherTransform + ?Sized,
    S: PlaintextScorer + ?Sized,
{
    type Item = HackCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let params = self.params.next()?;
            match self.driver.evaluate(self.ciphertext, params) {
                Ok(candidate) => return Some(candidate),
                Err(e) => {
                    warn!(
                        "Skipping {} {:?} key={}: {}",
                        params.algorithm, params.method, params.key, e
                    );
                    self.skipped += 1;
                }
            }
        }
    }
}
