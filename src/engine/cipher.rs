//! Caesar-family cipher transforms.
//!
//! The hack driver only needs `decrypt`; [`Caesar::encrypt`] is its exact
//! inverse and exists so callers (and tests) can produce ciphertexts.
//!
//! # Algorithms
//! - `Basic`: every letter shifted by `key`
//! - `Progressive` / `Shift`: the n-th letter shifted by `key + n`
//! - `Progressive` / `Geometric`: the n-th letter shifted by `key^(n+1) mod 26`
//! - `Square`: columnar transposition with `|key|` columns (`0` = squarish
//!   grid, negative keys swap the read and write directions)
//!
//! Letter shifts keep case and leave every other character untouched; `n`
//! counts letters only.

use log::trace;

use super::types::error::{EngineError, Result};
use super::types::models::{Algorithm, Method};

const ALPHABET_LEN: i64 = 26;

/// A deterministic Caesar-family decryption function.
pub trait CipherTransform {
    fn decrypt(&self, ciphertext: &str, algorithm: Algorithm, method: Option<Method>, key: i64) -> Result<String>;
}

/// The bundled Caesar-family implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Caesar;

impl Caesar {
    pub fn encrypt(&self, plaintext: &str, algorithm: Algorithm, method: Option<Method>, key: i64) -> Result<String> {
        transform(plaintext, algorithm, method, key, Direction::Encrypt)
    }
}

impl CipherTransform for Caesar {
    fn decrypt(&self, ciphertext: &str, algorithm: Algorithm, method: Option<Method>, key: i64) -> Result<String> {
        transform(ciphertext, algorithm, method, key, Direction::Decrypt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn transform(text: &str, algorithm: Algorithm, method: Option<Method>, key: i64, direction: Direction) -> Result<String> {
    trace!("{:?} {} method={:?} key={}", direction, algorithm, method, key);
    let sign = match direction {
        Direction::Encrypt => 1,
        Direction::Decrypt => -1,
    };
    match algorithm {
        Algorithm::Basic => Ok(shift_letters(text, |_| sign * key)),
        Algorithm::Progressive => match method {
            Some(Method::Shift) => Ok(shift_letters(text, |n| sign * (key + n as i64))),
            Some(Method::Geometric) => {
                let base = key.rem_euclid(ALPHABET_LEN);
                let mut power = 1;
                Ok(shift_letters(text, |_| {
                    power = (power * base) % ALPHABET_LEN;
                    sign * power
                }))
            }
            None => Err(EngineError::Transform("PROGRESSIVE requires a method".to_string())),
        },
        Algorithm::Square => {
            let chars: Vec<char> = text.chars().collect();
            let columns = square_columns(chars.len(), key);
            // Negative keys run the transposition the other way round.
            let read_columns = (direction == Direction::Encrypt) == (key >= 0);
            let out = if read_columns {
                columns_out(&chars, columns)
            } else {
                columns_in(&chars, columns)
            };
            Ok(out.into_iter().collect())
        }
    }
}

/// Shifts each ASCII letter by `shift(n)`, `n` being the letter's index
/// among letters.
fn shift_letters(text: &str, mut shift: impl FnMut(usize) -> i64) -> String {
    let mut n = 0usize;
    text.chars()
        .map(|c| {
            let base = if c.is_ascii_lowercase() {
                b'a'
            } else if c.is_ascii_uppercase() {
                b'A'
            } else {
                return c;
            };
            let offset = (c as u8 - base) as i64;
            let shifted = (offset + shift(n)).rem_euclid(ALPHABET_LEN);
            n += 1;
            (base + shifted as u8) as char
        })
        .collect()
}

/// Column count for a square transposition of `len` characters.
fn square_columns(len: usize, key: i64) -> usize {
    if key == 0 {
        let mut side = (len as f64).sqrt().ceil() as usize;
        while side * side < len {
            side += 1;
        }
        side.max(1)
    } else {
        (key.unsigned_abs() as usize).max(1)
    }
}

/// Writes row by row into `columns` columns and reads column by column.
fn columns_out(chars: &[char], columns: usize) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    for col in 0..columns {
        out.extend(chars.iter().skip(col).step_by(columns));
    }
    out
}

/// Inverse of [`columns_out`].
fn columns_in(chars: &[char], columns: usize) -> Vec<char> {
    let len = chars.len();
    let mut out = vec!['\0'; len];
    let mut source = chars.iter();
    for col in 0..columns {
        for idx in (col..len).step_by(columns) {
            if let Some(&c) = source.next() {
                out[idx] = c;
            }
        }
    }
    out
}
