use affix_hack::{Algorithm, Caesar, CipherTransform, EngineError, Method};

const TEXTS: &[&str] = &[
    "THIS IS A TEST",
    "The quick brown fox jumps over the lazy dog.",
    "Café, naïve; 42 numbers & punctuation!",
    "x",
    "",
];

fn round_trip(algorithm: Algorithm, method: Option<Method>, keys: impl Iterator<Item = i64>) {
    let cipher = Caesar;
    for key in keys {
        for text in TEXTS {
            let encrypted = cipher.encrypt(text, algorithm, method, key).expect("encrypt");
            let decrypted = cipher.decrypt(&encrypted, algorithm, method, key).expect("decrypt");
            assert_eq!(&decrypted, text, "{} {:?} key={}", algorithm, method, key);
        }
    }
}

#[test]
fn basic_shifts_letters() {
    let cipher = Caesar;
    assert_eq!(
        cipher.encrypt("THIS IS A TEST", Algorithm::Basic, None, 3).expect("encrypt"),
        "WKLV LV D WHVW"
    );
    assert_eq!(
        cipher.decrypt("WKLV LV D WHVW", Algorithm::Basic, None, 3).expect("decrypt"),
        "THIS IS A TEST"
    );
    assert_eq!(cipher.encrypt("xyz, XYZ!", Algorithm::Basic, None, 3).expect("encrypt"), "abc, ABC!");
    assert_eq!(cipher.encrypt("abc", Algorithm::Basic, None, 26).expect("encrypt"), "abc");
}

#[test]
fn progressive_shift_counts_letters_only() {
    let cipher = Caesar;
    assert_eq!(
        cipher.encrypt("aaa", Algorithm::Progressive, Some(Method::Shift), 1).expect("encrypt"),
        "bcd"
    );
    assert_eq!(
        cipher.encrypt("a a-a", Algorithm::Progressive, Some(Method::Shift), 1).expect("encrypt"),
        "b c-d"
    );
}

#[test]
fn progressive_geometric_uses_key_powers() {
    let cipher = Caesar;
    // 2, 4, 8 mod 26
    assert_eq!(
        cipher.encrypt("aaa", Algorithm::Progressive, Some(Method::Geometric), 2).expect("encrypt"),
        "cei"
    );
}

#[test]
fn progressive_requires_a_method() {
    let result = Caesar.decrypt("abc", Algorithm::Progressive, None, 3);
    assert!(matches!(result, Err(EngineError::Transform(_))));
}

#[test]
fn square_transposes_columns() {
    let cipher = Caesar;
    assert_eq!(cipher.encrypt("abcdef", Algorithm::Square, None, 2).expect("encrypt"), "acebdf");
    assert_eq!(cipher.decrypt("acebdf", Algorithm::Square, None, 2).expect("decrypt"), "abcdef");
    // Negative keys swap the directions.
    assert_eq!(cipher.encrypt("abcdef", Algorithm::Square, None, -2).expect("encrypt"), "adbecf");
    assert_eq!(cipher.decrypt("abcdef", Algorithm::Square, None, -2).expect("decrypt"), "acebdf");
    // One column is the identity.
    assert_eq!(cipher.encrypt("abcdef", Algorithm::Square, None, 1).expect("encrypt"), "abcdef");
}

#[test]
fn basic_round_trips() {
    round_trip(Algorithm::Basic, None, 1..=25);
}

#[test]
fn progressive_round_trips() {
    round_trip(Algorithm::Progressive, Some(Method::Shift), 1..=25);
    round_trip(Algorithm::Progressive, Some(Method::Geometric), 1..=25);
}

#[test]
fn square_round_trips() {
    round_trip(Algorithm::Square, None, -30..=30);
}

#[test]
fn algorithm_labels() {
    assert_eq!("basic".parse::<Algorithm>().expect("basic"), Algorithm::Basic);
    assert_eq!("PROGRESSIVE".parse::<Algorithm>().expect("progressive"), Algorithm::Progressive);
    assert_eq!("Square".parse::<Algorithm>().expect("square"), Algorithm::Square);
    assert!("vigenere".parse::<Algorithm>().is_err());
    assert_eq!(Algorithm::Square.to_string(), "SQUARE");
    assert_eq!(Method::Geometric.to_string(), "GEOMETRIC");
}
