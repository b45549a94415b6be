use affix_hack::engine::codec::cache::{decode_entry, encode_entry, CacheKey, AFFIX_TABLE_SALT, VOCABULARY_SALT};
use affix_hack::engine::format::affix::CompiledAffixes;
use affix_hack::engine::types::models::SourceKind;
use affix_hack::{ContentAddressedCache, EngineError, LoadOptions, ParseIssue, Registry};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_path(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    for part in parts {
        p.push(part);
    }
    p
}

fn dicts_dir() -> PathBuf {
    fixture_path(&["tests", "fixtures", "dicts"])
}

fn entry_count(root: &Path) -> usize {
    fs::read_dir(root).expect("list cache dir").count()
}

fn words() -> Vec<String> {
    ["walk", "walked", "café"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn keys_depend_on_salt_and_content() {
    let a = CacheKey::derive(AFFIX_TABLE_SALT, &[b"SFX A Y 1"]);
    let b = CacheKey::derive(AFFIX_TABLE_SALT, &[b"SFX A Y 1"]);
    let c = CacheKey::derive(VOCABULARY_SALT, &[b"SFX A Y 1"]);
    let d = CacheKey::derive(AFFIX_TABLE_SALT, &[b"SFX A Y 2"]);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
    assert_eq!(a.as_str().len(), 64);
    assert!(a.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
}

#[test]
fn put_then_get() {
    let dir = TempDir::new().expect("tempdir");
    let cache = ContentAddressedCache::open(dir.path());
    assert!(cache.is_enabled());

    let key = CacheKey::derive(VOCABULARY_SALT, &[b"walk/A"]);
    assert_eq!(cache.get::<Vec<String>>(&key), None);

    cache.put(&key, &words()).expect("store entry");
    let path = cache.entry_path(&key).expect("enabled cache has paths");
    assert!(path.is_file());
    assert_eq!(cache.get::<Vec<String>>(&key), Some(words()));

    // Only the entry itself remains, no temporary files.
    assert_eq!(entry_count(dir.path()), 1);
}

#[test]
fn entry_layout_is_validated() {
    let bytes = encode_entry(&words()).expect("encode");
    assert_eq!(&bytes[0..4], b"AHC1");
    assert_eq!(decode_entry::<Vec<String>>(&bytes).expect("decode"), words());

    let mut flipped = bytes.clone();
    let last = flipped.len() - 1;
    flipped[last] ^= 0xFF;
    assert!(matches!(
        decode_entry::<Vec<String>>(&flipped),
        Err(EngineError::ChecksumMismatch { .. })
    ));

    let mut bad_magic = bytes.clone();
    bad_magic[0] = b'X';
    assert!(matches!(decode_entry::<Vec<String>>(&bad_magic), Err(EngineError::Cache(_))));

    assert!(decode_entry::<Vec<String>>(&bytes[..10]).is_err());
}

#[test]
fn corrupt_entries_are_misses() {
    let dir = TempDir::new().expect("tempdir");
    let cache = ContentAddressedCache::open(dir.path());
    let key = CacheKey::derive(VOCABULARY_SALT, &[b"corrupt"]);
    let path = cache.entry_path(&key).expect("enabled cache has paths");

    fs::write(&path, b"definitely not a cache entry").expect("write garbage");
    assert_eq!(cache.get::<Vec<String>>(&key), None);

    let mut computed = 0;
    let value: Vec<String> = cache.get_or_insert_with(&key, || {
        computed += 1;
        words()
    });
    assert_eq!(value, words());
    assert_eq!(computed, 1);

    // The recomputed value replaced the corrupt file.
    assert_eq!(cache.get::<Vec<String>>(&key), Some(words()));
}

#[test]
fn file_at_cache_root_disables_caching() {
    let dir = TempDir::new().expect("tempdir");
    let occupied = dir.path().join("cache");
    fs::write(&occupied, b"not a directory").expect("write file");

    let cache = ContentAddressedCache::open(&occupied);
    assert!(!cache.is_enabled());
    assert_eq!(cache.root(), None);

    let key = CacheKey::derive(VOCABULARY_SALT, &[b"x"]);
    cache.put(&key, &words()).expect("disabled put is a no-op");
    assert_eq!(cache.get::<Vec<String>>(&key), None);

    // Loading still works without a cache.
    let registry = Registry::from_directory(dicts_dir(), &cache, LoadOptions::default());
    assert_eq!(registry.len(), 2);
    assert_eq!(fs::read(&occupied).expect("file untouched"), b"not a directory");
}

#[test]
fn cache_is_created_on_first_use() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().join("nested").join("cache");
    let cache = ContentAddressedCache::open(&root);
    assert!(cache.is_enabled());
    assert!(root.is_dir());
}

#[test]
fn warm_loads_match_cold_loads() {
    let dir = TempDir::new().expect("tempdir");
    let cache = ContentAddressedCache::open(dir.path());

    let cold = Registry::from_directory(dicts_dir(), &cache, LoadOptions::default());
    // One affix table and one vocabulary per dictionary.
    assert_eq!(entry_count(dir.path()), 4);

    let warm = Registry::from_directory(dicts_dir(), &cache, LoadOptions::default());
    assert_eq!(entry_count(dir.path()), 4);

    let uncached = Registry::from_directory(dicts_dir(), &ContentAddressedCache::disabled(), LoadOptions::default());

    for reference in [&warm, &uncached] {
        assert_eq!(reference.languages(), cold.languages());
        for loaded in cold.iter() {
            let other = reference.get(loaded.id()).expect("same dictionaries");
            assert_eq!(other.vocabulary, loaded.vocabulary);
            assert_eq!(other.dictionary.table, loaded.dictionary.table);
            assert_eq!(other.dictionary.base_words, loaded.dictionary.base_words);
            assert_eq!(other.dictionary.issues, loaded.dictionary.issues);
            assert_eq!(other.dictionary.aff_hash, loaded.dictionary.aff_hash);
        }
    }
}

#[test]
fn warm_loads_read_the_cache() {
    let dir = TempDir::new().expect("tempdir");
    let cache = ContentAddressedCache::open(dir.path());
    Registry::from_directory(dicts_dir(), &cache, LoadOptions::default());

    // Rewrite every stored value; only a load that reads the entries can see the markers.
    let marker = ParseIssue { source: SourceKind::Aff, line: 99, message: "stored".to_string() };
    let (mut tables, mut vocabularies) = (0, 0);
    for dir_entry in fs::read_dir(dir.path()).expect("list cache dir") {
        let path = dir_entry.expect("cache entry").path();
        let bytes = fs::read(&path).expect("read entry");
        let rewritten = if decode_entry::<Vec<String>>(&bytes).is_ok() {
            vocabularies += 1;
            encode_entry(&vec!["stored".to_string()])
        } else {
            let mut compiled: CompiledAffixes = decode_entry(&bytes).expect("affix table entry");
            tables += 1;
            compiled.issues.push(marker.clone());
            encode_entry(&compiled)
        };
        fs::write(&path, rewritten.expect("encode")).expect("rewrite entry");
    }
    assert_eq!((tables, vocabularies), (2, 2));

    let warm = Registry::from_directory(dicts_dir(), &cache, LoadOptions::default());
    assert_eq!(entry_count(dir.path()), 4);
    for loaded in warm.iter() {
        assert_eq!(loaded.vocabulary, vec!["stored"], "vocabulary of {}", loaded.id());
        assert_eq!(loaded.dictionary.issues, vec![marker.clone()], "issues of {}", loaded.id());
    }
}

#[test]
fn generation_options_get_their_own_entries() {
    let dir = TempDir::new().expect("tempdir");
    let cache = ContentAddressedCache::open(dir.path());

    Registry::from_directory(dicts_dir(), &cache, LoadOptions::default());
    assert_eq!(entry_count(dir.path()), 4);

    let unique = LoadOptions { unique: true, ..LoadOptions::default() };
    Registry::from_directory(dicts_dir(), &cache, unique);
    // Affix tables are shared; vocabularies are keyed by the options.
    assert_eq!(entry_count(dir.path()), 6);
}

#[test]
fn changed_sources_miss_the_cache() {
    let source = TempDir::new().expect("tempdir");
    let cache_dir = TempDir::new().expect("tempdir");
    let cache = ContentAddressedCache::open(cache_dir.path());

    fs::write(source.path().join("xx.aff"), "SFX A Y 1\nSFX A 0 s .\n").expect("write aff");
    fs::write(source.path().join("xx.dic"), "1\ncat/A\n").expect("write dic");
    let first = Registry::from_directory(source.path(), &cache, LoadOptions::default());
    assert_eq!(first.get("xx").expect("xx").vocabulary, vec!["cat", "cats"]);

    fs::write(source.path().join("xx.dic"), "2\ncat/A\ndog/A\n").expect("rewrite dic");
    let second = Registry::from_directory(source.path(), &cache, LoadOptions::default());
    assert_eq!(second.get("xx").expect("xx").vocabulary, vec!["cat", "cats", "dog", "dogs"]);
    // Same affix table, new vocabulary.
    assert_eq!(entry_count(cache_dir.path()), 3);
}
