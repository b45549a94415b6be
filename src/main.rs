use affix_hack::{rank, Algorithm, Caesar, ContentAddressedCache, HackDriver, LoadOptions, MatchDic, Registry};
use std::env;
use std::path::Path;
use std::process;

const DEFAULT_CACHE_DIR: &str = ".affix-hack-cache";
const DEFAULT_TOP: usize = 10;

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} <archive.zip|dir> <ciphertext> [--algorithm basic|progressive|square] [--cache <dir>] [--top <n>] [--unique]",
        program
    );
    process::exit(1);
}

/// Value following `flag`, if the flag is present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let idx = args.iter().position(|arg| arg == flag)?;
    match args.get(idx + 1) {
        Some(value) => Some(value.as_str()),
        None => {
            eprintln!("ERROR: {} flag requires an argument.", flag);
            process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        usage(&args[0]);
    }

    let source = &args[1];
    let ciphertext = &args[2];
    let options = &args[3..];

    let only = flag_value(options, "--algorithm").map(|label| match label.parse::<Algorithm>() {
        Ok(algorithm) => algorithm,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    });
    let top = match flag_value(options, "--top").map(str::parse::<usize>) {
        None => DEFAULT_TOP,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            eprintln!("ERROR: --top expects a positive number.");
            process::exit(1);
        }
    };
    let cache_dir = flag_value(options, "--cache").unwrap_or(DEFAULT_CACHE_DIR);
    let load_options = LoadOptions {
        unique: options.iter().any(|arg| arg == "--unique"),
        ..LoadOptions::default()
    };

    println!("Loading dictionaries: {}", source);
    println!("Cache: {}", cache_dir);
    println!("{}", "=".repeat(60));

    let cache = ContentAddressedCache::open(cache_dir);
    let registry = if Path::new(source).is_dir() {
        Registry::from_directory(source, &cache, load_options)
    } else {
        match Registry::from_archive(source, &cache, load_options) {
            Ok(registry) => registry,
            Err(e) => {
                eprintln!("\nERROR: Failed to open dictionary archive");
                eprintln!("  {}", e);
                process::exit(1);
            }
        }
    };

    if registry.is_empty() {
        eprintln!("ERROR: No dictionaries found in {}", source);
        process::exit(1);
    }

    println!("\nDictionaries:");
    for loaded in registry.iter() {
        println!(
            "  {}: {} base words, {} words, {} issues",
            loaded.id(),
            loaded.dictionary.base_words.len(),
            loaded.vocabulary.len(),
            loaded.dictionary.issues.len()
        );
    }

    let scorer = MatchDic::latin().with_registry(&registry);
    let cipher = Caesar;
    let driver = HackDriver::new(&cipher, &scorer);
    let candidates = rank(driver.hack(ciphertext, only));

    println!("\n{}", "=".repeat(60));
    println!("Top {} of {} candidates:", top.min(candidates.len()), candidates.len());
    for (i, candidate) in candidates.iter().take(top).enumerate() {
        println!("  {:>2}. {}", i + 1, candidate);
    }
}
