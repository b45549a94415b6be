use affix_hack::engine::codec::archive::{pair_dictionaries, DictionaryPair};
use affix_hack::{ContentAddressedCache, DirectorySource, EngineError, LoadOptions, Registry, ResourceSet, ZipArchive};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_path(parts: &[&str]) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    for part in parts {
        p.push(part);
    }
    p
}

fn fixture_bytes(name: &str) -> Vec<u8> {
    let path = fixture_path(&["tests", "fixtures", "dicts", name]);
    fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

struct Member<'a> {
    name: &'a str,
    data: &'a [u8],
    deflate: bool,
    flags: u16,
}

impl<'a> Member<'a> {
    fn stored(name: &'a str, data: &'a [u8]) -> Self {
        Self { name, data, deflate: false, flags: 0 }
    }

    fn deflated(name: &'a str, data: &'a [u8]) -> Self {
        Self { name, data, deflate: true, flags: 0 }
    }
}

/// Writes a minimal zip archive: local headers, central directory, EOCD.
fn build_zip(members: &[Member]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for member in members {
        let payload = if member.deflate {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(member.data).unwrap();
            encoder.finish().unwrap()
        } else {
            member.data.to_vec()
        };
        let method: u16 = if member.deflate { 8 } else { 0 };
        let crc = crc32fast::hash(member.data);
        let offset = out.len() as u32;
        let name = member.name.as_bytes();

        out.write_u32::<LittleEndian>(0x0403_4b50).unwrap();
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(member.flags).unwrap();
        out.write_u16::<LittleEndian>(method).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(crc).unwrap();
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(member.data.len() as u32).unwrap();
        out.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.extend_from_slice(name);
        out.extend_from_slice(&payload);

        central.write_u32::<LittleEndian>(0x0201_4b50).unwrap();
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(20).unwrap();
        central.write_u16::<LittleEndian>(member.flags).unwrap();
        central.write_u16::<LittleEndian>(method).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(crc).unwrap();
        central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        central.write_u32::<LittleEndian>(member.data.len() as u32).unwrap();
        central.write_u16::<LittleEndian>(name.len() as u16).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u16::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(0).unwrap();
        central.write_u32::<LittleEndian>(offset).unwrap();
        central.extend_from_slice(name);
    }

    let cd_offset = out.len() as u32;
    let cd_size = central.len() as u32;
    out.extend_from_slice(&central);
    out.write_u32::<LittleEndian>(0x0605_4b50).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(members.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(members.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(cd_size).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn reads_stored_and_deflated_members() {
    let text = b"walk/A\nlove/A\n".repeat(20);
    let zip = build_zip(&[
        Member::stored("plain.txt", b"hello"),
        Member::deflated("dicts/packed.dic", &text),
    ]);
    let archive = ZipArchive::from_bytes(zip).expect("valid archive");

    assert_eq!(archive.names(), names(&["plain.txt", "dicts/packed.dic"]));
    assert_eq!(archive.read("plain.txt").expect("stored"), b"hello");
    assert_eq!(archive.read("dicts/packed.dic").expect("deflated"), text);
    assert_eq!(archive.entries()[1].method, 8);
    assert!(archive.entries()[1].compressed_size < archive.entries()[1].uncompressed_size);
}

#[test]
fn missing_member_is_an_error() {
    let archive = ZipArchive::from_bytes(build_zip(&[Member::stored("a.aff", b"")])).expect("valid archive");
    assert!(matches!(archive.read("b.aff"), Err(EngineError::Archive(_))));
}

#[test]
fn corrupted_member_fails_its_checksum() {
    let mut zip = build_zip(&[Member::stored("a.dic", b"walk")]);
    // Local header (30 bytes) + name (5 bytes), then the stored data.
    zip[35] ^= 0x20;
    let archive = ZipArchive::from_bytes(zip).expect("directory still valid");
    assert!(matches!(archive.read("a.dic"), Err(EngineError::ChecksumMismatch { .. })));
}

#[test]
fn encrypted_members_are_rejected() {
    let zip = build_zip(&[Member { flags: 0x0001, ..Member::stored("secret.aff", b"SET UTF-8") }]);
    let archive = ZipArchive::from_bytes(zip).expect("directory still valid");
    assert!(matches!(archive.read("secret.aff"), Err(EngineError::Archive(_))));
}

#[test]
fn non_archives_are_rejected() {
    assert!(matches!(ZipArchive::from_bytes(b"short".to_vec()), Err(EngineError::Archive(_))));
    assert!(matches!(
        ZipArchive::from_bytes(vec![0u8; 4096]),
        Err(EngineError::Archive(_))
    ));
}

#[test]
fn pairs_by_stem() {
    let pairs = pair_dictionaries(&names(&[
        "b.dic",
        "a.aff",
        "README.txt",
        "x/y/de_DE.dic",
        "a.dic",
        "x/y/de_DE.aff",
        "c.aff",
    ]));
    assert_eq!(
        pairs,
        vec![
            DictionaryPair { id: "a".into(), aff: "a.aff".into(), dic: "a.dic".into() },
            DictionaryPair { id: "de_DE".into(), aff: "x/y/de_DE.aff".into(), dic: "x/y/de_DE.dic".into() },
        ]
    );
}

#[test]
fn registry_loads_from_archive() {
    let en_aff = fixture_bytes("en.aff");
    let en_dic = fixture_bytes("en.dic");
    let fr_aff = fixture_bytes("fr.aff");
    let zip = build_zip(&[
        Member::deflated("dicts/en.aff", &en_aff),
        Member::deflated("dicts/en.dic", &en_dic),
        // No matching .dic: skipped with a warning.
        Member::stored("dicts/fr.aff", &fr_aff),
    ]);

    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("dicts.zip");
    fs::write(&path, zip).expect("write archive");

    let registry = Registry::from_archive(&path, &ContentAddressedCache::disabled(), LoadOptions::default())
        .expect("archive loads");
    assert_eq!(registry.languages(), vec!["en"]);

    let from_dir = Registry::from_directory(
        fixture_path(&["tests", "fixtures", "dicts"]),
        &ContentAddressedCache::disabled(),
        LoadOptions::default(),
    );
    assert_eq!(
        registry.get("en").expect("en").vocabulary,
        from_dir.get("en").expect("en").vocabulary
    );
}

#[test]
fn missing_archive_is_an_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let result = Registry::from_archive(
        dir.path().join("nope.zip"),
        &ContentAddressedCache::disabled(),
        LoadOptions::default(),
    );
    assert!(matches!(result, Err(EngineError::Io(_))));
}

#[test]
fn directory_source_lists_files_only() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("b.dic"), "1\nb\n").expect("write");
    fs::write(dir.path().join("a.aff"), "").expect("write");
    fs::create_dir(dir.path().join("sub.aff")).expect("mkdir");

    let source = DirectorySource::new(dir.path());
    assert_eq!(source.names(), names(&["a.aff", "b.dic"]));
    assert_eq!(source.read("b.dic").expect("read"), b"1\nb\n");
    assert!(matches!(source.read("missing.dic"), Err(EngineError::Io(_))));
}
