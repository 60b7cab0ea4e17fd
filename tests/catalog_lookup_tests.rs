//! End-to-end lookup tests over file-backed catalogs.

mod common;

use std::fs;

use mocat::{ByteOrder, CacheMode, Catalog, FileSource, MemorySource, TextDomains};

use common::{metadata_pair, mo_bytes};

fn german_pairs() -> Vec<(Vec<u8>, Vec<u8>)> {
    vec![
        metadata_pair("nplurals=2; plural=n == 1 ? 0 : 1;"),
        (b"Hello".to_vec(), b"Hallo".to_vec()),
        (b"Goodbye".to_vec(), b"Auf Wiedersehen".to_vec()),
        (
            b"One file\0{} files".to_vec(),
            b"Eine Datei\0{} Dateien".to_vec(),
        ),
        (b"menu\x04Open".to_vec(), b"\xc3\x96ffnen".to_vec()),
        (
            b"mail\x04One message\0{} messages".to_vec(),
            b"Eine Nachricht\0{} Nachrichten".to_vec(),
        ),
    ]
}

fn write_mo(path: &std::path::Path, pairs: &[(Vec<u8>, Vec<u8>)], big_endian: bool) {
    fs::write(path, mo_bytes(pairs, big_endian)).unwrap();
}

#[test]
fn file_backed_lookup_covers_all_operations() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("de.mo");
    write_mo(&path, &german_pairs(), false);

    for cache_mode in [CacheMode::InMemory, CacheMode::Direct] {
        let source = FileSource::open(&path).unwrap();
        let mut catalog = Catalog::open(source, cache_mode).unwrap();

        assert_eq!(catalog.translate("Hello"), "Hallo");
        assert_eq!(catalog.translate("Goodbye"), "Auf Wiedersehen");
        assert_eq!(catalog.translate("Unknown"), "Unknown");

        assert_eq!(
            catalog.plural_translate("One file", "{} files", 1),
            "Eine Datei"
        );
        assert_eq!(
            catalog.plural_translate("One file", "{} files", 4),
            "{} Dateien"
        );
        assert_eq!(catalog.plural_translate("One dog", "{} dogs", 1), "One dog");
        assert_eq!(
            catalog.plural_translate("One dog", "{} dogs", 2),
            "{} dogs"
        );

        assert_eq!(catalog.context_translate("menu", "Open"), "Öffnen");
        assert_eq!(catalog.context_translate("nope", "Open"), "Open");

        assert_eq!(
            catalog.context_plural_translate("mail", "One message", "{} messages", 1),
            "Eine Nachricht"
        );
        assert_eq!(
            catalog.context_plural_translate("mail", "One message", "{} messages", 5),
            "{} Nachrichten"
        );
        assert_eq!(
            catalog.context_plural_translate("chat", "One message", "{} messages", 1),
            "One message"
        );
    }
}

#[test]
fn big_endian_catalog_reads_identically() {
    let little = mo_bytes(&german_pairs(), false);
    let big = mo_bytes(&german_pairs(), true);

    let mut catalog_le = Catalog::open(MemorySource::from(little), CacheMode::Direct).unwrap();
    let mut catalog_be = Catalog::open(MemorySource::from(big), CacheMode::Direct).unwrap();

    assert_eq!(catalog_le.header().byte_order, ByteOrder::Little);
    assert_eq!(catalog_be.header().byte_order, ByteOrder::Big);

    for key in ["Hello", "Goodbye", "Unknown"] {
        assert_eq!(catalog_le.translate(key), catalog_be.translate(key));
    }
}

#[test]
fn russian_catalog_selects_three_forms() {
    let pairs = vec![
        metadata_pair(
            "nplurals=3; plural=n%10==1 && n%100!=11 ? 0 : \
             n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2;",
        ),
        (
            b"{} file\0{} files".to_vec(),
            "{} файл\0{} файла\0{} файлов".as_bytes().to_vec(),
        ),
    ];
    let mut catalog =
        Catalog::open(MemorySource::from(mo_bytes(&pairs, false)), CacheMode::InMemory).unwrap();

    assert_eq!(catalog.plural_translate("{} file", "{} files", 1), "{} файл");
    assert_eq!(catalog.plural_translate("{} file", "{} files", 2), "{} файла");
    assert_eq!(
        catalog.plural_translate("{} file", "{} files", 5),
        "{} файлов"
    );
    assert_eq!(
        catalog.plural_translate("{} file", "{} files", 11),
        "{} файлов"
    );
    assert_eq!(
        catalog.plural_translate("{} file", "{} files", 21),
        "{} файл"
    );
}

#[test]
fn garbage_file_short_circuits() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bogus.mo");
    fs::write(&path, b"definitely not a message catalog").unwrap();

    let source = FileSource::open(&path).unwrap();
    let mut catalog = Catalog::open(source, CacheMode::InMemory).unwrap();
    assert!(catalog.is_short_circuit());
    assert_eq!(catalog.translate("Hello"), "Hello");
    assert_eq!(catalog.plural_translate("one", "many", 1), "one");
    assert_eq!(catalog.plural_translate("one", "many", 6), "many");
}

#[test]
fn registry_resolves_through_locale_fallback() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sr@latin").join("LC_MESSAGES");
    fs::create_dir_all(&dir).unwrap();
    write_mo(
        &dir.join("app.mo"),
        &vec![
            metadata_pair("nplurals=2; plural=n == 1 ? 0 : 1;"),
            (b"Hello".to_vec(), b"Zdravo".to_vec()),
        ],
        false,
    );

    let mut domains = TextDomains::new(CacheMode::InMemory);
    domains.set_locale("sr_CS.UTF-8@latin");
    domains.bind("app", tmp.path());
    domains.set_default_domain("app");

    assert_eq!(domains.gettext("Hello"), "Zdravo");
    assert_eq!(domains.gettext("Missing"), "Missing");
    assert_eq!(domains.dgettext("other", "Hello"), "Hello");
}
