//! MO catalog reading and translation lookup.
//!
//! A catalog is the compiled binary form of a message database: a fixed
//! 20-byte header, two parallel `(length, offset)` tables describing the
//! original and translated strings, and the raw string bytes. The originals
//! table is sorted ascending by byte-wise comparison, which is what makes
//! binary-search lookup possible; that ordering is a producer guarantee and
//! is not re-verified here.
//!
//! Construction is two-phase: [`Catalog::open`] parses the header and
//! returns an unloaded handle, [`Catalog::load`] reads the tables (and the
//! full string cache when requested) after which the state is immutable.
//! Lookup methods call `load` themselves on first use.
//!
//! Lookup never fails: a source whose magic does not match puts the catalog
//! into short-circuit mode where every lookup echoes its input, and missing
//! entries likewise fall back to the caller's strings. Callers that need to
//! observe I/O failures use the `try_*` variants.
//!
//! All methods take `&mut self` (the source cursor moves); share a catalog
//! across threads only behind a `Mutex`.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::{error::Error, plural::PluralRule, source::ByteSource};

/// Header magic in big-endian byte order.
const MAGIC_BE: [u8; 4] = [0x95, 0x04, 0x12, 0xde];
/// Header magic in little-endian byte order.
const MAGIC_LE: [u8; 4] = [0xde, 0x12, 0x04, 0x95];

/// Separator between the singular and plural halves of a plural lookup key,
/// and between the stored translation's forms.
const FORM_SEPARATOR: u8 = 0x00;
/// Separator between a disambiguation context and its message id.
const CONTEXT_SEPARATOR: char = '\u{4}';

/// Byte order of all multi-byte integers in a catalog, detected from the
/// leading magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteOrder {
    Little,
    Big,
}

/// The fixed catalog file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogHeader {
    pub byte_order: ByteOrder,
    /// File format revision; informational only.
    pub revision: u32,
    /// Number of entries in each of the two string tables.
    pub string_count: u32,
    /// Byte offset of the originals table.
    pub originals_offset: u32,
    /// Byte offset of the translations table.
    pub translations_offset: u32,
}

/// One string's location in the byte source.
#[derive(Debug, Clone, Copy)]
struct TableEntry {
    length: u32,
    offset: u32,
}

/// Whether a catalog materializes every string pair into memory at load
/// time or resolves each lookup with a binary search over the source.
///
/// Both modes return identical results; `InMemory` trades memory for lookup
/// speed and is the right choice unless the catalog is very large.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Build a full original → translation map at load time.
    InMemory,
    /// Binary-search the sorted originals table per lookup.
    Direct,
}

/// A loaded (or loadable) MO catalog with translation lookup.
#[derive(Debug)]
pub struct Catalog<S: ByteSource> {
    source: S,
    header: CatalogHeader,
    cache_mode: CacheMode,
    short_circuit: bool,
    loaded: bool,
    originals: Vec<TableEntry>,
    translations: Vec<TableEntry>,
    cache: Option<HashMap<Vec<u8>, Vec<u8>>>,
    plural_rule: PluralRule,
}

impl<S: ByteSource> Catalog<S> {
    /// Reads and validates the catalog header.
    ///
    /// A magic mismatch is not an error: the catalog enters short-circuit
    /// mode and every lookup echoes its input, which is the documented "no
    /// translation available" behavior. I/O failures while reading the
    /// header do propagate.
    pub fn open(mut source: S, cache_mode: CacheMode) -> Result<Self, Error> {
        let magic = source.read(4)?;
        let byte_order = match magic.as_slice() {
            m if *m == MAGIC_BE => Some(ByteOrder::Big),
            m if *m == MAGIC_LE => Some(ByteOrder::Little),
            _ => None,
        };

        let (header, short_circuit) = match byte_order {
            Some(byte_order) => {
                let revision = read_u32(&mut source, byte_order)?;
                let string_count = read_u32(&mut source, byte_order)?;
                let originals_offset = read_u32(&mut source, byte_order)?;
                let translations_offset = read_u32(&mut source, byte_order)?;
                (
                    CatalogHeader {
                        byte_order,
                        revision,
                        string_count,
                        originals_offset,
                        translations_offset,
                    },
                    false,
                )
            }
            None => (
                CatalogHeader {
                    byte_order: ByteOrder::Little,
                    revision: 0,
                    string_count: 0,
                    originals_offset: 0,
                    translations_offset: 0,
                },
                true,
            ),
        };

        Ok(Catalog {
            source,
            header,
            cache_mode,
            short_circuit,
            loaded: false,
            originals: Vec::new(),
            translations: Vec::new(),
            cache: None,
            plural_rule: PluralRule::default(),
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> &CatalogHeader {
        &self.header
    }

    /// Whether the source failed magic validation and lookups are bypassed.
    pub fn is_short_circuit(&self) -> bool {
        self.short_circuit
    }

    /// Loads the offset tables, the string cache (in `InMemory` mode), and
    /// the plural rule. Idempotent: a no-op once loaded, and a no-op in
    /// short-circuit mode. After a successful load the catalog state no
    /// longer changes.
    pub fn load(&mut self) -> Result<(), Error> {
        if self.loaded || self.short_circuit {
            return Ok(());
        }

        let count = self.header.string_count as usize;
        self.source.seek_to(u64::from(self.header.originals_offset))?;
        self.originals = self.read_entry_table(count)?;
        self.source
            .seek_to(u64::from(self.header.translations_offset))?;
        self.translations = self.read_entry_table(count)?;

        if self.cache_mode == CacheMode::InMemory {
            let mut cache = HashMap::with_capacity(count);
            for index in 0..count as u32 {
                let original = self.original_bytes(i64::from(index))?;
                let translation = self.translation_bytes(i64::from(index))?;
                // Duplicate keys: last write wins, in table order.
                cache.insert(original, translation);
            }
            self.cache = Some(cache);
        }

        // Entry 0 of the translations table conventionally holds the
        // catalog metadata block (the empty-msgid entry); the plural rule
        // comes from its Plural-Forms field.
        let metadata = match &self.cache {
            Some(cache) => cache.get(&b""[..]).cloned().unwrap_or_default(),
            None => self.translation_bytes(0)?,
        };
        self.plural_rule = PluralRule::from_metadata(&String::from_utf8_lossy(&metadata));

        self.loaded = true;
        Ok(())
    }

    /// The compiled plural rule (the default rule until loaded).
    pub fn plural_rule(&self) -> &PluralRule {
        &self.plural_rule
    }

    fn read_entry_table(&mut self, count: usize) -> Result<Vec<TableEntry>, Error> {
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let length = read_u32(&mut self.source, self.header.byte_order)?;
            let offset = read_u32(&mut self.source, self.header.byte_order)?;
            entries.push(TableEntry { length, offset });
        }
        Ok(entries)
    }

    /// Returns the string bytes at `index` of the originals table, or empty
    /// bytes when the table is unloaded, the index is out of range, or the
    /// entry has zero length.
    fn original_bytes(&mut self, index: i64) -> Result<Vec<u8>, Error> {
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| self.originals.get(i))
            .copied();
        self.entry_bytes(entry)
    }

    /// Same as [`Self::original_bytes`], over the translations table.
    fn translation_bytes(&mut self, index: i64) -> Result<Vec<u8>, Error> {
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| self.translations.get(i))
            .copied();
        self.entry_bytes(entry)
    }

    fn entry_bytes(&mut self, entry: Option<TableEntry>) -> Result<Vec<u8>, Error> {
        match entry {
            Some(TableEntry { length, offset }) if length > 0 => {
                self.source.seek_to(u64::from(offset))?;
                self.source.read(length as usize)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Binary search for `key` over the sorted originals table.
    ///
    /// The search narrows with `mid` as an inclusive bound on both sides
    /// and terminates at a one-element gap, not zero; catalogs with a
    /// contiguous originals table depend on that exact bounding. The
    /// `start > end` branch swaps the bounds and retries; it is only
    /// reachable from malformed bounds and is kept for compatibility with
    /// the historical behavior.
    fn find_string(&mut self, key: &[u8]) -> Result<Option<u32>, Error> {
        let mut start: i64 = 0;
        let mut end: i64 = i64::from(self.header.string_count);
        loop {
            if (start - end).abs() <= 1 {
                // Either this is the string, or it does not exist.
                let candidate = self.original_bytes(start)?;
                return Ok(if candidate == key {
                    Some(start as u32)
                } else {
                    None
                });
            }
            if start > end {
                std::mem::swap(&mut start, &mut end);
                continue;
            }
            let mid = (start + end) / 2;
            let probe = self.original_bytes(mid)?;
            match key.cmp(probe.as_slice()) {
                Ordering::Equal => return Ok(Some(mid as u32)),
                Ordering::Less => end = mid,
                Ordering::Greater => start = mid,
            }
        }
    }

    /// Looks up the translation bytes for an exact key, via the cache map
    /// or the binary search depending on the cache mode.
    fn lookup_bytes(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        if let Some(cache) = &self.cache {
            return Ok(cache.get(key).cloned());
        }
        match self.find_string(key)? {
            Some(index) => Ok(Some(self.translation_bytes(i64::from(index))?)),
            None => Ok(None),
        }
    }

    /// Fallible core of [`Self::translate`]. `Ok(None)` means no entry
    /// (including short-circuit mode); errors are read or decoding failures.
    pub fn try_translate(&mut self, msgid: &str) -> Result<Option<String>, Error> {
        if self.short_circuit {
            return Ok(None);
        }
        self.load()?;
        match self.lookup_bytes(msgid.as_bytes())? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    /// Fallible core of [`Self::plural_translate`]. `Ok(None)` means no
    /// usable entry: the key is absent, or the stored translation has fewer
    /// NUL-separated forms than the selected index.
    pub fn try_plural_translate(
        &mut self,
        singular: &str,
        plural: &str,
        n: u64,
    ) -> Result<Option<String>, Error> {
        if self.short_circuit {
            return Ok(None);
        }
        self.load()?;
        let index = self.plural_rule.select(n);

        let mut key = Vec::with_capacity(singular.len() + plural.len() + 1);
        key.extend_from_slice(singular.as_bytes());
        key.push(FORM_SEPARATOR);
        key.extend_from_slice(plural.as_bytes());

        match self.lookup_bytes(&key)? {
            Some(bytes) => match bytes.split(|&b| b == FORM_SEPARATOR).nth(index) {
                Some(form) => Ok(Some(String::from_utf8(form.to_vec())?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Translates `msgid`, returning it unchanged when no translation is
    /// available (missing entry, short-circuit mode, or a read failure).
    pub fn translate(&mut self, msgid: &str) -> String {
        match self.try_translate(msgid) {
            Ok(Some(translation)) => translation,
            _ => msgid.to_string(),
        }
    }

    /// Plural-aware translation: selects the grammatical form for `n` via
    /// the catalog's plural rule. Falls back to `singular` when `n == 1`
    /// and `plural` otherwise.
    pub fn plural_translate(&mut self, singular: &str, plural: &str, n: u64) -> String {
        match self.try_plural_translate(singular, plural, n) {
            Ok(Some(translation)) => translation,
            _ => {
                if n == 1 {
                    singular.to_string()
                } else {
                    plural.to_string()
                }
            }
        }
    }

    /// Context-disambiguated translation. The stored key is
    /// `context \x04 msgid`; a result still containing the separator means
    /// the lookup failed and echoed the literal key, so `msgid` is returned
    /// unchanged.
    pub fn context_translate(&mut self, context: &str, msgid: &str) -> String {
        let key = format!("{context}{CONTEXT_SEPARATOR}{msgid}");
        let result = self.translate(&key);
        if result.contains(CONTEXT_SEPARATOR) {
            msgid.to_string()
        } else {
            result
        }
    }

    /// Context-disambiguated plural translation. The context prefixes the
    /// singular only; plural selection is delegated to
    /// [`Self::plural_translate`], with the same separator check to detect
    /// a failed lookup.
    pub fn context_plural_translate(
        &mut self,
        context: &str,
        singular: &str,
        plural: &str,
        n: u64,
    ) -> String {
        let key = format!("{context}{CONTEXT_SEPARATOR}{singular}");
        let result = self.plural_translate(&key, plural, n);
        if result.contains(CONTEXT_SEPARATOR) {
            singular.to_string()
        } else {
            result
        }
    }
}

fn read_u32<S: ByteSource>(source: &mut S, byte_order: ByteOrder) -> Result<u32, Error> {
    let bytes = source.read(4)?;
    let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
    Ok(match byte_order {
        ByteOrder::Little => u32::from_le_bytes(raw),
        ByteOrder::Big => u32::from_be_bytes(raw),
    })
}
