//! POSIX locale fallback resolution.
//!
//! Catalog files are stored per locale, and a request for `sr_CS.UTF-8@latin`
//! should fall back to progressively less specific names until one exists on
//! disk. This module is a pure function from a locale specifier to that
//! ordered candidate list; it has no dependency on the catalog reader.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// POSIX locale pattern: `language[_COUNTRY][.charset][@modifier]`.
    static ref POSIX_LOCALE_RE: Regex = Regex::new(
        r"^(?P<lang>[a-z]{2,3})(?:_(?P<country>[A-Z]{2}))?(?:\.(?P<charset>[-A-Za-z0-9_]+))?(?:@(?P<modifier>[-A-Za-z0-9_]+))?$"
    )
    .expect("valid POSIX locale regex");
}

/// Expands a POSIX locale specifier into an ordered list of candidate
/// locale names, most specific first.
///
/// For `sr_CS.UTF-8@latin` the candidates are, in order:
/// `sr_CS.UTF-8@latin`, `sr_CS@latin`, `sr@latin`, `sr_CS.UTF-8`, `sr_CS`,
/// `sr`. A specifier that does not match the POSIX pattern (or whose
/// expansion would not include it) is appended verbatim as the final
/// candidate; the empty string yields no candidates.
pub fn locale_candidates(locale: &str) -> Vec<String> {
    let mut names = Vec::new();
    if locale.is_empty() {
        return names;
    }

    if let Some(caps) = POSIX_LOCALE_RE.captures(locale) {
        let lang = &caps["lang"];
        let country = caps.name("country").map(|m| m.as_str());
        let charset = caps.name("charset").map(|m| m.as_str());
        let modifier = caps.name("modifier").map(|m| m.as_str());

        if let Some(modifier) = modifier {
            if let Some(country) = country {
                if let Some(charset) = charset {
                    names.push(format!("{lang}_{country}.{charset}@{modifier}"));
                }
                names.push(format!("{lang}_{country}@{modifier}"));
            } else if let Some(charset) = charset {
                names.push(format!("{lang}.{charset}@{modifier}"));
            }
            names.push(format!("{lang}@{modifier}"));
        }
        if let Some(country) = country {
            if let Some(charset) = charset {
                names.push(format!("{lang}_{country}.{charset}"));
            }
            names.push(format!("{lang}_{country}"));
        } else if let Some(charset) = charset {
            names.push(format!("{lang}.{charset}"));
        }
        names.push(lang.to_string());
    }

    if !names.iter().any(|name| name == locale) {
        names.push(locale.to_string());
    }
    names
}
