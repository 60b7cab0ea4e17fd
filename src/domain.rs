//! Text-domain registry: locale-driven catalog selection.
//!
//! This is the explicit-value counterpart of the classic gettext domain
//! machinery: instead of process-wide globals, a [`TextDomains`] value owns
//! the active locale, a default domain name, and a map from domain to bound
//! catalog directory. Catalogs are resolved on first lookup by walking the
//! locale fallback candidates and opening the first
//! `<base>/<candidate>/LC_MESSAGES/<domain>.mo` that exists.
//!
//! Every lookup is total: an unbound domain, an unresolvable catalog, or a
//! missing entry degrades to the caller's own strings with the usual
//! grammatical fallbacks.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    catalog::{CacheMode, Catalog},
    locale::locale_candidates,
    source::FileSource,
};

/// The catalog subdirectory for message catalogs. Other locale categories
/// carry no catalogs and are not modeled here.
const MESSAGES_CATEGORY: &str = "LC_MESSAGES";

/// The domain used when none has been selected explicitly.
const DEFAULT_DOMAIN: &str = "messages";

#[derive(Debug)]
struct DomainBinding {
    base_path: PathBuf,
    catalog: Option<Catalog<FileSource>>,
}

/// An explicit registry of text domains and their resolved catalogs.
///
/// Single-threaded like the catalogs it owns; wrap in a `Mutex` to share.
#[derive(Debug)]
pub struct TextDomains {
    locale: String,
    default_domain: String,
    cache_mode: CacheMode,
    domains: HashMap<String, DomainBinding>,
}

impl TextDomains {
    /// Creates an empty registry. No locale is set; call
    /// [`Self::set_locale`] before binding domains.
    pub fn new(cache_mode: CacheMode) -> Self {
        TextDomains {
            locale: String::new(),
            default_domain: DEFAULT_DOMAIN.to_string(),
            cache_mode,
            domains: HashMap::new(),
        }
    }

    /// Sets the active locale and returns it. An empty `locale` falls back
    /// to the `LANG` environment variable. Changing the locale drops every
    /// resolved catalog so the next lookup re-resolves against the new
    /// fallback chain.
    pub fn set_locale(&mut self, locale: &str) -> String {
        self.locale = if locale.is_empty() {
            std::env::var("LANG").unwrap_or_default()
        } else {
            locale.to_string()
        };
        for binding in self.domains.values_mut() {
            binding.catalog = None;
        }
        self.locale.clone()
    }

    /// The active locale specifier.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Binds `domain` to a catalog base directory. Rebinding an existing
    /// domain replaces its path and drops any resolved catalog.
    pub fn bind<P: AsRef<Path>>(&mut self, domain: &str, base_path: P) {
        self.domains.insert(
            domain.to_string(),
            DomainBinding {
                base_path: base_path.as_ref().to_path_buf(),
                catalog: None,
            },
        );
    }

    /// Removes a domain binding entirely. Returns whether it was bound.
    pub fn unbind(&mut self, domain: &str) -> bool {
        self.domains.remove(domain).is_some()
    }

    /// Selects the domain used by the non-`d`-prefixed lookups.
    pub fn set_default_domain(&mut self, domain: &str) {
        self.default_domain = domain.to_string();
    }

    /// The domain used by the non-`d`-prefixed lookups.
    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    /// Resolves (once) and returns the catalog for `domain`. Resolution
    /// walks the locale fallback candidates in order and keeps the first
    /// catalog file that exists and opens; candidates that fail to open are
    /// skipped. Returns `None` while no candidate resolves, in which case
    /// resolution is retried on the next lookup.
    fn catalog_for(&mut self, domain: &str) -> Option<&mut Catalog<FileSource>> {
        let locale = self.locale.clone();
        let binding = self.domains.get_mut(domain)?;
        if binding.catalog.is_none() {
            for candidate in locale_candidates(&locale) {
                let path = binding
                    .base_path
                    .join(&candidate)
                    .join(MESSAGES_CATEGORY)
                    .join(format!("{domain}.mo"));
                if !path.is_file() {
                    continue;
                }
                let Ok(source) = FileSource::open(&path) else {
                    continue;
                };
                if let Ok(catalog) = Catalog::open(source, self.cache_mode) {
                    binding.catalog = Some(catalog);
                    break;
                }
            }
        }
        binding.catalog.as_mut()
    }

    /// Looks up `msgid` in the default domain.
    pub fn gettext(&mut self, msgid: &str) -> String {
        let domain = self.default_domain.clone();
        self.dgettext(&domain, msgid)
    }

    /// Looks up `msgid` in an explicit domain.
    pub fn dgettext(&mut self, domain: &str, msgid: &str) -> String {
        match self.catalog_for(domain) {
            Some(catalog) => catalog.translate(msgid),
            None => msgid.to_string(),
        }
    }

    /// Plural lookup in the default domain.
    pub fn ngettext(&mut self, singular: &str, plural: &str, n: u64) -> String {
        let domain = self.default_domain.clone();
        self.dngettext(&domain, singular, plural, n)
    }

    /// Plural lookup in an explicit domain.
    pub fn dngettext(&mut self, domain: &str, singular: &str, plural: &str, n: u64) -> String {
        match self.catalog_for(domain) {
            Some(catalog) => catalog.plural_translate(singular, plural, n),
            None => {
                if n == 1 {
                    singular.to_string()
                } else {
                    plural.to_string()
                }
            }
        }
    }

    /// Context lookup in the default domain.
    pub fn pgettext(&mut self, context: &str, msgid: &str) -> String {
        let domain = self.default_domain.clone();
        self.dpgettext(&domain, context, msgid)
    }

    /// Context lookup in an explicit domain.
    pub fn dpgettext(&mut self, domain: &str, context: &str, msgid: &str) -> String {
        match self.catalog_for(domain) {
            Some(catalog) => catalog.context_translate(context, msgid),
            None => msgid.to_string(),
        }
    }

    /// Context plural lookup in the default domain.
    pub fn npgettext(&mut self, context: &str, singular: &str, plural: &str, n: u64) -> String {
        let domain = self.default_domain.clone();
        self.dnpgettext(&domain, context, singular, plural, n)
    }

    /// Context plural lookup in an explicit domain.
    pub fn dnpgettext(
        &mut self,
        domain: &str,
        context: &str,
        singular: &str,
        plural: &str,
        n: u64,
    ) -> String {
        match self.catalog_for(domain) {
            Some(catalog) => catalog.context_plural_translate(context, singular, plural, n),
            None => {
                if n == 1 {
                    singular.to_string()
                } else {
                    plural.to_string()
                }
            }
        }
    }
}
