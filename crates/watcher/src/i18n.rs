//! Localized user-facing messages
//!
//! Message catalogs are JSON documents embedded at build time, keyed by
//! message id, with positional `{0}`/`{1}` placeholders. Lookup falls back
//! to the English catalog and finally to the key itself, so a missing
//! translation degrades the message but never loses it.
//!
//! Structured debug/trace logging stays English; only user-facing lines go
//! through the catalog.

use std::collections::HashMap;
use std::env;
use std::fmt;

const EN_US: &str = include_str!("../lang/en_us.json");
const ZH_CN: &str = include_str!("../lang/zh_cn.json");

pub const DEFAULT_LANGUAGE: &str = "en_us";

/// Embedded message catalog with language selection.
#[derive(Debug, Clone)]
pub struct Catalog {
    language: &'static str,
    tables: HashMap<&'static str, HashMap<String, String>>,
}

impl Catalog {
    /// Build a catalog from the configured preference.
    ///
    /// An explicit `en_us`/`zh_cn` wins; anything else (`auto` included)
    /// consults the `LANG` environment variable, where a `zh` prefix selects
    /// Chinese and everything else English.
    pub fn new(preference: &str) -> Self {
        let mut tables = HashMap::new();
        tables.insert("en_us", parse_table(EN_US));
        tables.insert("zh_cn", parse_table(ZH_CN));

        let language = match preference {
            "en_us" => "en_us",
            "zh_cn" => "zh_cn",
            _ => detect_system_language(),
        };

        Self { language, tables }
    }

    /// The selected language code.
    pub fn language(&self) -> &str {
        self.language
    }

    /// Look up a message by key, falling back to English, then to the key.
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }

    /// Look up a message and substitute positional `{0}`-style arguments.
    pub fn format(&self, key: &str, args: &[&dyn fmt::Display]) -> String {
        let mut text = self.get(key);
        for (index, arg) in args.iter().enumerate() {
            text = text.replace(&format!("{{{index}}}"), &arg.to_string());
        }
        text
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.tables
            .get(self.language)
            .and_then(|table| table.get(key))
            .or_else(|| {
                self.tables
                    .get(DEFAULT_LANGUAGE)
                    .and_then(|table| table.get(key))
            })
            .cloned()
    }
}

fn parse_table(raw: &'static str) -> HashMap<String, String> {
    serde_json::from_str(raw).expect("embedded language catalog is valid JSON")
}

fn detect_system_language() -> &'static str {
    match env::var("LANG") {
        Ok(lang) if lang.starts_with("zh") => "zh_cn",
        _ => DEFAULT_LANGUAGE,
    }
}
