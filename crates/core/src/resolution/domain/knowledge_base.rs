use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::shared::constants::DEFAULT_SYMBOL_SUFFIX;
use crate::shared::similarity::alias_key;
use crate::shared::warning::Warning;

use super::entity::Category;

/// One instrument known to the knowledge base.
#[derive(Debug, Clone, PartialEq)]
pub struct KbEntry {
    /// Canonical ticker without exchange suffix.
    pub ticker: String,
    pub category: Category,
    pub aliases: Vec<String>,
}

/// Read-only `sector -> {ticker -> [aliases]}` reference data, indexed for
/// exact and fuzzy lookups.
///
/// Loading never fails: a missing document gives an empty base and a
/// malformed one gives an empty (or partial) base plus warnings, so the
/// resolver degrades to its remaining stages.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    entries: Vec<KbEntry>,
    by_ticker: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> (Self, Vec<Warning>) {
        let mut kb = Self::empty();
        let warnings = kb.merge_file(path);
        (kb, warnings)
    }

    pub fn from_json_str(json: &str) -> (Self, Vec<Warning>) {
        let mut kb = Self::empty();
        let warnings = kb.merge_json_str(json);
        (kb, warnings)
    }

    /// Merge another document of the same shape, such as the finance
    /// terminology list. Existing mappings win on conflict.
    pub fn merge_file(&mut self, path: &Path) -> Vec<Warning> {
        if !path.exists() {
            log::info!("No knowledge base at {}; continuing without it", path.display());
            return Vec::new();
        }
        match fs::read_to_string(path) {
            Ok(json) => self.merge_json_str(&json),
            Err(e) => vec![malformed(format!("{}: {e}", path.display()))],
        }
    }

    pub fn merge_json_str(&mut self, json: &str) -> Vec<Warning> {
        let document: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => return vec![malformed(format!("invalid JSON: {e}"))],
        };
        let Value::Object(sectors) = document else {
            return vec![malformed("top level must be an object of sectors".to_string())];
        };

        let mut warnings = Vec::new();
        let before = self.entries.len();
        for (sector, tickers) in sectors {
            let Value::Object(tickers) = tickers else {
                warnings.push(malformed(format!("sector '{sector}' is not an object")));
                continue;
            };
            let category = Category::from_sector(&sector);
            for (ticker, aliases) in tickers {
                match alias_list(&aliases) {
                    Some(aliases) => self.insert(&ticker, category, aliases),
                    None => warnings.push(malformed(format!(
                        "aliases of '{ticker}' in '{sector}' are not a list of strings"
                    ))),
                }
            }
        }
        log::info!(
            "Knowledge base: {} instruments ({} new), {} aliases",
            self.entries.len(),
            self.entries.len() - before,
            self.by_alias.len()
        );
        warnings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[KbEntry] {
        &self.entries
    }

    /// Entry whose canonical ticker matches, ignoring case and suffix.
    pub fn by_ticker(&self, ticker: &str) -> Option<&KbEntry> {
        self.by_ticker
            .get(&alias_key(strip_suffix(ticker)))
            .map(|&i| &self.entries[i])
    }

    pub fn by_alias(&self, alias: &str) -> Option<&KbEntry> {
        self.by_alias.get(&alias_key(alias)).map(|&i| &self.entries[i])
    }

    pub fn category_of(&self, ticker: &str) -> Category {
        self.by_ticker(ticker)
            .map_or(Category::Unknown, |entry| entry.category)
    }

    /// Every lookup key (ticker and aliases) with the entry it points at.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &KbEntry)> + '_ {
        self.by_ticker
            .iter()
            .chain(self.by_alias.iter())
            .map(|(key, &i)| (key.as_str(), &self.entries[i]))
    }

    fn insert(&mut self, ticker: &str, category: Category, aliases: Vec<String>) {
        let ticker = strip_suffix(ticker.trim()).to_string();
        let ticker_key = alias_key(&ticker);
        if ticker_key.is_empty() {
            return;
        }
        let index = match self.by_ticker.get(&ticker_key) {
            Some(&i) => i,
            None => {
                self.entries.push(KbEntry {
                    ticker: ticker.clone(),
                    category,
                    aliases: Vec::new(),
                });
                self.by_ticker.insert(ticker_key.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        for alias in aliases {
            let key = alias_key(&alias);
            if key.is_empty() || key == ticker_key {
                continue;
            }
            match self.by_alias.get(&key) {
                Some(&existing) if existing != index => {
                    log::warn!(
                        "Alias '{alias}' already maps to {}; ignoring mapping to {ticker}",
                        self.entries[existing].ticker
                    );
                }
                Some(_) => {}
                None => {
                    self.by_alias.insert(key, index);
                    self.entries[index].aliases.push(alias);
                }
            }
        }
    }
}

/// Ticker without the exchange suffix, e.g. `PTT.BK` -> `PTT`.
pub fn strip_suffix(ticker: &str) -> &str {
    ticker.strip_suffix(DEFAULT_SYMBOL_SUFFIX).unwrap_or(ticker)
}

fn alias_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn malformed(detail: String) -> Warning {
    log::warn!("Knowledge base malformed: {detail}");
    Warning::KnowledgeBaseMalformed { detail }
}
