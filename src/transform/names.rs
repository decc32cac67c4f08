/*!
# Rename Map

Run-wide mapping from original identifier to alias. An alias, once issued,
is reused for every later occurrence of the same name in every file, so
declarations and uses renamed in different files stay consistent.

Aliases are either drawn from a table of visually confusable characters
(Latin, Cyrillic and Greek look-alikes) or are `_` followed by eight hex
digits.
*/

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Look-alike characters used for Unicode aliases
pub const CONFUSABLE_CHARACTERS: &[char] = &[
    'O', 'o', '\u{041E}', '\u{043E}', '\u{039F}', '\u{03BF}', // O
    'I', 'l', '\u{04C0}', '\u{0406}', '\u{0399}', '\u{03B9}', // I
    'a', '\u{0430}', '\u{0251}', // a
    'e', '\u{0435}', '\u{0511}', // e
    'c', '\u{0441}', '\u{03F2}', // c
    'p', '\u{0440}', '\u{03C1}', // p
    'B', '\u{0412}', '\u{0392}', // B
    'H', '\u{041D}', '\u{0397}', // H
    'K', '\u{041A}', '\u{039A}', // K
    'M', '\u{041C}', '\u{039C}', // M
    'T', '\u{0422}', '\u{03A4}', // T
    'X', '\u{0425}', '\u{03A7}', // X
    'Y', '\u{0423}', '\u{03A5}', // Y
    'Z', '\u{0396}', // Z
];

/// How fresh aliases are minted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasStyle {
    /// 4 to 6 confusable characters, first one lowercased
    Unicode,
    /// `_` + 8 hex digits
    Hex,
}

impl AliasStyle {
    pub fn from_unicode_flag(unicode_names: bool) -> Self {
        if unicode_names {
            Self::Unicode
        } else {
            Self::Hex
        }
    }
}

/// Original name -> alias, shared by every file of a run
#[derive(Debug)]
pub struct RenameMap {
    aliases: HashMap<String, String>,
    issued: HashSet<String>,
    style: AliasStyle,
    rng: StdRng,
}

impl RenameMap {
    pub fn new(style: AliasStyle) -> Self {
        Self::with_rng(style, StdRng::from_entropy())
    }

    /// Deterministic map for reproducible output.
    pub fn with_seed(style: AliasStyle, seed: u64) -> Self {
        Self::with_rng(style, StdRng::seed_from_u64(seed))
    }

    fn with_rng(style: AliasStyle, rng: StdRng) -> Self {
        Self {
            aliases: HashMap::new(),
            issued: HashSet::new(),
            style,
            rng,
        }
    }

    pub fn style(&self) -> AliasStyle {
        self.style
    }

    /// Returns the alias of `original`, minting one on first use.
    pub fn alias_for(&mut self, original: &str) -> String {
        if let Some(alias) = self.aliases.get(original) {
            return alias.clone();
        }
        let alias = loop {
            let candidate = self.mint();
            // An alias equal to a name already mapped would merge two identifiers.
            if !self.issued.contains(&candidate) && !self.aliases.contains_key(&candidate) {
                break candidate;
            }
        };
        self.issued.insert(alias.clone());
        self.aliases.insert(original.to_string(), alias.clone());
        alias
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.aliases.get(original).map(String::as_str)
    }

    /// Number of distinct renamed names.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn mint(&mut self) -> String {
        match self.style {
            AliasStyle::Unicode => {
                let length = 1 + self.rng.gen_range(3..=5);
                let mut alias = String::with_capacity(length * 2);
                for i in 0..length {
                    let ch = *CONFUSABLE_CHARACTERS
                        .choose(&mut self.rng)
                        .unwrap_or(&'o');
                    if i == 0 {
                        alias.push(ch.to_ascii_lowercase());
                    } else {
                        alias.push(ch);
                    }
                }
                alias
            }
            AliasStyle::Hex => {
                let bytes: [u8; 4] = self.rng.gen();
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                format!("_{}", hex)
            }
        }
    }
}
