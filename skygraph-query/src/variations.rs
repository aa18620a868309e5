// Copyright 2025 Skygraph Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Deterministic surface-form generation for entity matching.
//!
//! Satellite and product names show up in many spellings: `INSAT-3D`,
//! `insat 3d`, `insat3d`. Both the query and every graph node get expanded
//! into the same finite variation set, so the lexical tier catches spelling
//! differences without any model in the loop.

use std::collections::BTreeSet;

/// Number words the portal's entity names actually use.
const NUMBER_WORDS: [(&str, &str); 11] = [
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("ten", "10"),
];

/// Filler tokens stripped from the ends of a name before matching.
const NOISE_TOKENS: [&str; 5] = ["the", "satellite", "mission", "data", "product"];

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_separator(c: char) -> bool {
    matches!(c, '-' | '_' | '/')
}

fn separators_to_space(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if is_separator(c) { ' ' } else { c })
        .collect();
    collapse_whitespace(&replaced)
}

fn separators_removed(text: &str) -> String {
    text.chars().filter(|c| !is_separator(*c)).collect()
}

fn punctuation_to_space(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&replaced)
}

fn acronym(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return None;
    }
    let initials: String = words.iter().filter_map(|w| w.chars().next()).collect();
    (initials.len() >= 2).then_some(initials)
}

fn swap_number_words(text: &str) -> Option<String> {
    let mut changed = false;
    let swapped: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            for (name, digit) in NUMBER_WORDS {
                if word == name {
                    changed = true;
                    return digit.to_string();
                }
                if word == digit {
                    changed = true;
                    return name.to_string();
                }
            }
            word.to_string()
        })
        .collect();
    changed.then(|| swapped.join(" "))
}

fn strip_noise_tokens(text: &str) -> Option<String> {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    let mut changed = false;
    while let Some(first) = words.first() {
        if NOISE_TOKENS.contains(first) {
            words.remove(0);
            changed = true;
        } else {
            break;
        }
    }
    while let Some(last) = words.last() {
        if NOISE_TOKENS.contains(last) {
            words.pop();
            changed = true;
        } else {
            break;
        }
    }
    (changed && !words.is_empty()).then(|| words.join(" "))
}

/// Expand `text` into its deterministic variation set.
///
/// Always includes the trimmed original and its lowercase form; everything
/// else derives from the lowercase form. Empty and single-character
/// variations are dropped.
pub fn variations(text: &str) -> BTreeSet<String> {
    let mut set = BTreeSet::new();
    let original = collapse_whitespace(text);
    if original.is_empty() {
        return set;
    }

    let lower = original.to_lowercase();
    set.insert(original);
    set.insert(lower.clone());

    let spaced = separators_to_space(&lower);
    set.insert(spaced.clone());
    set.insert(separators_removed(&lower));
    set.insert(punctuation_to_space(&lower));
    set.insert(lower.chars().filter(|c| !c.is_whitespace()).collect());
    set.insert(spaced.chars().filter(|c| !c.is_whitespace()).collect());

    if let Some(initials) = acronym(&spaced) {
        set.insert(initials);
    }
    if let Some(swapped) = swap_number_words(&spaced) {
        set.insert(swapped.chars().filter(|c| !c.is_whitespace()).collect());
        set.insert(swapped);
    }
    if let Some(stripped) = strip_noise_tokens(&spaced) {
        set.insert(stripped);
    }

    set.retain(|v| v.chars().count() >= 2);
    set
}
