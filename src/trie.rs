// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Character trie used for multi-word keyword recognition and longest-match
//! time-format substitution. Built once per keyword/format set and immutable
//! afterwards.

use std::collections::HashMap;

/// Outcome of looking a candidate string up in a [`Trie`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieResult {
    /// No registered string starts with the candidate.
    Failed,
    /// The candidate is a proper prefix of at least one registered string.
    Prefix,
    /// A registered string ends exactly at the candidate.
    Exists,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieNode {
    children: HashMap<char, TrieNode>,
    is_word: bool,
}

impl TrieNode {
    /// Advances the cursor by one character, returning the child node if the
    /// extended string is still a registered prefix. This is what lets the
    /// tokenizer ask "is this keyword, extended by one more character, still
    /// viable" without rescanning from the root.
    pub fn step(&self, ch: char) -> Option<&TrieNode> {
        self.children.get(&ch)
    }

    pub fn is_word(&self) -> bool {
        self.is_word
    }

    pub fn classify(&self) -> TrieResult {
        if self.is_word {
            TrieResult::Exists
        } else {
            TrieResult::Prefix
        }
    }
}

/// Prefix tree over a finite set of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn build<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = Trie::default();
        for word in words {
            let mut node = &mut trie.root;
            for ch in word.as_ref().chars() {
                node = node.children.entry(ch).or_default();
            }
            node.is_word = true;
        }
        trie
    }

    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Classifies `candidate` against the registered set, additionally
    /// returning the node the walk stopped at so callers can extend the
    /// match incrementally via [`TrieNode::step`].
    pub fn query<'a>(&'a self, candidate: &str) -> (TrieResult, &'a TrieNode) {
        let mut node = &self.root;
        for ch in candidate.chars() {
            match node.step(ch) {
                Some(child) => node = child,
                None => return (TrieResult::Failed, node),
            }
        }
        (node.classify(), node)
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

/// Rewrites `value` by greedily substituting the longest registered key of
/// `mapping` at each position, leaving unmatched characters untouched. Used
/// to translate dialect time-format strings through a dialect's format map.
pub fn format_time(value: &str, mapping: &HashMap<String, String>, trie: &Trie) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut start = 0;
    while start < chars.len() {
        let mut node = trie.root();
        let mut end = start;
        let mut best: Option<usize> = None;
        while end < chars.len() {
            match node.step(chars[end]) {
                Some(child) => {
                    node = child;
                    end += 1;
                    if node.is_word() {
                        best = Some(end);
                    }
                }
                None => break,
            }
        }
        match best {
            Some(stop) => {
                let key: String = chars[start..stop].iter().collect();
                match mapping.get(&key) {
                    Some(replacement) => out.push_str(replacement),
                    None => out.push_str(&key),
                }
                start = stop;
            }
            None => {
                out.push(chars[start]);
                start += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let trie = Trie::build(["GROUP BY", "GROUPING SETS", "ORDER BY"]);

        let (result, _) = trie.query("GROUP");
        assert_eq!(result, TrieResult::Prefix);
        let (result, _) = trie.query("GROUP B");
        assert_eq!(result, TrieResult::Prefix);
        let (result, _) = trie.query("GROUP BY");
        assert_eq!(result, TrieResult::Exists);
        let (result, _) = trie.query("GROUPING SETS");
        assert_eq!(result, TrieResult::Exists);
        let (result, _) = trie.query("HAVING");
        assert_eq!(result, TrieResult::Failed);
    }

    #[test]
    fn test_every_proper_prefix_is_prefix_or_exists() {
        let words = ["PARTITION BY", "CLUSTER BY", "SORT BY"];
        let trie = Trie::build(words);
        for word in words {
            for end in 1..word.len() {
                if !word.is_char_boundary(end) {
                    continue;
                }
                let (result, _) = trie.query(&word[..end]);
                assert_ne!(result, TrieResult::Failed, "prefix {:?}", &word[..end]);
            }
            let (result, _) = trie.query(word);
            assert_eq!(result, TrieResult::Exists);
        }
    }

    #[test]
    fn test_incremental_walk() {
        let trie = Trie::build(["ORDER BY"]);
        let mut node = trie.root();
        for ch in "ORDER".chars() {
            node = node.step(ch).unwrap();
        }
        assert_eq!(node.classify(), TrieResult::Prefix);
        let node = node.step(' ').unwrap();
        let node = node.step('B').unwrap();
        let node = node.step('Y').unwrap();
        assert_eq!(node.classify(), TrieResult::Exists);
        assert!(node.step('!').is_none());
    }

    #[test]
    fn test_empty_trie() {
        let trie = Trie::build(Vec::<String>::new());
        assert!(trie.is_empty());
        let (result, _) = trie.query("X");
        assert_eq!(result, TrieResult::Failed);
    }

    #[test]
    fn test_format_time() {
        let mapping: HashMap<String, String> = [
            ("%Y".to_string(), "yyyy".to_string()),
            ("%m".to_string(), "MM".to_string()),
            ("%d".to_string(), "dd".to_string()),
        ]
        .into_iter()
        .collect();
        let trie = Trie::build(mapping.keys());
        assert_eq!(format_time("%Y-%m-%d", &mapping, &trie), "yyyy-MM-dd");
        assert_eq!(format_time("x%Yx", &mapping, &trie), "xyyyyx");
        assert_eq!(format_time("%q", &mapping, &trie), "%q");
    }
}
