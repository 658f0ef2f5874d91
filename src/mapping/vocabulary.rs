//! Pre-extracted master-taxonomy vocabularies driving the NLP-qualifier
//! stage (§4.9 strategy 2): strong occupation heads, and head/qualifier pairs
//! for the qualified-prefix and qualified-suffix patterns.

use std::collections::HashMap;

use uuid::Uuid;

use crate::normalize::fold;

/// A multi-word phrase, pre-split and folded, for subsequence matching
/// against a tokenized customer value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub tokens: Vec<String>,
}

impl Phrase {
    pub fn new(text: &str) -> Phrase {
        Phrase { tokens: fold(text).split_whitespace().map(|t| t.to_string()).collect() }
    }

    fn is_contiguous_subsequence_of(&self, tokens: &[String]) -> bool {
        if self.tokens.is_empty() || self.tokens.len() > tokens.len() {
            return false;
        }
        tokens.windows(self.tokens.len()).any(|window| window == self.tokens.as_slice())
    }
}

#[derive(Debug, Clone)]
pub struct QualifiedPattern {
    pub head: Phrase,
    pub qualifier: Phrase,
    pub master_node_id: Uuid,
}

/// One master node's own title, synonymous profession label, and attribute
/// values — the raw material [`Vocabulary::build`] indexes into strong heads
/// and qualified patterns.
#[derive(Debug, Clone)]
pub struct MasterVocabularyEntry {
    pub master_node_id: Uuid,
    pub value: String,
    pub profession: Option<String>,
    pub attribute_values: Vec<String>,
}

/// A master taxonomy's strong-occupation heads and qualified-phrase
/// patterns, keyed for the NLP-qualifier stage.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub strong_heads: HashMap<String, Uuid>,
    pub qualified_patterns: Vec<QualifiedPattern>,
}

impl Vocabulary {
    pub fn new() -> Vocabulary {
        Vocabulary::default()
    }

    /// Builds a vocabulary straight from a master taxonomy's own nodes and
    /// attributes (§4.9 strategy 2): a node's own value, and its profession
    /// label when distinct, are trivially strong heads of itself; each
    /// attribute value recorded against the node qualifies that head, e.g. a
    /// "Registered Nurse" node with attribute value "ICU" yields the
    /// `(head="Registered Nurse", qualifier="ICU")` pattern the suffix/prefix
    /// matchers look for.
    pub fn build(entries: &[MasterVocabularyEntry]) -> Vocabulary {
        let mut vocabulary = Vocabulary::new();
        for entry in entries {
            vocabulary.add_strong_head(&entry.value, entry.master_node_id);
            if let Some(profession) = &entry.profession {
                if fold(profession) != fold(&entry.value) {
                    vocabulary.add_strong_head(profession, entry.master_node_id);
                }
            }
            for qualifier in &entry.attribute_values {
                vocabulary.add_qualified_pattern(&entry.value, qualifier, entry.master_node_id);
            }
        }
        vocabulary
    }

    pub fn add_strong_head(&mut self, phrase: &str, master_node_id: Uuid) {
        self.strong_heads.insert(fold(phrase), master_node_id);
    }

    pub fn add_qualified_pattern(&mut self, head: &str, qualifier: &str, master_node_id: Uuid) {
        self.qualified_patterns.push(QualifiedPattern { head: Phrase::new(head), qualifier: Phrase::new(qualifier), master_node_id });
    }

    /// Strong-occupation match: the full phrase appears contiguously in the
    /// folded token stream.
    pub fn find_strong_head(&self, tokens: &[String]) -> Option<Uuid> {
        self.strong_heads.iter().find(|(phrase, _)| {
            let phrase_tokens: Vec<String> = phrase.split_whitespace().map(|t| t.to_string()).collect();
            Phrase { tokens: phrase_tokens }.is_contiguous_subsequence_of(tokens)
        }).map(|(_, id)| *id)
    }

    /// `qualifier … head` — the qualifier leads, the head trails.
    pub fn find_qualified_suffix(&self, tokens: &[String]) -> Option<Uuid> {
        self.qualified_patterns
            .iter()
            .find(|p| starts_with(tokens, &p.qualifier.tokens) && ends_with(tokens, &p.head.tokens) && !overlapping(tokens, &p.qualifier.tokens, &p.head.tokens))
            .map(|p| p.master_node_id)
    }

    /// `head … qualifier` — the head leads, the qualifier trails.
    pub fn find_qualified_prefix(&self, tokens: &[String]) -> Option<Uuid> {
        self.qualified_patterns
            .iter()
            .find(|p| starts_with(tokens, &p.head.tokens) && ends_with(tokens, &p.qualifier.tokens) && !overlapping(tokens, &p.head.tokens, &p.qualifier.tokens))
            .map(|p| p.master_node_id)
    }
}

fn starts_with(tokens: &[String], prefix: &[String]) -> bool {
    !prefix.is_empty() && tokens.len() >= prefix.len() && &tokens[..prefix.len()] == prefix
}

fn ends_with(tokens: &[String], suffix: &[String]) -> bool {
    !suffix.is_empty() && tokens.len() >= suffix.len() && &tokens[tokens.len() - suffix.len()..] == suffix
}

fn overlapping(tokens: &[String], leading: &[String], trailing: &[String]) -> bool {
    leading.len() + trailing.len() > tokens.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        fold(s).split_whitespace().map(|t| t.to_string()).collect()
    }

    #[test]
    fn build_derives_strong_head_and_qualified_pattern_from_one_entry() {
        let master_node_id = Uuid::new_v4();
        let entries = vec![MasterVocabularyEntry {
            master_node_id,
            value: "Registered Nurse".to_string(),
            profession: Some("Registered Nurse".to_string()),
            attribute_values: vec!["ICU".to_string()],
        }];
        let vocab = Vocabulary::build(&entries);

        assert_eq!(vocab.find_strong_head(&tokens("Senior Registered Nurse Lead")), Some(master_node_id));
        assert_eq!(vocab.find_qualified_suffix(&tokens("ICU Registered Nurse")), Some(master_node_id));
    }

    #[test]
    fn build_skips_profession_head_when_identical_to_value() {
        let master_node_id = Uuid::new_v4();
        let entries = vec![MasterVocabularyEntry {
            master_node_id,
            value: "Registered Nurse".to_string(),
            profession: Some("registered nurse".to_string()),
            attribute_values: vec![],
        }];
        let vocab = Vocabulary::build(&entries);
        assert_eq!(vocab.strong_heads.len(), 1);
    }

    #[test]
    fn strong_head_matches_contiguous_phrase() {
        let mut vocab = Vocabulary::new();
        let id = Uuid::new_v4();
        vocab.add_strong_head("Registered Nurse", id);
        assert_eq!(vocab.find_strong_head(&tokens("Senior Registered Nurse Lead")), Some(id));
        assert_eq!(vocab.find_strong_head(&tokens("Registered Dietitian")), None);
    }

    #[test]
    fn qualified_suffix_requires_qualifier_before_head() {
        let mut vocab = Vocabulary::new();
        let id = Uuid::new_v4();
        vocab.add_qualified_pattern("Registered Nurse", "ICU", id);
        assert_eq!(vocab.find_qualified_suffix(&tokens("ICU Registered Nurse")), Some(id));
        assert_eq!(vocab.find_qualified_suffix(&tokens("Registered Nurse ICU")), None);
    }

    #[test]
    fn qualified_prefix_requires_head_before_qualifier() {
        let mut vocab = Vocabulary::new();
        let id = Uuid::new_v4();
        vocab.add_qualified_pattern("Registered Nurse", "ICU", id);
        assert_eq!(vocab.find_qualified_prefix(&tokens("Registered Nurse ICU")), Some(id));
    }
}
