//! Token Source
//!
//! The extractor only needs a handful of per-token facts: surface text,
//! lemma, a coarse part-of-speech tag and four flags. Anything able to supply
//! those can implement [`TokenSource`]; [`RuleTokenizer`] is the built-in,
//! dependency-free implementation used by the CLI and the tests.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use lazy_static::lazy_static;

/// Coarse universal POS tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Noun,
    Propn,
    Verb,
    Adj,
    Adv,
    Adp,
    Det,
    Pron,
    Num,
    Cconj,
    Punct,
    X,
}

impl PosTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::Noun => "NOUN",
            PosTag::Propn => "PROPN",
            PosTag::Verb => "VERB",
            PosTag::Adj => "ADJ",
            PosTag::Adv => "ADV",
            PosTag::Adp => "ADP",
            PosTag::Det => "DET",
            PosTag::Pron => "PRON",
            PosTag::Num => "NUM",
            PosTag::Cconj => "CCONJ",
            PosTag::Punct => "PUNCT",
            PosTag::X => "X",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text, original casing
    pub text: String,
    /// Lowercased base form
    pub lemma: String,
    pub pos: PosTag,
    pub is_punct: bool,
    pub is_stop: bool,
    pub like_num: bool,
    /// Title-case or all-caps word
    pub is_proper: bool,
}

pub trait TokenSource: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an",
        "and", "any", "are", "as", "at", "be", "because", "been", "before", "being",
        "below", "between", "both", "but", "by", "can", "could", "did", "do", "does",
        "doing", "down", "during", "each", "few", "for", "from", "further", "get",
        "give", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
        "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
        "me", "more", "most", "my", "no", "nor", "not", "now", "of", "off", "on",
        "once", "only", "or", "other", "our", "ours", "out", "over", "own", "please",
        "same", "she", "should", "show", "so", "some", "such", "than", "that", "the",
        "their", "theirs", "them", "then", "there", "these", "they", "this", "those",
        "through", "to", "too", "top", "under", "until", "up", "us", "very", "was",
        "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
        "will", "with", "would", "you", "your", "yours",
    ]
    .into_iter()
    .collect();

    static ref IRREGULAR_LEMMAS: HashMap<&'static str, &'static str> = [
        ("people", "person"),
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("data", "data"),
        ("is", "be"),
        ("are", "be"),
        ("was", "be"),
        ("were", "be"),
        ("been", "be"),
        ("has", "have"),
        ("had", "have"),
        ("having", "have"),
        ("does", "do"),
        ("did", "do"),
        ("living", "live"),
        ("lives", "live"),
        ("lost", "lose"),
        ("sent", "send"),
        ("held", "hold"),
        ("its", "its"),
        ("this", "this"),
        ("status", "status"),
        ("statuses", "status"),
        ("us", "us"),
        ("vs", "vs"),
        ("less", "less"),
        ("across", "across"),
    ]
    .into_iter()
    .collect();

    static ref ADPOSITIONS: HashSet<&'static str> = [
        "in", "at", "on", "with", "for", "from", "to", "of", "by", "over", "under",
        "between", "into", "per", "across", "above", "below", "via", "than",
    ]
    .into_iter()
    .collect();

    static ref DETERMINERS: HashSet<&'static str> = [
        "the", "a", "an", "all", "each", "every", "some", "any", "this", "that", "these",
        "those", "both",
    ]
    .into_iter()
    .collect();

    static ref PRONOUNS: HashSet<&'static str> = [
        "i", "me", "my", "we", "our", "you", "your", "they", "them", "their", "it", "its",
        "who", "which", "what", "he", "she", "his", "her",
    ]
    .into_iter()
    .collect();

    static ref CONJUNCTIONS: HashSet<&'static str> = ["and", "or", "but", "nor"]
        .into_iter()
        .collect();

    static ref VERBS: HashSet<&'static str> = [
        "list", "show", "display", "get", "retrieve", "find", "fetch", "count", "give",
        "compare", "sort", "order", "arrange", "send", "receive", "initiate", "process",
        "lose", "be", "have", "do", "live", "hold", "use", "serve", "filter",
    ]
    .into_iter()
    .collect();

    static ref ADVERBS: HashSet<&'static str> =
        ["how", "most", "more", "less", "only", "not", "very"]
            .into_iter()
            .collect();

    static ref ADJECTIVES: HashSet<&'static str> = [
        "multiple", "foreign", "international", "highest", "lowest", "different",
        "total", "greater", "equal", "pending", "successful", "top",
    ]
    .into_iter()
    .collect();
}

/// Stem endings that lost a trailing "e" before "-ed"/"-ing"
const E_RESTORING_ENDINGS: &[&str] = &[
    "v", "at", "et", "iz", "us", "ac", "ag", "ir", "ur", "uc", "id", "os", "as", "am", "ng",
];

/// Rule-based tokenizer with a suffix-stripping lemmatizer
#[derive(Debug, Clone, Default)]
pub struct RuleTokenizer;

impl RuleTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn split(text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut pieces = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if !c.is_alphanumeric() {
                pieces.push(c.to_string());
                i += 1;
                continue;
            }

            let start = i;
            let numeric_start = c.is_ascii_digit();
            i += 1;
            while i < chars.len() {
                let ch = chars[i];
                let next_alnum = chars.get(i + 1).map_or(false, |n| n.is_alphanumeric());
                let next_digit = chars.get(i + 1).map_or(false, |n| n.is_ascii_digit());
                if ch.is_alphanumeric() {
                    i += 1;
                } else if (ch == ',' || ch == '.') && numeric_start && next_digit {
                    // 200,000 and 3.5 stay whole
                    i += 1;
                } else if (ch == '-' || ch == '\'') && !numeric_start && next_alnum {
                    i += 1;
                } else {
                    break;
                }
            }
            pieces.push(chars[start..i].iter().collect());
        }

        pieces
    }

    pub fn lemmatize(word: &str) -> String {
        let lower = word.to_lowercase();
        if let Some(lemma) = IRREGULAR_LEMMAS.get(lower.as_str()) {
            return lemma.to_string();
        }
        if !lower.chars().all(|c| c.is_alphabetic()) || lower.chars().count() <= 3 {
            return lower;
        }

        if let Some(stem) = lower.strip_suffix("ies") {
            if stem.len() >= 2 {
                return format!("{}y", stem);
            }
        }
        if lower.ends_with("sses")
            || lower.ends_with("xes")
            || lower.ends_with("ches")
            || lower.ends_with("shes")
        {
            return lower[..lower.len() - 2].to_string();
        }
        if lower.ends_with('s')
            && !lower.ends_with("ss")
            && !lower.ends_with("us")
            && !lower.ends_with("is")
        {
            return lower[..lower.len() - 1].to_string();
        }
        if let Some(stem) = lower.strip_suffix("ing") {
            if stem.len() >= 3 {
                return restore_stem(stem);
            }
        }
        if let Some(stem) = lower.strip_suffix("ed") {
            if stem.len() >= 2 && lower.len() > 4 {
                return restore_stem(stem);
            }
        }

        lower
    }

    fn pos_for(
        lower: &str,
        lemma: &str,
        index: usize,
        like_num: bool,
        is_punct: bool,
        is_proper: bool,
    ) -> PosTag {
        if is_punct {
            PosTag::Punct
        } else if like_num {
            PosTag::Num
        } else if ADPOSITIONS.contains(lower) {
            PosTag::Adp
        } else if DETERMINERS.contains(lower) {
            PosTag::Det
        } else if PRONOUNS.contains(lower) {
            PosTag::Pron
        } else if CONJUNCTIONS.contains(lower) {
            PosTag::Cconj
        } else if is_proper && index > 0 {
            PosTag::Propn
        } else if VERBS.contains(lemma) || lower.ends_with("ed") {
            PosTag::Verb
        } else if ADVERBS.contains(lower) {
            PosTag::Adv
        } else if ADJECTIVES.contains(lower) {
            PosTag::Adj
        } else if lower.chars().any(|c| c.is_alphabetic()) {
            PosTag::Noun
        } else {
            PosTag::X
        }
    }
}

fn restore_stem(stem: &str) -> String {
    let mut tail = stem.char_indices().rev();
    if let (Some((last_at, last)), Some((_, before))) = (tail.next(), tail.next()) {
        // "running" -> "run", but "calling" stays "call"
        if last == before && last.is_ascii_alphabetic() && !"lszaeiou".contains(last) {
            return stem[..last_at].to_string();
        }
    }
    if E_RESTORING_ENDINGS.iter().any(|e| stem.ends_with(e)) {
        return format!("{}e", stem);
    }
    stem.to_string()
}

fn looks_numeric(text: &str) -> bool {
    text.chars().next().map_or(false, |c| c.is_ascii_digit())
        && text.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn looks_proper(text: &str) -> bool {
    let mut chars = text.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_alphabetic() || !first.is_uppercase() {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    let title_case = rest.iter().all(|c| !c.is_alphabetic() || c.is_lowercase());
    let all_caps = !rest.is_empty() && rest.iter().all(|c| !c.is_alphabetic() || c.is_uppercase());
    title_case || all_caps
}

impl TokenSource for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        Self::split(text)
            .into_iter()
            .enumerate()
            .map(|(index, piece)| {
                let lower = piece.to_lowercase();
                let is_punct = !piece.chars().any(|c| c.is_alphanumeric());
                let like_num = looks_numeric(&piece);
                let is_proper = !is_punct && looks_proper(&piece);
                let lemma = if is_punct || like_num {
                    lower.clone()
                } else {
                    Self::lemmatize(&piece)
                };
                let pos = Self::pos_for(&lower, &lemma, index, like_num, is_punct, is_proper);
                Token {
                    is_stop: STOPWORDS.contains(lower.as_str()),
                    text: piece,
                    lemma,
                    pos,
                    is_punct,
                    like_num,
                    is_proper,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_split_keeps_numbers_and_hyphenated_words() {
        let tokens =
            RuleTokenizer::new().tokenize("Show cross-border transfers over 200,000 (5%)?");
        assert_eq!(
            texts(&tokens),
            vec!["Show", "cross-border", "transfers", "over", "200,000", "(", "5", "%", ")", "?"]
        );
        assert!(tokens[4].like_num);
        assert!(tokens[5].is_punct);
        assert_eq!(tokens[5].pos, PosTag::Punct);
    }

    #[test]
    fn test_lemmatize() {
        assert_eq!(RuleTokenizer::lemmatize("customers"), "customer");
        assert_eq!(RuleTokenizer::lemmatize("accounts"), "account");
        assert_eq!(RuleTokenizer::lemmatize("currencies"), "currency");
        assert_eq!(RuleTokenizer::lemmatize("initiated"), "initiate");
        assert_eq!(RuleTokenizer::lemmatize("processed"), "process");
        assert_eq!(RuleTokenizer::lemmatize("processing"), "process");
        assert_eq!(RuleTokenizer::lemmatize("completed"), "complete");
        assert_eq!(RuleTokenizer::lemmatize("failed"), "fail");
        assert_eq!(RuleTokenizer::lemmatize("People"), "person");
        assert_eq!(RuleTokenizer::lemmatize("status"), "status");
        assert_eq!(RuleTokenizer::lemmatize("India"), "india");
        assert_eq!(RuleTokenizer::lemmatize("running"), "run");
        assert_eq!(RuleTokenizer::lemmatize("calling"), "call");
    }

    #[test]
    fn test_lemmatize_non_ascii_words() {
        // last two characters share their final UTF-8 bytes
        assert_eq!(RuleTokenizer::lemmatize("ぁぁing"), "ぁぁ");
        assert_eq!(RuleTokenizer::lemmatize("ぁing"), "ぁ");
        assert_eq!(RuleTokenizer::lemmatize("añadido"), "añadido");
        let tokens = RuleTokenizer::new().tokenize("Show ぁing customers ぁぁed");
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn test_flags() {
        let tokens = RuleTokenizer::new().tokenize("customers at Axis Bank in the UK");
        let axis = &tokens[2];
        assert!(axis.is_proper);
        assert_eq!(axis.pos, PosTag::Propn);
        let uk = &tokens[6];
        assert!(uk.is_proper);
        let the = &tokens[5];
        assert!(the.is_stop);
        assert_eq!(the.pos, PosTag::Det);
        assert!(!tokens[0].is_proper);
    }
}
