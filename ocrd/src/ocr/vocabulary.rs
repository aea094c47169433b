//! Caller-supplied vocabulary applied to recognized text.
//!
//! Tesseract only reads user word lists when a handle is initialized, so
//! custom words are applied after recognition instead: a token that matches
//! a custom word case-insensitively, or within one edit for words of four or
//! more characters, is replaced by that word's spelling.

/// Words shorter than this only match exactly (ignoring case).
const FUZZY_MIN_LEN: usize = 4;

pub struct Vocabulary {
    words: Vec<(String, Vec<char>)>,
}

impl Vocabulary {
    /// `None` when there is nothing to apply.
    pub fn new(words: &[String]) -> Option<Self> {
        let words: Vec<(String, Vec<char>)> = words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(|w| (w.to_string(), w.to_lowercase().chars().collect()))
            .collect();

        (!words.is_empty()).then_some(Self { words })
    }

    /// Correct every whitespace-separated token of `text`. Surrounding
    /// punctuation is kept.
    pub fn correct(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|token| self.correct_token(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn correct_token(&self, token: &str) -> String {
        let core = token.trim_matches(|c: char| c.is_ascii_punctuation());
        if core.is_empty() {
            return token.to_string();
        }
        let Some(start) = token.find(core) else {
            return token.to_string();
        };
        let (prefix, rest) = token.split_at(start);
        let suffix = &rest[core.len()..];

        let lowered: Vec<char> = core.to_lowercase().chars().collect();
        let best = self
            .words
            .iter()
            .filter_map(|(word, chars)| {
                let budget = usize::from(chars.len() >= FUZZY_MIN_LEN);
                within_distance(&lowered, chars, budget).map(|d| (d, word))
            })
            .min_by_key(|(d, _)| *d);

        match best {
            Some((_, word)) => format!("{prefix}{word}{suffix}"),
            None => token.to_string(),
        }
    }
}

/// Levenshtein distance between `a` and `b` if it is at most `budget`.
fn within_distance(a: &[char], b: &[char], budget: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > budget {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            row[j + 1] = substitution.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }

    let distance = prev[b.len()];
    (distance <= budget).then_some(distance)
}
