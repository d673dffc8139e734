use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ClassifyError, Result};

/// Class names indexed positionally by class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = lines
            .into_iter()
            .map(|line| strip_index_token(line.as_ref().trim()).to_string())
            .collect();
        Self { labels }
    }

    pub fn get(&self, class: usize) -> Option<&str> {
        self.labels.get(class).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn load_class_mapping(file_path: impl AsRef<Path>) -> Result<LabelMap> {
    let path = file_path.as_ref();
    let file = File::open(path).map_err(|e| ClassifyError::io(path, e))?;
    let reader = BufReader::new(file);

    let lines = reader
        .lines()
        .collect::<std::io::Result<Vec<String>>>()
        .map_err(|e| ClassifyError::io(path, e))?;

    Ok(LabelMap::from_lines(lines))
}

/// Drops a leading class index (`"3 "`, `"3:\t"`, `"n01440764 "`) from a label line.
fn strip_index_token(line: &str) -> &str {
    match line.split_once(char::is_whitespace) {
        Some((head, rest)) if is_index_token(head) => rest.trim_start(),
        _ if is_index_token(line) => "",
        _ => line,
    }
}

/// Digits, optionally after one ASCII letter (synset ids) and before a `:`.
fn is_index_token(token: &str) -> bool {
    let token = token.strip_suffix(':').unwrap_or(token);
    let digits = match token.as_bytes().first() {
        Some(b) if b.is_ascii_alphabetic() => &token[1..],
        _ => token,
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_index() {
        let map = LabelMap::from_lines(["0 background", "1 golden retriever", "2: tabby cat"]);
        assert_eq!(map.get(0), Some("background"));
        assert_eq!(map.get(1), Some("golden retriever"));
        assert_eq!(map.get(2), Some("tabby cat"));

        let tabbed = LabelMap::from_lines(["0\tbackground", "1\tdaisy", "2:\t dandelion"]);
        assert_eq!(tabbed.get(0), Some("background"));
        assert_eq!(tabbed.get(1), Some("daisy"));
        assert_eq!(tabbed.get(2), Some("dandelion"));
    }

    #[test]
    fn strips_synset_ids() {
        let map = LabelMap::from_lines(["n01440764 tench, Tinca tinca", "n01443537\tgoldfish"]);
        assert_eq!(map.get(0), Some("tench, Tinca tinca"));
        assert_eq!(map.get(1), Some("goldfish"));
    }

    #[test]
    fn keeps_lines_without_index() {
        let map = LabelMap::from_lines(["tench", "great white shark", "tiger shark", "x 1"]);
        assert_eq!(map.get(0), Some("tench"));
        assert_eq!(map.get(1), Some("great white shark"));
        assert_eq!(map.get(3), Some("x 1"));
    }

    #[test]
    fn trims_and_indexes_positionally() {
        let map = LabelMap::from_lines(["  0 a  \r", "1 b", "", "3 d"]);
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(0), Some("a"));
        assert_eq!(map.get(2), Some(""));
        assert_eq!(map.get(3), Some("d"));
        assert_eq!(map.get(4), None);
    }

    #[test]
    fn bare_index_line_is_empty_label() {
        let map = LabelMap::from_lines(["7"]);
        assert_eq!(map.get(0), Some(""));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_class_mapping("/definitely/not/here/labels.txt").unwrap_err();
        assert!(err.to_string().contains("labels.txt"));
    }
}
