//! Sanitizer blacklist files.
//!
//! Each non-blank, non-comment line has the form `section:pattern[=category]`,
//! e.g. `fun:*_dangerous` or `src:third_party/*=init`. `*` matches any run of
//! characters; other regular expression syntax is accepted as-is.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecialCaseListError {
    #[error("can't open file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error parsing file '{}': malformed line {line}: '{text}'", .path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error(
        "error parsing file '{}': malformed regex in line {line}: '{pattern}': {message}",
        .path.display()
    )]
    MalformedRegex {
        path: PathBuf,
        line: usize,
        pattern: String,
        message: String,
    },
}

#[derive(Debug, Default)]
struct Entry {
    literals: Vec<String>,
    patterns: Vec<Regex>,
}

impl Entry {
    fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }
}

#[derive(Debug, Default)]
pub struct SpecialCaseList {
    /// section -> category -> entry
    sections: FxHashMap<String, FxHashMap<String, Entry>>,
}

impl SpecialCaseList {
    /// Loads and merges all `paths`, stopping at the first problem.
    pub fn create<P: AsRef<Path>>(paths: &[P]) -> Result<Self, SpecialCaseListError> {
        let mut list = Self::default();
        for path in paths {
            let path = path.as_ref();
            let contents = fs::read_to_string(path).map_err(|source| SpecialCaseListError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            list.parse(path, &contents)?;
        }
        Ok(list)
    }

    /// Parses the contents of one file into `self`. `path` is only used to
    /// label errors.
    pub fn parse(&mut self, path: &Path, contents: &str) -> Result<(), SpecialCaseListError> {
        for (index, line) in contents.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (section, rest) = match line.split_once(':') {
                Some((section, rest)) if !rest.is_empty() => (section, rest),
                _ => {
                    return Err(SpecialCaseListError::MalformedLine {
                        path: path.to_path_buf(),
                        line: line_no,
                        text: line.split(':').next().unwrap_or(line).to_string(),
                    });
                }
            };
            let (pattern, category) = rest.split_once('=').unwrap_or((rest, ""));

            let entry = self
                .sections
                .entry(section.to_string())
                .or_default()
                .entry(category.to_string())
                .or_default();

            if is_literal(pattern) {
                entry.literals.push(pattern.to_string());
                continue;
            }

            let anchored = format!("^(?:{})$", pattern.replace('*', ".*"));
            let re = Regex::new(&anchored).map_err(|err| SpecialCaseListError::MalformedRegex {
                path: path.to_path_buf(),
                line: line_no,
                pattern: rest.to_string(),
                message: err.to_string(),
            })?;
            entry.patterns.push(re);
        }

        Ok(())
    }

    /// Number of patterns in `section`, over all categories.
    pub fn section_len(&self, section: &str) -> usize {
        self.sections
            .get(section)
            .map_or(0, |categories| categories.values().map(Entry::len).sum())
    }

    /// Total number of patterns.
    pub fn len(&self) -> usize {
        self.sections
            .keys()
            .map(|section| self.section_len(section))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_literal(pattern: &str) -> bool {
    !pattern.contains(|c: char| "()^$|*+?.[]\\{}".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<SpecialCaseList, SpecialCaseListError> {
        let mut list = SpecialCaseList::default();
        list.parse(Path::new("list.txt"), contents)?;
        Ok(list)
    }

    #[test]
    fn counts_literals_and_globs() {
        let list = parse(
            "# comment\n\
             \n\
             fun:main\n\
             fun:*_dangerous\n\
             src:third_party/*=init\n",
        )
        .unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.section_len("fun"), 2);
        assert_eq!(list.section_len("src"), 1);
        assert_eq!(list.section_len("global"), 0);
        assert!(!list.is_empty());
        assert!(SpecialCaseList::default().is_empty());
    }

    #[test]
    fn malformed_line() {
        let err = parse("fun:ok\nnot a rule\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing file 'list.txt': malformed line 2: 'not a rule'"
        );
    }

    #[test]
    fn malformed_regex() {
        let err = parse("fun:foo(\n").unwrap_err();
        assert!(matches!(
            err,
            SpecialCaseListError::MalformedRegex { line: 1, ref pattern, .. } if pattern == "foo("
        ));
        assert!(err
            .to_string()
            .starts_with("error parsing file 'list.txt': malformed regex in line 1: 'foo(': "));
    }

    #[test]
    fn missing_file() {
        let err = SpecialCaseList::create(&["/definitely/not/here.txt"]).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("can't open file '/definitely/not/here.txt': "));
    }
}
