//! BibTeX parsing and lookup for citation support.
//!
//! The parser follows a small explicit grammar instead of pattern matching:
//!
//! ```text
//! file   := (junk | block)*
//! block  := '@' ident ws* ('{' body '}' | '(' body ')')
//! body   := key ws* ',' field (',' field)* ','?
//! field  := ident ws* '=' ws* value ('#' value)*
//! value  := '{' balanced '}' | '"' quoted '"' | number | macro
//! ```
//!
//! `@comment` and `@preamble` blocks are skipped, `@string` blocks define
//! macros usable as bare values. A malformed entry is dropped and parsing
//! resumes at the next `@`.

use std::{
    collections::{BTreeMap, HashMap},
    fs, mem,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::models::Diagnostic;

/// One parsed bibliography record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    /// Lowercased entry type (`article`, `inproceedings`, ...)
    pub entry_type: String,
    fields: BTreeMap<String, String>,
}

impl BibEntry {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entry_type: entry_type.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Raw field value as written (braces preserved), by case-insensitive name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn title(&self) -> Option<String> {
        self.field("title").map(clean_value).filter(|t| !t.is_empty())
    }

    /// `year`, or the leading year of a `date` field.
    pub fn year(&self) -> Option<String> {
        if let Some(year) = self.field("year").map(clean_value) {
            if !year.is_empty() {
                return Some(year);
            }
        }
        let date = clean_value(self.field("date")?);
        let year: String = date.chars().take_while(|c| c.is_ascii_digit()).collect();
        (year.len() == 4).then_some(year)
    }

    /// Author names in order, braces stripped. `others` counts as a name.
    pub fn authors(&self) -> Vec<String> {
        self.field("author")
            .map(split_names)
            .unwrap_or_default()
            .iter()
            .map(|name| clean_value(name))
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Family name of the first author.
    pub fn first_author_family(&self) -> Option<String> {
        let names = split_names(self.field("author")?);
        let first = names.first()?;
        let family = family_name(first);
        (!family.is_empty()).then_some(family)
    }

    /// `Family` for one author, `Family et al.` for several.
    pub fn author_display(&self) -> Option<String> {
        let family = self.first_author_family()?;
        if self.authors().len() > 1 {
            Some(format!("{} et al.", family))
        } else {
            Some(family)
        }
    }
}

/// Result of parsing one BibTeX source.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub entries: Vec<BibEntry>,
    /// Blocks that opened like an entry but could not be parsed
    pub skipped: usize,
}

/// Parse BibTeX text into entries, dropping malformed ones.
pub fn parse_bibtex(source: &str) -> ParseOutcome {
    BibParser::new(source).run()
}

enum Skip {
    /// An `@` that does not start a block (e.g. inside an email address)
    NotABlock,
    Malformed(&'static str),
}

struct BibParser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    strings: HashMap<String, String>,
}

impl<'a> BibParser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            strings: HashMap::new(),
        }
    }

    fn run(mut self) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        while let Some(offset) = self.src[self.pos..].find('@') {
            let at = self.pos + offset;
            self.pos = at + 1;
            match self.block() {
                Ok(Some(entry)) => outcome.entries.push(entry),
                Ok(None) => {}
                Err(Skip::NotABlock) => self.pos = at + 1,
                Err(Skip::Malformed(reason)) => {
                    debug!(offset = at, "skipping malformed bibliography entry: {}", reason);
                    outcome.skipped += 1;
                    self.pos = at + 1;
                }
            }
        }

        outcome
    }

    fn block(&mut self) -> Result<Option<BibEntry>, Skip> {
        let kind = self.ident().to_ascii_lowercase();
        if kind.is_empty() {
            return Err(Skip::NotABlock);
        }
        self.skip_ws();
        let close = match self.peek() {
            Some(b'{') => b'}',
            Some(b'(') => b')',
            _ => return Err(Skip::NotABlock),
        };
        self.pos += 1;

        match kind.as_str() {
            "comment" | "preamble" => {
                self.skip_balanced(close)?;
                Ok(None)
            }
            "string" => {
                self.string_definition(close)?;
                Ok(None)
            }
            _ => self.entry(kind, close).map(Some),
        }
    }

    fn entry(&mut self, entry_type: String, close: u8) -> Result<BibEntry, Skip> {
        self.skip_ws();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b',' || b == close || b == b'{' || b == b'}' || b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        let key = self.src[start..self.pos].to_string();
        if key.is_empty() {
            return Err(Skip::Malformed("missing key"));
        }

        let mut entry = BibEntry::new(key, entry_type);
        self.skip_ws();
        match self.bump() {
            Some(b',') => {}
            Some(b) if b == close => return Ok(entry),
            _ => return Err(Skip::Malformed("expected ',' after key")),
        }

        loop {
            self.skip_ws();
            match self.peek() {
                Some(b) if b == close => {
                    self.pos += 1;
                    return Ok(entry);
                }
                None => return Err(Skip::Malformed("unterminated entry")),
                _ => {}
            }

            let name = self.ident().to_ascii_lowercase();
            if name.is_empty() {
                return Err(Skip::Malformed("expected field name"));
            }
            self.skip_ws();
            if self.bump() != Some(b'=') {
                return Err(Skip::Malformed("expected '=' after field name"));
            }
            let value = self.value()?;
            entry.fields.insert(name, value);

            self.skip_ws();
            match self.bump() {
                Some(b',') => {}
                Some(b) if b == close => return Ok(entry),
                _ => return Err(Skip::Malformed("expected ',' between fields")),
            }
        }
    }

    fn string_definition(&mut self, close: u8) -> Result<(), Skip> {
        self.skip_ws();
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(Skip::Malformed("missing @string name"));
        }
        self.skip_ws();
        if self.bump() != Some(b'=') {
            return Err(Skip::Malformed("expected '=' in @string"));
        }
        let value = self.value()?;
        self.skip_ws();
        if self.bump() != Some(close) {
            return Err(Skip::Malformed("unterminated @string"));
        }
        self.strings.insert(name, value);
        Ok(())
    }

    /// A value with optional `#` concatenation.
    fn value(&mut self) -> Result<String, Skip> {
        let mut out = String::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'{') => {
                    self.pos += 1;
                    out.push_str(self.delimited(b'}')?);
                }
                Some(b'"') => {
                    self.pos += 1;
                    out.push_str(self.delimited(b'"')?);
                }
                Some(b) if b.is_ascii_alphanumeric() => {
                    let word = self.ident();
                    if word.bytes().all(|b| b.is_ascii_digit()) {
                        out.push_str(word);
                    } else {
                        let expanded = self.strings.get(&word.to_ascii_lowercase());
                        out.push_str(expanded.map(String::as_str).unwrap_or(word));
                    }
                }
                _ => return Err(Skip::Malformed("expected field value")),
            }
            self.skip_ws();
            if self.peek() == Some(b'#') {
                self.pos += 1;
                continue;
            }
            return Ok(out);
        }
    }

    /// Text up to `end` at brace depth zero; the cursor sits after the opener.
    fn delimited(&mut self, end: u8) -> Result<&'a str, Skip> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.bump() {
            match b {
                b'\\' => {
                    self.pos += 1;
                }
                b'{' => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                _ if b == end && depth == 0 => return Ok(&self.src[start..self.pos - 1]),
                b'}' => return Err(Skip::Malformed("unbalanced braces")),
                _ => {}
            }
        }
        Err(Skip::Malformed("unterminated value"))
    }

    fn skip_balanced(&mut self, close: u8) -> Result<(), Skip> {
        let open = if close == b')' { b'(' } else { b'{' };
        let mut depth = 1usize;
        while let Some(b) = self.bump() {
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(Skip::Malformed("unterminated block"))
    }

    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b':' | b'.' | b'+' | b'/') {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }
}

/// Displayable text: braces removed, TeX escapes for reserved characters
/// resolved, `~` as a space, whitespace collapsed.
pub fn clean_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' | '}' => {}
            '~' => out.push(' '),
            '\\' => match chars.peek() {
                Some(&next) if "&%$#_{}".contains(next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-separated words, keeping brace groups intact.
fn top_level_words(raw: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    for (i, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                words.push(&raw[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push(&raw[s..]);
    }
    words
}

/// Split an `author` field on top-level ` and `.
fn split_names(raw: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in top_level_words(raw) {
        if word.eq_ignore_ascii_case("and") {
            if !current.is_empty() {
                names.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        names.push(current.join(" "));
    }
    names
}

/// Family name of one raw name: `Last, First` gives `Last`, `First Last`
/// gives `Last`, and a fully braced name is kept whole.
fn family_name(raw: &str) -> String {
    let words = top_level_words(raw);
    if words.len() == 1 {
        return clean_value(words[0]);
    }
    if let Some(comma) = top_level_comma(raw) {
        return clean_value(&raw[..comma]);
    }
    words.last().map(|w| clean_value(w)).unwrap_or_default()
}

fn top_level_comma(raw: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in raw.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Cached bibliography loader to avoid re-reading the same `.bib` files.
#[derive(Debug, Default)]
pub struct BibliographyStore {
    cache: HashMap<PathBuf, Vec<BibEntry>>,
    diagnostics: Vec<Diagnostic>,
}

impl BibliographyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the given paths are loaded into the cache.
    pub fn preload_paths(&mut self, paths: &[PathBuf]) {
        for path in paths {
            self.ensure_loaded(path);
        }
    }

    /// Build a merged bibliography for the provided list of paths.
    ///
    /// Later files win on key conflicts.
    pub fn collect(&mut self, paths: &[PathBuf]) -> Bibliography {
        self.preload_paths(paths);

        let mut bibliography = Bibliography::default();
        for path in paths {
            if let Some(entries) = self.cache.get(path) {
                for entry in entries {
                    bibliography.insert(entry.clone());
                }
            }
        }
        bibliography
    }

    fn ensure_loaded(&mut self, path: &Path) {
        if self.cache.contains_key(path) {
            return;
        }

        let entries = match fs::read_to_string(path) {
            Ok(contents) => {
                let outcome = parse_bibtex(&contents);
                if outcome.skipped > 0 {
                    debug!(
                        "Skipped {} malformed entries in {:?}",
                        outcome.skipped, path
                    );
                }
                debug!("Loaded {} entries from {:?}", outcome.entries.len(), path);
                outcome.entries
            }
            Err(err) => {
                warn!("Failed to read bibliography {:?}: {}", path, err);
                self.diagnostics.push(
                    Diagnostic::warning(
                        "bibliography.load_failed",
                        format!("Failed to read bibliography: {}", err),
                    )
                    .with_source(path.to_string_lossy()),
                );
                Vec::new()
            }
        };
        self.cache.insert(path.to_path_buf(), entries);
    }

    /// Take accumulated diagnostics (clearing the internal buffer).
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }
}

/// Entries available to one page, keyed by citation key.
#[derive(Debug, Clone, Default)]
pub struct Bibliography {
    entries: HashMap<String, BibEntry>,
}

impl Bibliography {
    pub fn from_entries(entries: impl IntoIterator<Item = BibEntry>) -> Self {
        let mut bibliography = Self::default();
        for entry in entries {
            bibliography.insert(entry);
        }
        bibliography
    }

    pub fn insert(&mut self, entry: BibEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }

    /// Lookup a bibliography entry by key.
    pub fn get(&self, key: &str) -> Option<&BibEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
% A comment line outside any entry
@article{vaswani2017attention,
  title   = {Attention Is All You Need},
  author  = {Vaswani, Ashish and Shazeer, Noam and Parmar, Niki},
  journal = {Advances in Neural Information Processing Systems},
  year    = {2017}
}

@book{knuth1984,
  author = "Donald E. Knuth",
  title = "The {\TeX}book",
  year = 1984,
}
"#;

    #[test]
    fn parses_entries_in_order() {
        let outcome = parse_bibtex(SAMPLE);
        assert_eq!(outcome.skipped, 0);
        let keys: Vec<_> = outcome.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["vaswani2017attention", "knuth1984"]);

        let vaswani = &outcome.entries[0];
        assert_eq!(vaswani.entry_type, "article");
        assert_eq!(vaswani.title().as_deref(), Some("Attention Is All You Need"));
        assert_eq!(vaswani.year().as_deref(), Some("2017"));
        assert_eq!(vaswani.authors().len(), 3);
        assert_eq!(vaswani.author_display().as_deref(), Some("Vaswani et al."));
    }

    #[test]
    fn quoted_values_and_bare_numbers() {
        let outcome = parse_bibtex(SAMPLE);
        let knuth = &outcome.entries[1];
        assert_eq!(knuth.field("title"), Some(r"The {\TeX}book"));
        assert_eq!(knuth.title().as_deref(), Some(r"The \TeXbook"));
        assert_eq!(knuth.year().as_deref(), Some("1984"));
        assert_eq!(knuth.author_display().as_deref(), Some("Knuth"));
    }

    #[test]
    fn field_names_are_case_insensitive() {
        let outcome = parse_bibtex("@Misc{k, TITLE = {Upper}, Year = {2001}}");
        let entry = &outcome.entries[0];
        assert_eq!(entry.entry_type, "misc");
        assert_eq!(entry.field("title"), Some("Upper"));
        assert_eq!(entry.field("YEAR"), Some("2001"));
    }

    #[test]
    fn nested_braces_and_at_signs_inside_values() {
        let src = "@misc{k, note = {Contact {me} at a@b.org}, title = {T}}";
        let outcome = parse_bibtex(src);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(
            outcome.entries[0].field("note"),
            Some("Contact {me} at a@b.org")
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let src = r#"
@article{, title = {No key}}
@article{broken, title {missing equals}}
@article{good, title = {Survivor}, year = {2020}}
@article{unterminated, title = {never closed
"#;
        let outcome = parse_bibtex(src);
        let keys: Vec<_> = outcome.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["good"]);
        assert_eq!(outcome.skipped, 3);
    }

    #[test]
    fn stray_at_signs_are_not_entries() {
        let outcome = parse_bibtex("mail me@example.com\n@misc{k, title={T}}");
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn string_macros_and_concatenation() {
        let src = r#"
@string{neurips = "Advances in Neural Information Processing Systems"}
@comment{ignored {nested} block}
@preamble{"\newcommand{\noop}[1]{}"}
@inproceedings{k,
  booktitle = neurips # { 30},
  month = jan,
}
"#;
        let outcome = parse_bibtex(src);
        assert_eq!(outcome.entries.len(), 1);
        let entry = &outcome.entries[0];
        assert_eq!(
            entry.field("booktitle"),
            Some("Advances in Neural Information Processing Systems 30")
        );
        // Unknown macros keep their name
        assert_eq!(entry.field("month"), Some("jan"));
    }

    #[test]
    fn parenthesized_entries() {
        let outcome = parse_bibtex("@book(k, title = {Parens}, year = 1999)");
        assert_eq!(outcome.entries[0].title().as_deref(), Some("Parens"));
    }

    #[test]
    fn entry_without_fields() {
        let outcome = parse_bibtex("@misc{lonely}");
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].title(), None);
    }

    #[test]
    fn author_family_names() {
        let single = BibEntry::new("a", "misc").with_field("author", "Geoffrey Hinton");
        assert_eq!(single.author_display().as_deref(), Some("Hinton"));

        let comma = BibEntry::new("b", "misc").with_field("author", "LeCun, Yann");
        assert_eq!(comma.author_display().as_deref(), Some("LeCun"));

        let corporate = BibEntry::new("c", "misc")
            .with_field("author", "{Barnes and Noble} and Jane Doe");
        assert_eq!(corporate.authors(), vec!["Barnes and Noble", "Jane Doe"]);
        assert_eq!(
            corporate.author_display().as_deref(),
            Some("Barnes and Noble et al.")
        );

        let others = BibEntry::new("d", "misc").with_field("author", "Olah, Chris and others");
        assert_eq!(others.author_display().as_deref(), Some("Olah et al."));
    }

    #[test]
    fn year_falls_back_to_date() {
        let entry = BibEntry::new("k", "online").with_field("date", "2021-03-04");
        assert_eq!(entry.year().as_deref(), Some("2021"));
        assert_eq!(BibEntry::new("k", "misc").year(), None);
    }

    #[test]
    fn clean_value_handles_tex_escapes() {
        assert_eq!(clean_value(r"Smith \& Sons~Ltd"), "Smith & Sons Ltd");
        assert_eq!(clean_value("{Deep}\n   {Learning}"), "Deep Learning");
    }

    #[test]
    fn store_merges_files_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.bib");
        let second = dir.path().join("b.bib");
        let mut f = fs::File::create(&first).unwrap();
        writeln!(f, "@misc{{k, title = {{First}}}}\n@misc{{only_a, title = {{A}}}}").unwrap();
        fs::write(&second, "@misc{k, title = {Second}}").unwrap();
        let missing = dir.path().join("missing.bib");

        let mut store = BibliographyStore::new();
        let bib = store.collect(&[first, second, missing]);
        assert_eq!(bib.len(), 2);
        assert_eq!(bib.get("k").unwrap().title().as_deref(), Some("Second"));

        let diagnostics = store.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "bibliography.load_failed");
        assert!(store.take_diagnostics().is_empty());
    }
}
