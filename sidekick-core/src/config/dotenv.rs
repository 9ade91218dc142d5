//! `.env` file parser
//!
//! Rules:
//! - blank lines and lines starting with `#` are ignored
//! - an optional `export ` prefix is accepted
//! - `KEY=VALUE`, whitespace around key and value is trimmed
//! - values in matching single or double quotes are unquoted; double quotes
//!   process `\n`, `\t`, `\"` and `\\`
//! - unquoted values drop a trailing ` #comment`
//! - a line ending in `\` continues on the next line (unquoted values only)

use std::path::Path;

use crate::error::SidekickError;

/// One parsed `KEY=VALUE` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
    /// 1-based line where the entry starts
    pub line: usize,
}

pub struct DotenvParser;

impl DotenvParser {
    /// Parse `.env` content.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for an empty key or an unterminated quote.
    pub fn parse(content: &str) -> Result<Vec<EnvEntry>, SidekickError> {
        let mut entries = Vec::new();
        let lines: Vec<&str> = content.lines().collect();
        let mut idx = 0;

        while idx < lines.len() {
            let start = idx;
            let line = lines[idx].trim();
            idx += 1;

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);

            let Some((key, raw_value)) = line.split_once('=') else {
                tracing::debug!(line = start + 1, "Skipping .env line without '='");
                continue;
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(SidekickError::ConfigurationError(format!(
                    "Empty key on line {} of .env file",
                    start + 1
                )));
            }

            let raw_value = raw_value.trim();
            let value = if let Some(quote) = raw_value.chars().next().filter(|c| *c == '"' || *c == '\'') {
                parse_quoted(raw_value, quote).ok_or_else(|| {
                    SidekickError::ConfigurationError(format!(
                        "Unterminated quote for '{key}' on line {}",
                        start + 1
                    ))
                })?
            } else {
                let mut joined = raw_value.to_string();
                while joined.ends_with('\\') && idx < lines.len() {
                    joined.pop();
                    joined.push_str(lines[idx].trim());
                    idx += 1;
                }
                strip_inline_comment(&joined).to_string()
            };

            entries.push(EnvEntry {
                key: key.to_string(),
                value,
                line: start + 1,
            });
        }

        Ok(entries)
    }
}

fn parse_quoted(raw: &str, quote: char) -> Option<String> {
    let body = &raw[quote.len_utf8()..];
    let mut out = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == quote {
            return Some(out);
        }
        if c == '\\' && quote == '"' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => return None,
            }
        } else {
            out.push(c);
        }
    }
    None
}

fn strip_inline_comment(value: &str) -> &str {
    match value.find(" #") {
        Some(pos) => value[..pos].trim_end(),
        None => value,
    }
}

/// Read and parse a `.env` file. A missing file yields no entries.
pub fn load_dotenv_file(path: &Path) -> Result<Vec<EnvEntry>, SidekickError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let entries = DotenvParser::parse(&content)?;
            tracing::debug!(path = %path.display(), count = entries.len(), "Loaded .env file");
            Ok(entries)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No .env file found");
            Ok(Vec::new())
        }
        Err(e) => Err(SidekickError::ConfigurationError(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(content: &str) -> Vec<(String, String)> {
        DotenvParser::parse(content)
            .unwrap()
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect()
    }

    #[test]
    fn test_parse_basic() {
        let content = r"
# comments are ignored
OPENAI_API_KEY=sk-test
ASSISTANT_ID = asst_123
        ";
        assert_eq!(
            pairs(content),
            vec![
                ("OPENAI_API_KEY".into(), "sk-test".into()),
                ("ASSISTANT_ID".into(), "asst_123".into()),
            ]
        );
    }

    #[test]
    fn test_parse_empty_value() {
        assert_eq!(pairs("KEY=\nKEY2=value")[0].1, "");
    }

    #[test]
    fn test_export_prefix_and_inline_comment() {
        assert_eq!(
            pairs("export MODEL=gpt-4o-mini # default model"),
            vec![("MODEL".into(), "gpt-4o-mini".into())]
        );
    }

    #[test]
    fn test_quoted_values() {
        let parsed = pairs("A=\"line one\\nline two\"\nB='raw \\n # kept'\nC=\"say \\\"hi\\\"\"");
        assert_eq!(parsed[0].1, "line one\nline two");
        assert_eq!(parsed[1].1, "raw \\n # kept");
        assert_eq!(parsed[2].1, "say \"hi\"");
    }

    #[test]
    fn test_line_continuation() {
        let parsed = DotenvParser::parse("LONG=abc\\\ndef\nNEXT=1").unwrap();
        assert_eq!(parsed[0].value, "abcdef");
        assert_eq!(parsed[1].key, "NEXT");
        assert_eq!(parsed[1].line, 3);
    }

    #[test]
    fn test_empty_key_is_error() {
        assert!(matches!(
            DotenvParser::parse("=value"),
            Err(SidekickError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert!(DotenvParser::parse("KEY=\"open").is_err());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_dotenv_file(&dir.path().join(".env")).unwrap();
        assert!(entries.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn plain_values_survive_parsing(key in "[A-Z][A-Z0-9_]{0,15}", value in "[a-zA-Z0-9_./:-]{0,30}") {
            let parsed = DotenvParser::parse(&format!("{key}={value}")).unwrap();
            proptest::prop_assert_eq!(parsed.len(), 1);
            proptest::prop_assert_eq!(&parsed[0].key, &key);
            proptest::prop_assert_eq!(&parsed[0].value, &value);
        }
    }
}
