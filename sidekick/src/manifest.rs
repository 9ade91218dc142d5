//! Dependency manifest reader.
//!
//! A manifest lists one package per line as `name[>=X.Y.Z] [# purpose]`. Lines starting
//! with `#` are comments. It carries configuration metadata only.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use sidekick_core::error::SidekickError;

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("valid regex"));
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(?:\.[0-9A-Za-z]+)*$").expect("valid regex"));

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '~'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    /// Lower bound from a `>=` constraint
    pub min_version: Option<String>,
    /// Trailing comment text
    pub purpose: Option<String>,
    /// 1-based source line
    pub line: usize,
}

impl Requirement {
    pub fn constraint(&self) -> String {
        match &self.min_version {
            Some(v) => format!(">= {v}"),
            None => "any".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub requirements: Vec<Requirement>,
}

/// Package names compare case-insensitively with `-` and `_` equivalent.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}

fn line_error(line: usize, message: impl std::fmt::Display) -> SidekickError {
    SidekickError::InvalidInput(format!("manifest line {line}: {message}"))
}

fn parse_line(raw: &str, line: usize) -> Result<Option<Requirement>, SidekickError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (spec, purpose) = match trimmed.split_once('#') {
        Some((spec, comment)) => (spec.trim(), Some(comment.trim()).filter(|c| !c.is_empty())),
        None => (trimmed, None),
    };

    let (name, constraint) = match spec.find(OPERATOR_CHARS) {
        Some(idx) => (spec[..idx].trim(), Some(spec[idx..].trim())),
        None => (spec, None),
    };

    if name.is_empty() {
        return Err(line_error(line, "missing package name"));
    }
    if !NAME_RE.is_match(name) {
        return Err(line_error(line, format!("invalid package name '{name}'")));
    }

    let min_version = match constraint {
        None => None,
        Some(c) => {
            let Some(version) = c.strip_prefix(">=") else {
                return Err(line_error(
                    line,
                    format!("unsupported constraint '{c}' (only '>=' is allowed)"),
                ));
            };
            let version = version.trim();
            if !VERSION_RE.is_match(version) {
                return Err(line_error(line, format!("invalid version '{version}'")));
            }
            Some(version.to_string())
        }
    };

    Ok(Some(Requirement {
        name: name.to_string(),
        min_version,
        purpose: purpose.map(str::to_string),
        line,
    }))
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self, SidekickError> {
        let mut requirements: Vec<Requirement> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let Some(requirement) = parse_line(raw, index + 1)? else {
                continue;
            };
            let key = normalize_name(&requirement.name);
            if let Some(first) = requirements
                .iter()
                .find(|r| normalize_name(&r.name) == key)
            {
                return Err(line_error(
                    requirement.line,
                    format!(
                        "duplicate package '{}' (first declared on line {})",
                        requirement.name, first.line
                    ),
                ));
            }
            requirements.push(requirement);
        }

        Ok(Self { requirements })
    }

    pub fn load(path: &Path) -> Result<Self, SidekickError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SidekickError::IoError(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        let key = normalize_name(name);
        self.requirements
            .iter()
            .find(|r| normalize_name(&r.name) == key)
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Aligned `name  constraint  purpose` table.
    pub fn render_table(&self) -> String {
        let name_width = self
            .requirements
            .iter()
            .map(|r| r.name.len())
            .chain(std::iter::once("PACKAGE".len()))
            .max()
            .unwrap_or(0);
        let constraint_width = self
            .requirements
            .iter()
            .map(|r| r.constraint().len())
            .chain(std::iter::once("VERSION".len()))
            .max()
            .unwrap_or(0);

        let mut out = format!(
            "{:<name_width$}  {:<constraint_width$}  PURPOSE\n",
            "PACKAGE", "VERSION"
        );
        for r in &self.requirements {
            let row = format!(
                "{:<name_width$}  {:<constraint_width$}  {}",
                r.name,
                r.constraint(),
                r.purpose.as_deref().unwrap_or("-")
            );
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Core dependencies
openai>=1.12.0  # API client

python-dotenv>=1.0.0  # Environment variables
colorama>=0.4.6  # Terminal colors
tenacity>=8.2.3  # Retry logic
typing_extensions  # Type hints
";

    #[test]
    fn parses_names_versions_and_purposes_in_order() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.len(), 5);
        let first = &manifest.requirements[0];
        assert_eq!(first.name, "openai");
        assert_eq!(first.min_version.as_deref(), Some("1.12.0"));
        assert_eq!(first.purpose.as_deref(), Some("API client"));
        assert_eq!(first.line, 2);

        let last = &manifest.requirements[4];
        assert_eq!(last.name, "typing_extensions");
        assert_eq!(last.min_version, None);
        assert_eq!(last.line, 7);
    }

    #[test]
    fn lookup_ignores_case_and_separator() {
        let manifest = Manifest::parse(SAMPLE).unwrap();
        assert_eq!(
            manifest.requirement("Python_Dotenv").unwrap().name,
            "python-dotenv"
        );
        assert!(manifest.requirement("typing-extensions").is_some());
        assert!(manifest.requirement("requests").is_none());
    }

    #[test]
    fn rejects_other_operators_with_line_number() {
        let err = Manifest::parse("openai==1.0.0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: manifest line 1: unsupported constraint '==1.0.0' (only '>=' is allowed)"
        );
        assert!(Manifest::parse("\n\nfoo<2").unwrap_err().to_string().contains("line 3"));
    }

    #[test]
    fn rejects_missing_names_bad_versions_and_duplicates() {
        assert!(
            Manifest::parse(">=1.0")
                .unwrap_err()
                .to_string()
                .contains("missing package name")
        );
        assert!(
            Manifest::parse("openai>=")
                .unwrap_err()
                .to_string()
                .contains("invalid version")
        );
        let err = Manifest::parse("typing_extensions\ntyping-extensions>=4.0").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("first declared on line 1"));
    }

    #[test]
    fn renders_aligned_table() {
        let manifest = Manifest::parse("openai>=1.12.0 # API client\nrich").unwrap();
        assert_eq!(
            manifest.render_table(),
            "PACKAGE  VERSION    PURPOSE\nopenai   >= 1.12.0  API client\nrich     any        -\n"
        );
    }
}
