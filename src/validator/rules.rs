//! Fixed keyword sets and forbidden patterns shared by every validation.

use regex::{Regex, RegexBuilder};

/// Statement-type keywords whose presence anywhere makes a query unsafe.
pub const DANGEROUS_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE", "GRANT", "REVOKE",
    "EXECUTE", "EXEC",
];

pub const READ_ONLY_KEYWORDS: &[&str] = &["SELECT", "SHOW", "DESCRIBE", "EXPLAIN", "WITH"];

/// Table mutations and statement chaining.
pub const FORBIDDEN_PATTERNS: &[&str] = &[
    r"DROP\s+TABLE",
    r"DELETE\s+FROM\s+\w+\s+WHERE\s+1\s*=\s*1",
    r"TRUNCATE\s+TABLE",
    r"ALTER\s+TABLE",
    r"CREATE\s+TABLE",
    r"INSERT\s+INTO",
    r"UPDATE\s+\w+\s+SET",
    r";\s*DROP",
    r";\s*DELETE",
    r";\s*TRUNCATE",
    r";\s*ALTER",
    r";\s*CREATE",
    r";\s*INSERT",
    r";\s*UPDATE",
];

#[derive(Debug, Clone)]
pub struct ForbiddenPattern {
    pub source: String,
    pub regex: Regex,
}

/// Compiled once and shared by all validator clones.
#[derive(Debug, Clone)]
pub struct ValidatorRules {
    pub dangerous_keywords: Vec<String>,
    pub read_only_keywords: Vec<String>,
    pub forbidden_patterns: Vec<ForbiddenPattern>,
}

impl ValidatorRules {
    /// Build a rule set; patterns are compiled case-insensitively.
    pub fn new(
        dangerous_keywords: &[&str],
        read_only_keywords: &[&str],
        forbidden_patterns: &[&str],
    ) -> Result<Self, regex::Error> {
        let forbidden_patterns = forbidden_patterns
            .iter()
            .map(|source| {
                Ok(ForbiddenPattern {
                    source: source.to_string(),
                    regex: RegexBuilder::new(source).case_insensitive(true).build()?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            dangerous_keywords: dangerous_keywords.iter().map(|k| k.to_uppercase()).collect(),
            read_only_keywords: read_only_keywords.iter().map(|k| k.to_uppercase()).collect(),
            forbidden_patterns,
        })
    }

    /// Denylisted keywords found in `sql_upper`, in declaration order.
    pub fn dangerous_in<'a>(&'a self, sql_upper: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.dangerous_keywords
            .iter()
            .filter(move |k| sql_upper.contains(k.as_str()))
            .map(String::as_str)
    }
}

impl Default for ValidatorRules {
    fn default() -> Self {
        Self::new(DANGEROUS_KEYWORDS, READ_ONLY_KEYWORDS, FORBIDDEN_PATTERNS)
            .expect("built-in forbidden patterns compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = ValidatorRules::default();
        assert_eq!(rules.dangerous_keywords.len(), 11);
        assert_eq!(rules.forbidden_patterns.len(), 14);
        assert!(rules.forbidden_patterns[0].regex.is_match("drop   table x"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(ValidatorRules::new(&["DROP"], &["SELECT"], &["(unclosed"]).is_err());
    }

    #[test]
    fn test_dangerous_in_keeps_declared_order() {
        let rules = ValidatorRules::default();
        let found: Vec<&str> = rules.dangerous_in("UPDATE T SET X = 1; DROP TABLE T").collect();
        assert_eq!(found, vec!["DROP", "UPDATE"]);
    }
}
