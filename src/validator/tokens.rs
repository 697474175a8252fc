//! Token tree
//!
//! Flat sqlparser tokens regrouped by parentheses, the structure every
//! validation phase walks. Whitespace and comments are dropped.

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer, Word};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlNode {
    Leaf(Token),
    /// Contents of a parenthesised span, without the parentheses.
    Group(Vec<SqlNode>),
}

impl SqlNode {
    /// First leaf token, descending into groups.
    pub fn first_leaf(&self) -> Option<&Token> {
        match self {
            SqlNode::Leaf(token) => Some(token),
            SqlNode::Group(children) => children.iter().find_map(SqlNode::first_leaf),
        }
    }

    pub fn as_word(&self) -> Option<&Word> {
        match self {
            SqlNode::Leaf(Token::Word(word)) => Some(word),
            _ => None,
        }
    }

    pub fn is_token(&self, token: &Token) -> bool {
        matches!(self, SqlNode::Leaf(t) if t == token)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, SqlNode::Group(_))
    }
}

/// One statement: the top-level nodes between terminators.
pub type Statement = Vec<SqlNode>;

/// Tokenize with the PostgreSQL dialect.
pub fn tokenize(sql: &str) -> std::result::Result<Vec<Token>, String> {
    let dialect = PostgreSqlDialect {};
    Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| e.to_string())
}

/// Nest tokens by parentheses. An unmatched `)` stays a leaf and an unclosed
/// `(` is closed at the end of input.
pub fn build_tree(tokens: Vec<Token>) -> Vec<SqlNode> {
    let mut stack: Vec<Vec<SqlNode>> = vec![Vec::new()];

    for token in tokens {
        match token {
            Token::Whitespace(_) | Token::EOF => {}
            Token::LParen => stack.push(Vec::new()),
            Token::RParen if stack.len() > 1 => close_group(&mut stack),
            other => push_node(&mut stack, SqlNode::Leaf(other)),
        }
    }

    while stack.len() > 1 {
        close_group(&mut stack);
    }
    stack.pop().unwrap_or_default()
}

fn push_node(stack: &mut [Vec<SqlNode>], node: SqlNode) {
    if let Some(top) = stack.last_mut() {
        top.push(node);
    }
}

fn close_group(stack: &mut Vec<Vec<SqlNode>>) {
    if let Some(children) = stack.pop() {
        push_node(stack, SqlNode::Group(children));
    }
}

/// Split on top-level `;`, dropping empty statements.
pub fn split_statements(nodes: Vec<SqlNode>) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut current = Vec::new();

    for node in nodes {
        if node.is_token(&Token::SemiColon) {
            if !current.is_empty() {
                statements.push(std::mem::take(&mut current));
            }
        } else {
            current.push(node);
        }
    }
    if !current.is_empty() {
        statements.push(current);
    }
    statements
}

/// Tokenize, nest and split in one step.
pub fn parse_statements(sql: &str) -> std::result::Result<Vec<Statement>, String> {
    Ok(split_statements(build_tree(tokenize(sql)?)))
}

/// Case-insensitive match of an unquoted word.
pub fn is_keyword(word: &Word, keyword: &str) -> bool {
    word.quote_style.is_none() && word.value.eq_ignore_ascii_case(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(nodes: &[SqlNode]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|n| n.as_word().map(|w| w.value.clone()))
            .collect()
    }

    #[test]
    fn test_groups_nest() {
        let statements = parse_statements("SELECT COUNT(*) FROM (SELECT id FROM users) t").unwrap();
        assert_eq!(statements.len(), 1);
        let nodes = &statements[0];
        assert_eq!(words(nodes), vec!["SELECT", "COUNT", "FROM", "t"]);
        let groups: Vec<&SqlNode> = nodes.iter().filter(|n| n.is_group()).collect();
        assert_eq!(groups.len(), 2);
        match groups[1] {
            SqlNode::Group(children) => assert_eq!(words(children), vec!["SELECT", "id", "FROM", "users"]),
            SqlNode::Leaf(_) => panic!("expected group"),
        }
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let nodes = build_tree(tokenize("SELECT ) x").unwrap());
        assert!(nodes.iter().any(|n| n.is_token(&Token::RParen)));

        let nodes = build_tree(tokenize("SELECT (a, (b").unwrap());
        assert_eq!(nodes.len(), 2);
        assert!(nodes[1].is_group());
    }

    #[test]
    fn test_split_statements_skips_empty() {
        let statements = parse_statements(";; SELECT 1; ; SELECT 2;").unwrap();
        assert_eq!(statements.len(), 2);
        assert!(parse_statements("  ;  ").unwrap().is_empty());
        assert!(parse_statements("-- only a comment").unwrap().is_empty());
    }

    #[test]
    fn test_first_leaf_descends_into_groups() {
        let statements = parse_statements("((SELECT 1))").unwrap();
        let first = statements[0][0].first_leaf().unwrap();
        assert!(matches!(first, Token::Word(w) if is_keyword(w, "select")));
    }

    #[test]
    fn test_tokenizer_error_is_reported() {
        assert!(tokenize("SELECT 'unterminated").is_err());
    }
}
