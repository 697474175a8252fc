//! Extraction phase
//!
//! Walks the token tree of the first statement and collects the tables it reads,
//! every column reference it makes, and the aliases it gives its tables.
//!
//! A name right after `FROM`/`JOIN` (or after a comma in a FROM list) is a table,
//! unless it is called like a function (`generate_series(1, 3)`); a name right
//! after a table, with or without `AS`, is that table's alias. Any other
//! identifier is a column reference unless it names a function, follows `AS`,
//! prefixes a typed literal (`DATE '2024-01-01'`), is a cast target, or is a
//! select-list alias written without `AS` (`SELECT price p`).
//!
//! Words such as `FIRST`, `ROWS` or `ONLY` are keywords only in their clause
//! (`FETCH FIRST 5 ROWS ONLY`, `NULLS LAST`, window frames); elsewhere they are
//! ordinary names. Parenthesised groups are walked with fresh clause state.

use super::tokens::{is_keyword, SqlNode};
use super::ColumnRef;
use sqlparser::tokenizer::{Token, Word};
use std::collections::{BTreeMap, BTreeSet};

/// Words that shape a statement and are never table or column names.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "IN", "IS", "NULL", "AS", "ON", "JOIN",
    "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL", "LATERAL", "USING", "GROUP",
    "BY", "ORDER", "HAVING", "LIMIT", "OFFSET", "FETCH", "DISTINCT", "UNION", "INTERSECT",
    "EXCEPT", "ALL", "ANY", "SOME", "ASC", "DESC", "NULLS", "LIKE", "ILIKE", "BETWEEN", "CASE",
    "WHEN", "THEN", "ELSE", "END", "EXISTS", "TRUE", "FALSE", "INTERVAL", "WITH",
    "CURRENT_DATE", "CURRENT_TIMESTAMP", "CURRENT_TIME", "OVER", "PARTITION", "CAST", "INSERT",
    "INTO", "VALUES", "UPDATE", "SET", "DELETE", "DROP", "TRUNCATE", "ALTER", "CREATE", "TABLE",
    "GRANT", "REVOKE", "EXECUTE", "EXEC",
];

/// Keywords that sit between a table and the `JOIN` that follows it.
const JOIN_MODIFIERS: &[&str] = &[
    "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL", "LATERAL",
];

/// Keywords that close a select list.
const CLAUSE_KEYWORDS: &[&str] = &[
    "FROM", "WHERE", "GROUP", "ORDER", "HAVING", "LIMIT", "OFFSET", "FETCH", "UNION",
    "INTERSECT", "EXCEPT", "INTO",
];

/// Keywords that stand for a value, so a select expression can end on them.
const VALUE_KEYWORDS: &[&str] = &[
    "END", "NULL", "TRUE", "FALSE", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
];

const FRAME_UNITS: &[&str] = &["ROWS", "RANGE", "GROUPS"];
const FRAME_BOUNDS: &[&str] = &["BETWEEN", "UNBOUNDED", "CURRENT"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub tables: BTreeSet<String>,
    /// Every occurrence, in statement order.
    pub columns: Vec<ColumnRef>,
    /// Alias -> table name.
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Position {
    Expression,
    Table,
    /// Just read a table (or derived table); the next name is its alias.
    AfterTable(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Clause {
    From,
    Other,
}

pub fn extract(statement: &[SqlNode]) -> Extraction {
    let mut extraction = Extraction::default();
    walk(statement, true, &mut extraction);
    extraction
}

fn is_structural(word: &Word) -> bool {
    word.quote_style.is_none() && STRUCTURAL_KEYWORDS.iter().any(|k| is_keyword(word, k))
}

fn word_is_any(node: Option<&SqlNode>, keywords: &[&str]) -> bool {
    match node.and_then(SqlNode::as_word) {
        Some(word) => keywords.iter().any(|k| is_keyword(word, k)),
        None => false,
    }
}

fn is_number(node: Option<&SqlNode>) -> bool {
    matches!(node, Some(SqlNode::Leaf(Token::Number(_, _))))
}

/// `ROWS BETWEEN ..`, `RANGE UNBOUNDED PRECEDING`, `ROWS 3 PRECEDING`.
fn opens_window_frame(node: &SqlNode, next: Option<&SqlNode>) -> bool {
    word_is_any(Some(node), FRAME_UNITS) && (is_number(next) || word_is_any(next, FRAME_BOUNDS))
}

/// Paging and null-ordering words: `FETCH FIRST 5 ROWS ONLY`, `OFFSET 5 ROWS`,
/// `WITH TIES`, `NULLS LAST`.
fn is_clause_word(node: &SqlNode, prev: Option<&SqlNode>) -> bool {
    let node = Some(node);
    if word_is_any(node, &["FIRST", "LAST"]) && word_is_any(prev, &["NULLS"]) {
        return true;
    }
    if word_is_any(node, &["FIRST", "NEXT"]) && word_is_any(prev, &["FETCH"]) {
        return true;
    }
    if word_is_any(node, &["ROW", "ROWS"]) {
        return is_number(prev) || word_is_any(prev, &["FIRST", "NEXT"]);
    }
    if word_is_any(node, &["TIES"]) {
        return word_is_any(prev, &["WITH"]);
    }
    word_is_any(node, &["ONLY"]) && word_is_any(prev, &["ROW", "ROWS"])
}

/// Whether a group holds a query (so its FROM introduces tables).
fn opens_query(children: &[SqlNode]) -> bool {
    match children.iter().find_map(SqlNode::first_leaf) {
        Some(Token::Word(word)) => is_keyword(word, "SELECT") || is_keyword(word, "WITH"),
        _ => false,
    }
}

/// Reads `a`, `a.b`, `a.b.c` or `a.*` starting at `nodes[0]`.
/// Returns the name parts, whether it ended in a wildcard, and the nodes consumed.
fn qualified_name(nodes: &[SqlNode]) -> (Vec<String>, bool, usize) {
    let mut parts: Vec<String> = nodes
        .first()
        .and_then(SqlNode::as_word)
        .map(|w| vec![w.value.clone()])
        .unwrap_or_default();
    let mut consumed = 1;
    let mut wildcard = false;

    while nodes.get(consumed).map_or(false, |n| n.is_token(&Token::Period)) {
        match nodes.get(consumed + 1) {
            Some(SqlNode::Leaf(Token::Word(word))) => parts.push(word.value.clone()),
            Some(SqlNode::Leaf(Token::Mul)) => wildcard = true,
            _ => break,
        }
        consumed += 2;
        if wildcard {
            break;
        }
    }
    (parts, wildcard, consumed)
}

fn walk(nodes: &[SqlNode], tables_allowed: bool, out: &mut Extraction) {
    let mut position = Position::Expression;
    let mut clause = Clause::Other;
    let mut alias_pending = false;
    let mut cast_pending = false;
    let mut in_select_list = false;
    // The last node finished an operand, so a bare name next is an alias.
    let mut expression_done = false;
    let mut i = 0;

    while i < nodes.len() {
        let prev = i.checked_sub(1).map(|j| &nodes[j]);
        let node = &nodes[i];

        match node {
            SqlNode::Group(children) => {
                walk(children, opens_query(children), out);
                position = match position {
                    Position::Table => Position::AfterTable(None),
                    _ => Position::Expression,
                };
                // DISTINCT ON (..) lists keys, not an aliased expression
                expression_done = !word_is_any(prev, &["ON"]);
                alias_pending = false;
                cast_pending = false;
                i += 1;
            }

            SqlNode::Leaf(Token::Word(word)) if is_structural(word) => {
                let keyword = word.value.to_uppercase();
                i += 1;
                if keyword == "AS" {
                    alias_pending = true;
                    continue;
                }
                if keyword == "SELECT" {
                    in_select_list = true;
                } else if CLAUSE_KEYWORDS.contains(&keyword.as_str()) {
                    in_select_list = false;
                }
                expression_done = VALUE_KEYWORDS.contains(&keyword.as_str());

                if tables_allowed && (keyword == "FROM" || keyword == "JOIN") {
                    clause = Clause::From;
                    position = Position::Table;
                } else if JOIN_MODIFIERS.contains(&keyword.as_str()) {
                    position = Position::Expression;
                } else {
                    clause = Clause::Other;
                    position = Position::Expression;
                }
                alias_pending = false;
                cast_pending = false;
            }

            // The frame closes a window specification.
            SqlNode::Leaf(Token::Word(_))
                if !tables_allowed && opens_window_frame(node, nodes.get(i + 1)) =>
            {
                break;
            }

            SqlNode::Leaf(Token::Word(_)) if is_clause_word(node, prev) => {
                expression_done = false;
                i += 1;
            }

            // FROM ONLY parent_table
            SqlNode::Leaf(Token::Word(word))
                if position == Position::Table && is_keyword(word, "ONLY") =>
            {
                i += 1;
            }

            SqlNode::Leaf(Token::Word(_)) => {
                let (parts, wildcard, consumed) = qualified_name(&nodes[i..]);
                i += consumed;
                let next = nodes.get(i);
                let Some(last) = parts.last().cloned() else {
                    continue;
                };

                if cast_pending {
                    cast_pending = false;
                    position = Position::Expression;
                    expression_done = true;
                    continue;
                }

                if alias_pending {
                    alias_pending = false;
                    if let Position::AfterTable(Some(table)) = &position {
                        out.aliases.insert(last, table.clone());
                    }
                    position = Position::Expression;
                    expression_done = false;
                    continue;
                }

                let is_function = next.map_or(false, SqlNode::is_group);

                match std::mem::replace(&mut position, Position::Expression) {
                    Position::Table => {
                        if is_function {
                            // table function; its argument group follows
                            position = Position::Table;
                        } else if !wildcard {
                            out.tables.insert(last.clone());
                            position = Position::AfterTable(Some(last));
                        }
                        continue;
                    }
                    Position::AfterTable(table) => {
                        if let Some(table) = table {
                            out.aliases.insert(last, table);
                        }
                        continue;
                    }
                    Position::Expression => {}
                }

                let bare_alias =
                    in_select_list && expression_done && parts.len() == 1 && !wildcard;
                if bare_alias && !is_function {
                    expression_done = false;
                    continue;
                }

                let is_typed_literal = parts.len() == 1
                    && matches!(next, Some(SqlNode::Leaf(Token::SingleQuotedString(_))));
                if is_function || is_typed_literal {
                    // the group or literal that follows finishes the operand
                    expression_done = false;
                    continue;
                }
                expression_done = true;
                if wildcard {
                    continue;
                }

                match parts.as_slice() {
                    [column] => out.columns.push(ColumnRef {
                        table: None,
                        column: column.clone(),
                    }),
                    [table, column] => out.columns.push(ColumnRef {
                        table: Some(table.clone()),
                        column: column.clone(),
                    }),
                    _ => {}
                }
            }

            SqlNode::Leaf(Token::Comma) => {
                position = if tables_allowed && clause == Clause::From {
                    Position::Table
                } else {
                    Position::Expression
                };
                alias_pending = false;
                cast_pending = false;
                expression_done = false;
                i += 1;
            }

            SqlNode::Leaf(Token::DoubleColon) => {
                cast_pending = true;
                expression_done = false;
                i += 1;
            }

            SqlNode::Leaf(token) => {
                position = Position::Expression;
                alias_pending = false;
                cast_pending = false;
                expression_done =
                    matches!(token, Token::Number(_, _) | Token::SingleQuotedString(_));
                i += 1;
            }
        }
    }
}
