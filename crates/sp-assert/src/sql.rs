// sql.rs — Read-only shape checks and table extraction.
//
// Assertion queries must be plain SELECTs. The shape check is lexical:
// the statement must start with SELECT and no DDL/DML keyword may appear
// at a statement boundary (start of text or after a semicolon). Table
// extraction walks FROM and JOIN clauses for the allowlist check.

use once_cell::sync::Lazy;
use regex::Regex;

static TABLE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:from|join)\s+([A-Za-z_][A-Za-z0-9_.]*)").unwrap()
});

/// Whether the query is read-only in shape.
///
/// Every semicolon-separated statement must start with SELECT, which
/// excludes DDL and DML at every statement boundary; keywords inside
/// string literals or column data are not boundaries and stay legal.
pub fn is_read_only_sql(query: &str) -> bool {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return false;
    }

    for statement in trimmed.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        if !statement.to_lowercase().starts_with("select") {
            return false;
        }
    }

    true
}

/// Table names referenced in FROM/JOIN clauses, lowercased, deduplicated.
pub fn parse_tables(query: &str) -> Vec<String> {
    let mut tables = Vec::new();
    for capture in TABLE_REF.captures_iter(query) {
        let table = capture[1].to_lowercase();
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}

/// First table referenced that is missing from the allowlist, if any.
/// Allowlist entries are compared lowercase.
pub fn first_disallowed_table(query: &str, allowed: &[String]) -> Option<String> {
    parse_tables(query)
        .into_iter()
        .find(|table| !allowed.iter().any(|a| a.eq_ignore_ascii_case(table)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_read_only() {
        assert!(is_read_only_sql("SELECT id FROM transaction"));
        assert!(is_read_only_sql("  select count(*) from customer  "));
    }

    #[test]
    fn mutating_statements_rejected() {
        assert!(!is_read_only_sql("DELETE FROM transaction"));
        assert!(!is_read_only_sql("UPDATE customer SET name = 'x'"));
        assert!(!is_read_only_sql("DROP TABLE transaction"));
        assert!(!is_read_only_sql(""));
    }

    #[test]
    fn stacked_statement_rejected() {
        assert!(!is_read_only_sql(
            "SELECT id FROM transaction; DELETE FROM transaction"
        ));
        // A trailing semicolon alone is fine.
        assert!(is_read_only_sql("SELECT id FROM transaction;"));
    }

    #[test]
    fn select_mentioning_keyword_in_literal_is_fine() {
        // "delete" as column data, not at a statement boundary.
        assert!(is_read_only_sql(
            "SELECT id FROM audit_log WHERE action = 'delete'"
        ));
    }

    #[test]
    fn parses_from_and_join_tables() {
        let tables = parse_tables(
            "SELECT t.id FROM Transaction t JOIN customer c ON c.id = t.entity \
             LEFT JOIN transactionLine tl ON tl.transaction = t.id",
        );
        assert_eq!(tables, vec!["transaction", "customer", "transactionline"]);
    }

    #[test]
    fn allowlist_check_finds_offender() {
        let allowed = vec!["transaction".to_string(), "customer".to_string()];
        assert_eq!(
            first_disallowed_table("SELECT * FROM employee", &allowed),
            Some("employee".to_string())
        );
        assert_eq!(
            first_disallowed_table("SELECT * FROM Transaction", &allowed),
            None
        );
    }
}
