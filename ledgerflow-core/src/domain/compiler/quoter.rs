// ledgerflow-core/src/domain/compiler/quoter.rs

pub struct SqlQuoter;

impl SqlQuoter {
    /// Cite un identifiant: `name` -> `"name"`, doubling embedded quotes.
    pub fn ident(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// `alias."column"`
    pub fn qualified(alias: &str, column: &str) -> String {
        format!("{}.{}", alias, Self::ident(column))
    }

    /// Cite un littéral texte: `it's` -> `'it''s'`.
    pub fn literal(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Comma-separated list of quoted identifiers.
    pub fn ident_list<S: AsRef<str>>(names: &[S]) -> String {
        names
            .iter()
            .map(|n| Self::ident(n.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_escapes_quotes() {
        assert_eq!(SqlQuoter::ident("amount_local"), "\"amount_local\"");
        assert_eq!(SqlQuoter::ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_literal_escapes_quotes() {
        assert_eq!(SqlQuoter::literal("/data/o'brien.csv"), "'/data/o''brien.csv'");
    }

    #[test]
    fn test_qualified_and_list() {
        assert_eq!(SqlQuoter::qualified("e", "date"), "e.\"date\"");
        assert_eq!(SqlQuoter::ident_list(&["a", "b"]), "\"a\", \"b\"");
    }
}
