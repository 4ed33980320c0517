// Helpers shared by the rank-grid readers.

/// Columns of a Forms export that are not candidates.
pub fn is_metadata_column(header: &str) -> bool {
    matches!(
        header.trim(),
        "Timestamp" | "Email Address" | "ID" | "Id" | "id"
    )
}

/// Orders the per-candidate ranks of one respondent into a ranking, most
/// preferred first. Candidates without a rank are already absent; two
/// candidates sharing a rank keep their column order.
pub fn assemble_ranking(ranks: &[(String, u32)]) -> Vec<String> {
    let mut sorted = ranks.to_vec();
    sorted.sort_by_key(|(_, rank)| *rank);
    sorted.into_iter().map(|(name, _)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranks(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
        pairs.iter().map(|(n, r)| (n.to_string(), *r)).collect()
    }

    #[test]
    fn ranking_follows_rank_order_not_column_order() {
        let r = ranks(&[("Alice", 3), ("Bob", 1), ("Charlie", 2)]);
        assert_eq!(assemble_ranking(&r), vec!["Bob", "Charlie", "Alice"]);
    }

    #[test]
    fn shared_ranks_keep_column_order() {
        let r = ranks(&[("Alice", 2), ("Bob", 1), ("Charlie", 2)]);
        assert_eq!(assemble_ranking(&r), vec!["Bob", "Alice", "Charlie"]);
    }

    #[test]
    fn metadata_columns_are_recognized() {
        assert!(is_metadata_column("Timestamp"));
        assert!(is_metadata_column("Email Address"));
        assert!(!is_metadata_column("Alice"));
    }
}
