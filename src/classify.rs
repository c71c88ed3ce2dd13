//! Report file classification.
//!
//! The enrichment tool drops a flat list of files into its output directory
//! and encodes each file's purpose in its name. This module partitions that
//! list into the navigable categories of the report view.

/// Key of the always-present summary pseudo-category.
pub const SUMMARY_KEY: &str = "summary";

/// One classification rule: case-insensitive prefix and suffix match on the
/// bare file name. Declaration order decides ties (first match wins).
struct CategoryRule {
    key: &'static str,
    label: &'static str,
    prefix: &'static str,
    suffix: &'static str,
}

const RULES: &[CategoryRule] = &[
    CategoryRule {
        key: "metrics",
        label: "Metrics",
        prefix: "metrics",
        suffix: ".csv",
    },
    CategoryRule {
        key: "timelines",
        label: "Timelines",
        prefix: "timeline",
        suffix: ".csv",
    },
    CategoryRule {
        key: "stacking",
        label: "Stacking",
        prefix: "stack",
        suffix: ".csv",
    },
    CategoryRule {
        key: "iocs",
        label: "IOCs",
        prefix: "list",
        suffix: ".txt",
    },
];

/// A named group of generated files, in the order they were reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub files: Vec<String>,
}

/// Partition generated file names into report categories.
///
/// Pure function: identical input yields identical output, and the input is
/// never mutated. Every file lands in at most one category; names matching
/// no rule are omitted entirely. The summary pseudo-category is always first
/// and never holds files; rule categories with no matches are dropped.
pub fn classify(file_names: &[String]) -> Vec<FileCategory> {
    let mut buckets: Vec<Vec<String>> = RULES.iter().map(|_| Vec::new()).collect();
    for name in file_names {
        // File names may be paths relative to the output directory; the
        // naming convention applies to the bare file name.
        let bare = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
        if let Some(i) = RULES
            .iter()
            .position(|r| bare.starts_with(r.prefix) && bare.ends_with(r.suffix))
        {
            buckets[i].push(name.clone());
        }
    }

    let mut categories = vec![FileCategory {
        key: SUMMARY_KEY,
        label: "Summary",
        files: Vec::new(),
    }];
    for (rule, files) in RULES.iter().zip(buckets) {
        if !files.is_empty() {
            categories.push(FileCategory {
                key: rule.key,
                label: rule.label,
                files,
            });
        }
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partitions_one_file_per_category() {
        let files = names(&[
            "metrics_user.csv",
            "timeline_login.csv",
            "stack_proc.csv",
            "list_ips.txt",
            "notes.md",
        ]);
        let categories = classify(&files);
        let keys: Vec<&str> = categories.iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["summary", "metrics", "timelines", "stacking", "iocs"]);
        for c in categories.iter().skip(1) {
            assert_eq!(c.files.len(), 1, "category {}", c.key);
        }
        // notes.md matches no rule and appears nowhere
        assert!(categories.iter().all(|c| !c.files.iter().any(|f| f == "notes.md")));
    }

    #[test]
    fn empty_input_yields_summary_only() {
        let categories = classify(&[]);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].key, SUMMARY_KEY);
        assert!(categories[0].files.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let files = names(&["METRICS_1.CSV"]);
        let categories = classify(&files);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].key, "metrics");
        assert_eq!(categories[1].files, vec!["METRICS_1.CSV".to_string()]);
    }

    #[test]
    fn classification_is_idempotent() {
        let files = names(&["metrics_a.csv", "list_hosts.txt", "stack_cmd.csv"]);
        assert_eq!(classify(&files), classify(&files));
    }

    #[test]
    fn a_name_matches_at_most_one_category() {
        let files = names(&["metrics_a.csv"]);
        let categories = classify(&files);
        let total: usize = categories.iter().map(|c| c.files.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn bare_name_is_matched_for_nested_paths() {
        let files = names(&["sub/metrics_a.csv"]);
        let categories = classify(&files);
        assert_eq!(categories[1].key, "metrics");
        // the reported (relative) name is preserved for fetching
        assert_eq!(categories[1].files, vec!["sub/metrics_a.csv".to_string()]);
    }

    #[test]
    fn prefix_and_suffix_must_both_match() {
        // right prefix, wrong suffix
        let categories = classify(&names(&["metrics_a.txt", "timeline.json"]));
        assert_eq!(categories.len(), 1);
    }
}
