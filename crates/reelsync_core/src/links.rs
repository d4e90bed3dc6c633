use std::collections::HashSet;

/// Result of merging candidate links into a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub added: usize,
    pub duplicate: usize,
    pub total: usize,
}

/// What a merge would write, computed without touching the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub new_links: Vec<String>,
    /// `existing ++ new_links`, the single value written back on merge.
    pub merged: Vec<String>,
    pub outcome: MergeOutcome,
}

impl MergePlan {
    pub fn needs_write(&self) -> bool {
        !self.new_links.is_empty()
    }
}

/// Exact string comparison, no normalization. A candidate repeated within
/// `candidates` is kept once and its repeats count as duplicates.
pub fn plan_merge(existing: &[String], candidates: &[String]) -> MergePlan {
    let mut seen: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let new_links: Vec<String> = candidates
        .iter()
        .filter(|link| seen.insert(link.as_str()))
        .cloned()
        .collect();

    let outcome = MergeOutcome {
        added: new_links.len(),
        duplicate: candidates.len() - new_links.len(),
        total: candidates.len(),
    };

    let merged = if new_links.is_empty() {
        existing.to_vec()
    } else {
        existing.iter().chain(new_links.iter()).cloned().collect()
    };

    MergePlan {
        new_links,
        merged,
        outcome,
    }
}
