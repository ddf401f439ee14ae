// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Duplicate Grouping
//!
//! Partitions a participant snapshot into groups of likely duplicates, either
//! by exact case-insensitive name or by fuzzy name similarity. Groups are
//! derived on every scan and never stored.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::similarity::SimilarityPolicy;
use crate::participant::Participant;

/// A set of participants that look like the same person. Always has at
/// least two members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Exact key (`jan_bakker`) or the first member's full name for fuzzy groups.
    pub label: String,
    /// Member ids in presentation order.
    pub participant_ids: Vec<String>,
}

impl DuplicateGroup {
    /// Number of members.
    pub fn count(&self) -> usize {
        self.participant_ids.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.participant_ids.iter().any(|p| p == id)
    }
}

/// A way of grouping participants into likely duplicates.
pub trait GroupingStrategy {
    fn group(&self, participants: &[Participant]) -> Vec<DuplicateGroup>;
}

/// Groups participants sharing `lower(first)_lower(last)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactNameMatch;

impl GroupingStrategy for ExactNameMatch {
    fn group(&self, participants: &[Participant]) -> Vec<DuplicateGroup> {
        let mut order: Vec<String> = Vec::new();
        let mut members: HashMap<String, Vec<String>> = HashMap::new();

        for participant in participants {
            let key = participant.duplicate_key();
            let ids = members.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                Vec::new()
            });
            ids.push(participant.id.clone());
        }

        order
            .into_iter()
            .filter_map(|key| {
                let ids = members.remove(&key)?;
                (ids.len() > 1).then_some(DuplicateGroup {
                    label: key,
                    participant_ids: ids,
                })
            })
            .collect()
    }
}

/// Single-pass greedy clustering over names sorted by first name.
///
/// Each unassigned participant pulls every later unassigned participant
/// whose name is similar to its own. Similarity is not propagated through
/// members: if A~B and B~C but not A~C, whether B and C end up together
/// depends on which of them is reached first. This is single-link greedy
/// grouping, not an equivalence-class partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyClustering {
    pub policy: SimilarityPolicy,
}

impl GreedyClustering {
    pub fn new(policy: SimilarityPolicy) -> Self {
        GreedyClustering { policy }
    }
}

impl GroupingStrategy for GreedyClustering {
    fn group(&self, participants: &[Participant]) -> Vec<DuplicateGroup> {
        let sorted = sorted_by_first_name(participants);
        let names: Vec<String> = sorted.iter().map(|p| p.full_name()).collect();
        let mut assigned = vec![false; sorted.len()];
        let mut groups = Vec::new();

        for i in 0..sorted.len() {
            if assigned[i] {
                continue;
            }
            let mut cluster = vec![i];
            for j in (i + 1)..sorted.len() {
                if assigned[j] {
                    continue;
                }
                if self.policy.is_similar(&names[i], &names[j]) {
                    cluster.push(j);
                    assigned[j] = true;
                }
            }
            if cluster.len() > 1 {
                assigned[i] = true;
                groups.push(build_group(&sorted, cluster));
            }
        }

        groups
    }
}

/// Groups the connected components of the similarity relation.
///
/// Unlike [`GreedyClustering`], chains are followed: A~B and B~C put A, B
/// and C in one group even when A and C are not similar.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitiveClustering {
    pub policy: SimilarityPolicy,
}

impl TransitiveClustering {
    pub fn new(policy: SimilarityPolicy) -> Self {
        TransitiveClustering { policy }
    }
}

impl GroupingStrategy for TransitiveClustering {
    fn group(&self, participants: &[Participant]) -> Vec<DuplicateGroup> {
        let sorted = sorted_by_first_name(participants);
        let names: Vec<String> = sorted.iter().map(|p| p.full_name()).collect();
        let mut sets = UnionFind::new(sorted.len());

        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                if self.policy.is_similar(&names[i], &names[j]) {
                    sets.union(i, j);
                }
            }
        }

        let mut components: Vec<Vec<usize>> = Vec::new();
        let mut component_of_root: HashMap<usize, usize> = HashMap::new();
        for i in 0..sorted.len() {
            let root = sets.find(i);
            let slot = *component_of_root.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(i);
        }

        components
            .into_iter()
            .filter(|members| members.len() > 1)
            .map(|members| build_group(&sorted, members))
            .collect()
    }
}

/// Disjoint-set forest with path halving and union by size.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

/// Scan order for fuzzy grouping: first name, then last name (both
/// case-insensitive), then id, so results are reproducible.
fn sorted_by_first_name(participants: &[Participant]) -> Vec<&Participant> {
    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by(|a, b| {
        a.first_name
            .to_lowercase()
            .cmp(&b.first_name.to_lowercase())
            .then_with(|| a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase()))
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted
}

fn by_full_name(a: &Participant, b: &Participant) -> Ordering {
    a.comparison_name()
        .cmp(&b.comparison_name())
        .then_with(|| a.id.cmp(&b.id))
}

/// Orders members by full name and labels the group with the first one.
fn build_group(sorted: &[&Participant], indices: Vec<usize>) -> DuplicateGroup {
    let mut members: Vec<&Participant> = indices.into_iter().map(|i| sorted[i]).collect();
    members.sort_by(|a, b| by_full_name(a, b));
    DuplicateGroup {
        label: members[0].full_name(),
        participant_ids: members.iter().map(|p| p.id.clone()).collect(),
    }
}

/// Groups participants whose case-folded first and last names match exactly.
pub fn find_duplicate_participants(all: &[Participant]) -> Vec<DuplicateGroup> {
    ExactNameMatch.group(all)
}

/// Groups participants with similar full names using greedy clustering and
/// the default policy.
pub fn find_similar_participant_names(all: &[Participant]) -> Vec<DuplicateGroup> {
    GreedyClustering::default().group(all)
}

/// Returns every participant whose full name is similar to the candidate
/// name, in input order. Used to warn before adding a likely duplicate.
pub fn find_similar_to<'a>(
    all: &'a [Participant],
    first_name: &str,
    last_name: &str,
    policy: &SimilarityPolicy,
) -> Vec<&'a Participant> {
    let candidate = crate::participant::full_name(first_name, last_name);
    all.iter()
        .filter(|p| policy.is_similar(&candidate, &p.full_name()))
        .collect()
}
