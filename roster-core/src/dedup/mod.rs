// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Participant Duplicate Detection and Merge

pub mod grouping;
pub mod merge;
pub mod similarity;

pub use grouping::{
    find_duplicate_participants, find_similar_participant_names, find_similar_to, DuplicateGroup,
    ExactNameMatch, GreedyClustering, GroupingStrategy, TransitiveClustering,
};
pub use merge::{
    merge_participants, plan_merge, MergeCoordinator, MergeError, MergePlan, MergeReport,
    MergeStep, ParticipantSnapshot,
};
pub use similarity::{edit_distance, is_similar, similarity_ratio, SimilarityPolicy};
