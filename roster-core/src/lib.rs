// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Roster Core Library
//!
//! Participant records for activity programmes, with duplicate detection
//! and merging. Persistence goes through the [`store::RecordStore`] trait.

pub mod dedup;
pub mod participant;
pub mod roster;
pub mod store;

pub use dedup::{
    edit_distance, find_duplicate_participants, find_similar_participant_names, find_similar_to,
    is_similar, merge_participants, plan_merge, similarity_ratio, DuplicateGroup, ExactNameMatch,
    GreedyClustering, GroupingStrategy, MergeCoordinator, MergeError, MergePlan, MergeReport,
    MergeStep, ParticipantSnapshot, SimilarityPolicy, TransitiveClustering,
};
pub use participant::{
    Activity, ActivityAssignee, ActivityType, Influx, NewParticipant, Participant,
    ParticipantActivityType, ParticipantRole, Registration, ValidationError,
};
pub use roster::{Roster, RosterError, RosterResult};
pub use store::{
    atomically, open_store, Collection, ErrorCategory, Filter, MemoryStore, Order, RecordStore,
    Row, SqliteStore, StoreBackend, StoreError, StoreResult,
};
