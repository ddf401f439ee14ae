// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Property tests for edit distance and the similarity policy.

mod common;

use common::strategies::{any_text_strategy, full_name_strategy, short_word_strategy};
use proptest::prelude::*;
use roster_core::{edit_distance, is_similar, similarity_ratio};

proptest! {
    #[test]
    fn prop_distance_to_self_is_zero(s in any_text_strategy()) {
        prop_assert_eq!(edit_distance(&s, &s), 0);
    }

    #[test]
    fn prop_distance_is_symmetric(a in short_word_strategy(), b in short_word_strategy()) {
        prop_assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
    }

    #[test]
    fn prop_distance_to_empty_is_length(s in any_text_strategy()) {
        prop_assert_eq!(edit_distance("", &s), s.chars().count());
        prop_assert_eq!(edit_distance(&s, ""), s.chars().count());
    }

    #[test]
    fn prop_triangle_inequality(
        a in short_word_strategy(),
        b in short_word_strategy(),
        c in short_word_strategy(),
    ) {
        prop_assert!(edit_distance(&a, &c) <= edit_distance(&a, &b) + edit_distance(&b, &c));
    }

    #[test]
    fn prop_distance_bounded_by_longer_length(a in short_word_strategy(), b in short_word_strategy()) {
        let longest = a.chars().count().max(b.chars().count());
        prop_assert!(edit_distance(&a, &b) <= longest);
    }

    #[test]
    fn prop_ratio_in_unit_interval(a in any_text_strategy(), b in any_text_strategy()) {
        let ratio = similarity_ratio(&a, &b);
        prop_assert!((0.0..=1.0).contains(&ratio));
    }

    #[test]
    fn prop_name_similar_to_itself_in_any_case(name in full_name_strategy()) {
        prop_assert!(is_similar(&name, &name.to_uppercase()));
    }

    #[test]
    fn prop_similarity_is_symmetric(a in full_name_strategy(), b in full_name_strategy()) {
        prop_assert_eq!(is_similar(&a, &b), is_similar(&b, &a));
    }
}
