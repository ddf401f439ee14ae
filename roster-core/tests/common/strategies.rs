// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proptest Strategies
//!
//! Reusable proptest strategies for property-based testing.

use proptest::prelude::*;

/// Short strings over a small alphabet, so random pairs share characters.
pub fn short_word_strategy() -> impl Strategy<Value = String> {
    "[abcé ]{0,12}"
}

/// Arbitrary printable content, including multi-byte characters.
pub fn any_text_strategy() -> impl Strategy<Value = String> {
    "\\PC{0,24}"
}

/// Plausible first or last names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,11}"
}

/// A full name: first and last joined by a space.
pub fn full_name_strategy() -> impl Strategy<Value = String> {
    (name_strategy(), name_strategy()).prop_map(|(first, last)| format!("{} {}", first, last))
}
