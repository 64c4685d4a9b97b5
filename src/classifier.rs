// ABOUTME: Keyword-based heuristic that flags inbound messages as symptom reports
// ABOUTME: Case-insensitive substring match over a fixed symptom vocabulary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

//! Symptom classifier
//!
//! A deliberately crude predicate: any message containing one of the fixed
//! vocabulary terms anywhere in its lower-cased text is flagged. Substring
//! false positives ("pain" inside "painting") are accepted behavior.

/// Fixed symptom vocabulary
const SYMPTOM_KEYWORDS: [&str; 5] = ["fever", "cough", "headache", "pain", "nausea"];

/// Returns true when the message should also be recorded as a symptom report.
///
/// Pure predicate: no side effects, no external calls.
#[must_use]
pub fn is_symptom_report(message: &str) -> bool {
    let lowered = message.to_lowercase();
    SYMPTOM_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
