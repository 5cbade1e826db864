//! Property-based tests for task text validation and snapshot ordering.
//!
//! Uses proptest to verify:
//! 1. Validation accepts exactly the drafts whose trimmed text is
//!    non-empty and within the character limit.
//! 2. Accepted text is trimmed and counted in characters, not bytes.
//! 3. Snapshot ordering is newest-first with unconfirmed rows on top,
//!    for any permutation of the input.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use taskdeck_model::task::{Task, TaskDraft, TaskId, ValidationError, sort_snapshot};
use taskdeck_model::user::UserId;

fn owner() -> UserId {
    UserId::new("prop")
}

/// Strategy for text made of arbitrary non-control characters, including
/// multi-byte ones, possibly padded with surrounding whitespace.
fn arb_padded_text() -> impl Strategy<Value = String> {
    ("[ \t]{0,3}", "[^\\p{C}]{0,40}", "[ \t]{0,3}").prop_map(|(lead, body, trail)| {
        format!("{lead}{body}{trail}")
    })
}

proptest! {
    #[test]
    fn validation_matches_trimmed_char_count(text in arb_padded_text(), max in 1usize..60) {
        let trimmed = text.trim();
        let result = TaskDraft::new(&text, owner(), max);
        let len = trimmed.chars().count();

        if trimmed.is_empty() {
            prop_assert_eq!(result.unwrap_err(), ValidationError::Empty);
        } else if len > max {
            prop_assert_eq!(result.unwrap_err(), ValidationError::TooLong { len, max });
        } else {
            let draft = result.unwrap();
            prop_assert_eq!(draft.text.as_str(), trimmed);
            prop_assert!(!draft.completed);
        }
    }

    #[test]
    fn accepted_text_never_exceeds_the_limit_in_chars(text in "\\PC{1,80}", max in 1usize..40) {
        if let Ok(draft) = TaskDraft::new(&text, owner(), max) {
            prop_assert!(draft.text.chars().count() <= max);
        }
    }

    #[test]
    fn ordering_is_newest_first_under_any_permutation(
        stamps in prop::collection::vec(0i64..1_000_000, 0..12),
        unconfirmed in 0usize..3,
    ) {
        let mut tasks: Vec<Task> = stamps
            .iter()
            .map(|&s| Task {
                id: TaskId::new(),
                text: "t".to_string(),
                completed: false,
                created_at: Utc.timestamp_opt(s, 0).single(),
                owner_id: owner(),
            })
            .collect();
        for _ in 0..unconfirmed {
            tasks.push(Task {
                id: TaskId::new(),
                text: "pending".to_string(),
                completed: false,
                created_at: None,
                owner_id: owner(),
            });
        }

        sort_snapshot(&mut tasks);

        // Unconfirmed rows first, then strictly non-increasing timestamps.
        let confirmed_from = tasks.iter().position(|t| t.created_at.is_some());
        if let Some(start) = confirmed_from {
            prop_assert!(tasks[..start].iter().all(|t| t.created_at.is_none()));
            let stamps: Vec<_> = tasks[start..]
                .iter()
                .map(|t| t.created_at.unwrap())
                .collect();
            prop_assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
        } else {
            prop_assert!(tasks.iter().all(|t| t.created_at.is_none()));
        }
    }
}
