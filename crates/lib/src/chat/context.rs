//! Conversation and intentions context handed to the assistant.

use std::fmt::Write as _;

use chrono::{Duration, NaiveDate};

use crate::Result;
use crate::llm::{LlmMessage, LlmRole};
use crate::store::{ChatRecord, Intention, Store};

use super::{Role, StoredContent};

fn marker(intention: &Intention) -> &'static str {
    if intention.completed {
        "[COMPLETED] "
    } else if intention.neverminded {
        "[NEVERMINDED] "
    } else if intention.sticky {
        "[STICKY] "
    } else if intention.froggy {
        "[FROG - Most Important] "
    } else if intention.anxiety_inducing {
        "[CHARGED] "
    } else {
        ""
    }
}

/// Format intentions grouped by date, newest date first.
///
/// Input must already be sorted by date descending.
pub(crate) fn format_intentions(intentions: &[Intention]) -> String {
    if intentions.is_empty() {
        return "No current intentions.".to_string();
    }

    let mut out = String::new();
    let mut current: Option<NaiveDate> = None;
    for intention in intentions {
        if current != Some(intention.date) {
            current = Some(intention.date);
            let _ = write!(out, "\n{}:", intention.date.format("%Y-%m-%d (%A)"));
        }
        let _ = write!(
            out,
            "\n  - {}{} (ID: {})",
            marker(intention),
            intention.title,
            intention.id
        );
    }
    out
}

/// Summarize the user's intentions from `days` days before the working day
/// up to the working day itself.
pub async fn build_intentions_context(
    store: &Store,
    user_id: i64,
    working_day: NaiveDate,
    days: i64,
) -> Result<String> {
    let start = working_day - Duration::days(days.max(0));
    let intentions = store
        .list_intentions_between(user_id, start, working_day)
        .await?;
    Ok(format_intentions(&intentions))
}

/// Convert stored rows into provider messages.
///
/// System rows are dropped; structured assistant rows are replayed as their
/// content blocks so earlier tool use stays visible to the model.
pub fn prepare_messages_for_llm(records: &[ChatRecord]) -> Vec<LlmMessage> {
    records
        .iter()
        .filter_map(|record| {
            let role = match record.role {
                Role::User => LlmRole::User,
                Role::Assistant => LlmRole::Assistant,
                Role::System => return None,
            };
            Some(match StoredContent::parse(&record.content) {
                StoredContent::Structured { content_blocks, .. } => {
                    LlmMessage::blocks(role, content_blocks)
                }
                StoredContent::Plain(text) => LlmMessage::text(role, text),
            })
        })
        .collect()
}
