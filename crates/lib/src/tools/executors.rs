//! Executors for each tool.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::store::{
    Intention, IntentionUpdate, NewIntention, StatusField, StatusFilter, Store, StoreError,
};
use crate::{Error, Result};

use super::errors::ToolError;
use super::input::{self, ToolInput};
use super::{MAX_BATCH_SIZE, ToolName};

pub(super) async fn run(store: &Store, user_id: i64, tool: ToolName, raw: &Value) -> Result<Value> {
    let input = ToolInput::new(raw)?;
    match tool {
        ToolName::CreateIntention => create_intention(store, user_id, &input).await,
        ToolName::CreateIntentionsBatch => create_intentions_batch(store, user_id, &input).await,
        ToolName::UpdateIntentionStatus => update_intention_status(store, user_id, &input).await,
        ToolName::ReorderIntentions => reorder_intentions(store, user_id, &input).await,
        ToolName::ListIntentions => list_intentions(store, user_id, &input).await,
        ToolName::GetIntentionDetails => get_intention_details(store, user_id, &input).await,
        ToolName::UpdateIntention => update_intention(store, user_id, &input).await,
        ToolName::DeleteIntention => delete_intention(store, user_id, &input).await,
    }
}

/// Rewrite a frog conflict with tool-specific advice.
fn frog_conflict(err: Error, advice: &str) -> Error {
    match err {
        Error::Store(StoreError::FrogExists { date, title }) => ToolError::invalid(format!(
            "A frog already exists for {date}: '{title}'. {advice}"
        ))
        .into(),
        other => other,
    }
}

fn summary(intention: &Intention) -> Value {
    json!({
        "intention_id": intention.id,
        "title": intention.title,
        "date": intention.date.to_string(),
        "froggy": intention.froggy,
        "sticky": intention.sticky,
        "anxiety_inducing": intention.anxiety_inducing,
    })
}

fn details(intention: &Intention) -> Value {
    json!({
        "id": intention.id,
        "title": intention.title,
        "date": intention.date.to_string(),
        "order": intention.order,
        "completed": intention.completed,
        "neverminded": intention.neverminded,
        "sticky": intention.sticky,
        "froggy": intention.froggy,
        "anxiety_inducing": intention.anxiety_inducing,
        "status": intention.status().as_str(),
    })
}

fn with_message(mut value: Value, message: String) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.insert("message".to_string(), Value::String(message));
    }
    value
}

async fn create_intention(store: &Store, user_id: i64, input: &ToolInput<'_>) -> Result<Value> {
    let title = input::title(input.get("title"), "")?;
    let date = input.date("date")?;

    let new = NewIntention {
        title,
        date,
        froggy: input.flag("froggy"),
        sticky: input.flag("sticky"),
        anxiety_inducing: input.flag("anxiety_inducing"),
    };
    let intention = store.create_intention(user_id, new).await?;

    let message = format!("Successfully created intention: {}", intention.title);
    Ok(with_message(summary(&intention), message))
}

async fn create_intentions_batch(
    store: &Store,
    user_id: i64,
    input: &ToolInput<'_>,
) -> Result<Value> {
    let items = match input.get("intentions") {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(_) => return Err(ToolError::invalid("intentions must be a list").into()),
    };
    if items.is_empty() {
        return Err(ToolError::invalid("intentions list is required and cannot be empty").into());
    }
    if items.len() > MAX_BATCH_SIZE {
        return Err(ToolError::invalid(format!(
            "Cannot create more than {MAX_BATCH_SIZE} intentions at once"
        ))
        .into());
    }

    let common_date = input.date("date")?;
    let working_day = store.clock().working_day();

    let mut batch = Vec::with_capacity(items.len());
    let mut frogs = 0;
    for (idx, item) in items.into_iter().enumerate() {
        let n = idx + 1;
        let item = ToolInput::new(item)
            .map_err(|_| ToolError::invalid(format!("Intention #{n} must be an object")))?;

        let title = input::title(item.get("title"), &format!("Intention #{n}: "))?;
        let date = match item.get("date") {
            Some(Value::String(s)) if s.is_empty() => common_date.unwrap_or(working_day),
            Some(value) => input::parse_date(value).ok_or_else(|| {
                ToolError::invalid(format!(
                    "Intention #{n}: invalid date format '{}'. Use YYYY-MM-DD.",
                    input::display(value)
                ))
            })?,
            None => common_date.unwrap_or(working_day),
        };

        let froggy = item.flag("froggy");
        if froggy {
            frogs += 1;
            if frogs > 1 {
                return Err(ToolError::invalid(
                    "Cannot create multiple frogs in the same batch. Only one frog per day allowed.",
                )
                .into());
            }
        }

        batch.push(NewIntention {
            title,
            date: Some(date),
            froggy,
            sticky: item.flag("sticky"),
            anxiety_inducing: item.flag("anxiety_inducing"),
        });
    }

    let created = store.create_intentions(user_id, batch).await?;
    Ok(json!({
        "count": created.len(),
        "intentions": created.iter().map(summary).collect::<Vec<_>>(),
        "message": format!("Successfully created {} intention(s)", created.len()),
    }))
}

async fn update_intention_status(
    store: &Store,
    user_id: i64,
    input: &ToolInput<'_>,
) -> Result<Value> {
    let id = input.intention_id()?;

    let field = match input.get("status_field") {
        None => return Err(ToolError::invalid("status_field is required").into()),
        Some(value) => value.as_str().and_then(StatusField::parse).ok_or_else(|| {
            let valid: Vec<_> = StatusField::ALL.iter().map(StatusField::as_str).collect();
            ToolError::invalid(format!(
                "Invalid status_field '{}'. Must be one of: {}",
                input::display(value),
                valid.join(", ")
            ))
        })?,
    };

    let value = match input.get("value") {
        None => return Err(ToolError::invalid("value is required").into()),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| ToolError::invalid("value must be a boolean (true or false)"))?,
    };

    let intention = store
        .set_intention_flag(user_id, id, field, value)
        .await
        .map_err(|e| {
            frog_conflict(
                e,
                "Only one frog per day allowed. Remove the existing frog first.",
            )
        })?;

    let action = if value { "marked as" } else { "unmarked as" };
    Ok(json!({
        "intention_id": intention.id,
        "title": intention.title,
        "status_field": field.as_str(),
        "value": value,
        "date": intention.date.to_string(),
        "message": format!(
            "Successfully {action} {}: {}",
            field.display_name(),
            intention.title
        ),
    }))
}

async fn reorder_intentions(store: &Store, user_id: i64, input: &ToolInput<'_>) -> Result<Value> {
    let ids = match input.get("intention_ids") {
        None => Vec::new(),
        Some(Value::Array(values)) => values
            .iter()
            .map(Value::as_i64)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ToolError::invalid("intention_ids must be a list of intention IDs"))?,
        Some(_) => {
            return Err(ToolError::invalid("intention_ids must be a list of intention IDs").into());
        }
    };
    if ids.is_empty() {
        return Err(ToolError::invalid("intention_ids list is required and cannot be empty").into());
    }
    if ids.iter().collect::<HashSet<_>>().len() != ids.len() {
        return Err(ToolError::invalid("intention_ids contains duplicate IDs").into());
    }

    let date = input
        .date("date")?
        .unwrap_or_else(|| store.clock().working_day());

    let reordered = store.reorder_intentions(user_id, date, &ids).await?;
    Ok(json!({
        "count": ids.len(),
        "date": date.to_string(),
        "intentions": reordered
            .iter()
            .map(|i| json!({"id": i.id, "title": i.title, "order": i.order}))
            .collect::<Vec<_>>(),
        "message": format!("Successfully reordered {} intentions for {date}", ids.len()),
    }))
}

async fn list_intentions(store: &Store, user_id: i64, input: &ToolInput<'_>) -> Result<Value> {
    let date = input
        .date("date")?
        .unwrap_or_else(|| store.clock().working_day());

    let filter = match input.get("status_filter") {
        None => StatusFilter::All,
        Some(Value::String(s)) if s.is_empty() => StatusFilter::All,
        Some(value) => value.as_str().and_then(StatusFilter::parse).ok_or_else(|| {
            let valid: Vec<_> = StatusFilter::ALL.iter().map(StatusFilter::as_str).collect();
            ToolError::invalid(format!(
                "Invalid status_filter '{}'. Must be one of: {}",
                input::display(value),
                valid.join(", ")
            ))
        })?,
    };

    let intentions = store.list_intentions(user_id, date, filter).await?;
    tracing::info!(
        user_id,
        %date,
        filter = filter.as_str(),
        "Listed {} intentions",
        intentions.len()
    );

    Ok(json!({
        "date": date.to_string(),
        "status_filter": filter.as_str(),
        "count": intentions.len(),
        "intentions": intentions.iter().map(details).collect::<Vec<_>>(),
        "message": format!("Found {} intention(s) for {date}", intentions.len()),
    }))
}

async fn get_intention_details(
    store: &Store,
    user_id: i64,
    input: &ToolInput<'_>,
) -> Result<Value> {
    let id = input.intention_id()?;
    let intention = store.intention(user_id, id).await?;

    let mut value = details(&intention);
    if let Some(map) = value.as_object_mut() {
        map.insert(
            "created_datetime".to_string(),
            Value::String(intention.created_rfc3339()),
        );
    }
    let message = format!("Retrieved details for intention: {}", intention.title);
    Ok(with_message(value, message))
}

async fn update_intention(store: &Store, user_id: i64, input: &ToolInput<'_>) -> Result<Value> {
    let id = input.intention_id()?;
    let current = store.intention(user_id, id).await?;

    let mut update = IntentionUpdate::default();
    let mut changes = Vec::new();

    if let Some(value) = input.get("title") {
        let title = value
            .as_str()
            .ok_or_else(|| ToolError::invalid("Title must be a string"))?
            .trim();
        if title.is_empty() {
            return Err(ToolError::invalid("Title cannot be empty").into());
        }
        if title.chars().count() > input::MAX_TITLE_CHARS {
            return Err(ToolError::invalid(format!(
                "Title cannot exceed {} characters",
                input::MAX_TITLE_CHARS
            ))
            .into());
        }
        if title != current.title {
            changes.push(format!("title: '{}' → '{title}'", current.title));
            update.title = Some(title.to_string());
        }
    }

    let new_date: Option<NaiveDate> = match input.get("date") {
        None => None,
        Some(value) => Some(input::parse_date(value).ok_or_else(|| {
            ToolError::invalid(format!(
                "Invalid date format: {}. Use YYYY-MM-DD.",
                input::display(value)
            ))
        })?),
    };
    if let Some(date) = new_date.filter(|d| *d != current.date) {
        changes.push(format!("date: {} → {date}", current.date));
        update.date = Some(date);
    }

    if changes.is_empty() {
        return Ok(json!({
            "intention_id": current.id,
            "title": current.title,
            "date": current.date.to_string(),
            "changes": [],
            "message": "No changes made - intention already has the specified values",
        }));
    }

    let updated = store
        .update_intention(user_id, id, update)
        .await
        .map_err(|e| {
            frog_conflict(
                e,
                "Cannot move this frog there. Remove the existing frog first.",
            )
        })?;

    tracing::info!(intention_id = id, user_id, "Updated intention: {}", changes.join(", "));
    Ok(json!({
        "intention_id": updated.id,
        "title": updated.title,
        "date": updated.date.to_string(),
        "changes": changes,
        "message": format!("Successfully updated intention: {}", changes.join(", ")),
    }))
}

async fn delete_intention(store: &Store, user_id: i64, input: &ToolInput<'_>) -> Result<Value> {
    let id = input.intention_id()?;
    let deleted = store.delete_intention(user_id, id).await?;
    Ok(json!({
        "intention_id": deleted.id,
        "title": deleted.title,
        "date": deleted.date.to_string(),
        "message": format!("Successfully deleted intention: {}", deleted.title),
    }))
}
