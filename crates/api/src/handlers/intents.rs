//! Handler for `/intents`: apply one classified user action.
//!
//! The classifier runs outside this daemon. It posts its [`ParsedIntent`]
//! together with the original text, and gets back a single sentence for the
//! user plus the records the action touched.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use itemkeeper_core::collection;
use itemkeeper_core::intent::{Intent, ParsedIntent};
use itemkeeper_core::record::{ItemRecord, Source};
use itemkeeper_core::types::RecordId;
use serde::{Deserialize, Serialize};

use super::{save_active, save_moved_to_bin};
use crate::error::AppResult;
use crate::middleware::session::Session;
use crate::mirror::{mirror, MirrorOp};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyIntentRequest {
    pub parsed: ParsedIntent,
    #[serde(default)]
    pub raw_input: String,
    #[serde(default)]
    pub source: Source,
    /// Ids of the results the user is looking at. A delete intent with
    /// targets removes exactly these instead of matching by keyword.
    #[serde(default)]
    pub target_ids: Vec<RecordId>,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub intent: Intent,
    pub message: String,
    pub confidence: String,
    /// Created, found, deleted or re-tagged records, depending on the intent.
    pub records: Vec<ItemRecord>,
}

/// POST /api/v1/intents
pub async fn apply(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<ApplyIntentRequest>,
) -> AppResult<Json<DataResponse<IntentResponse>>> {
    input.parsed.validate()?;
    let owner = session.owner_id.as_str();

    let (message, records) = match input.parsed.intent {
        Intent::Record => record(&state, owner, &input).await?,
        Intent::Search => search(&state, &input.parsed),
        Intent::Delete => delete(&state, owner, &input).await?,
        Intent::Classify => classify(&state, owner, &input.parsed).await?,
        Intent::Statistics => {
            let stats = collection::statistics(&state.store.load_active());
            (stats.summary(), Vec::new())
        }
    };

    tracing::info!(intent = ?input.parsed.intent, owner = %owner, affected = records.len(), "Intent applied");
    Ok(Json(DataResponse {
        data: IntentResponse {
            intent: input.parsed.intent,
            confidence: input.parsed.confidence_label(),
            message,
            records,
        },
    }))
}

async fn record(
    state: &AppState,
    owner: &str,
    input: &ApplyIntentRequest,
) -> AppResult<(String, Vec<ItemRecord>)> {
    let parsed = &input.parsed;
    let created = {
        let _guard = state.local_lock.lock().await;
        let mut records = state.store.load_active();
        let created = collection::create_record(
            owner,
            &parsed.item,
            &parsed.location,
            &input.raw_input,
            input.source,
            Utc::now(),
        )?;
        records.push(created.clone());
        save_active(&state.store, &records)?;
        mirror(state, owner, vec![MirrorOp::Record(created.clone())]);
        created
    };

    let message = format!(
        "Recorded {} in {} (confidence {})",
        created.item,
        created.location,
        parsed.confidence_label()
    );
    Ok((message, vec![created]))
}

fn search(state: &AppState, parsed: &ParsedIntent) -> (String, Vec<ItemRecord>) {
    let query = if parsed.item.trim().is_empty() {
        parsed.location.trim()
    } else {
        parsed.item.trim()
    };
    if query.is_empty() {
        return ("Nothing to search for".to_string(), Vec::new());
    }

    let records = state.store.load_active();
    let found: Vec<ItemRecord> = collection::search(&records, query).into_iter().cloned().collect();
    let message = if found.is_empty() {
        format!("No matching records found (search: {query})")
    } else {
        format!("Found {} matching records", found.len())
    };
    (message, found)
}

async fn delete(
    state: &AppState,
    owner: &str,
    input: &ApplyIntentRequest,
) -> AppResult<(String, Vec<ItemRecord>)> {
    let keyword = input.parsed.item.trim();
    let targeted = !input.target_ids.is_empty();
    if !targeted && keyword.is_empty() {
        return Ok((
            "Could not determine what to delete; name the item explicitly".to_string(),
            Vec::new(),
        ));
    }

    let moved = {
        let _guard = state.local_lock.lock().await;
        let mut records = state.store.load_active();
        let mut bin = state.store.load_bin();
        let bin_before = bin.clone();
        let (ids, reason) = if targeted {
            (input.target_ids.clone(), "Deleted from search results".to_string())
        } else {
            (
                collection::matching_ids(&records, keyword),
                format!("Keyword delete: {keyword}"),
            )
        };
        let moved = collection::move_to_bin(&mut records, &mut bin, &ids, &reason, Utc::now());
        if !moved.is_empty() {
            save_moved_to_bin(&state.store, &records, &bin, &bin_before)?;
        }
        let ops = moved
            .iter()
            .flat_map(|e| {
                [
                    MirrorOp::DeleteRecord(e.id().to_string()),
                    MirrorOp::BinEntry(e.clone()),
                ]
            })
            .collect();
        mirror(state, owner, ops);
        moved
    };

    let message = match (targeted, moved.len()) {
        (true, 0) => "No search results to delete".to_string(),
        (true, n) => format!("Deleted {n} search results (moved to the recycle bin)"),
        (false, 0) => format!("No matching records found (search: {keyword})"),
        (false, n) => {
            format!("Deleted {n} matching records (moved to the recycle bin, keyword: {keyword})")
        }
    };

    Ok((message, moved.into_iter().map(|e| e.into_record()).collect()))
}

async fn classify(
    state: &AppState,
    owner: &str,
    parsed: &ParsedIntent,
) -> AppResult<(String, Vec<ItemRecord>)> {
    let keyword = parsed.item.trim();
    let tag = parsed.tag_or_default();
    if keyword.is_empty() {
        return Ok((
            "Could not determine which items to tag".to_string(),
            Vec::new(),
        ));
    }

    let changed: Vec<ItemRecord> = {
        let _guard = state.local_lock.lock().await;
        let mut records = state.store.load_active();
        let changed_ids = collection::classify(&mut records, keyword, tag);
        if !changed_ids.is_empty() {
            save_active(&state.store, &records)?;
        }
        let changed: Vec<ItemRecord> = records
            .into_iter()
            .filter(|r| changed_ids.contains(&r.id))
            .collect();
        mirror(state, owner, changed.iter().cloned().map(MirrorOp::Record).collect());
        changed
    };

    let message = if changed.is_empty() {
        format!("No matching items found (search: {keyword})")
    } else {
        format!("Tagged {} items with '{tag}' (keyword: {keyword})", changed.len())
    };

    Ok((message, changed))
}
