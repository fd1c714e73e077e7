//! Lazy artifact listing
//!
//! `list_objects` pages through the store on demand; `list_artifacts` keeps
//! only completion markers and embedded reports and resolves each one's path
//! relative to the listing prefix. Both sequences are finite and cannot be
//! restarted.

use std::collections::VecDeque;

use futures::future;
use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

use super::{ArtifactRole, ObjectInfo, ObjectStore};
use crate::error::{ReportError, Result};

/// A completion marker or embedded report found under the job prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactObject {
    /// Full object name in the bucket
    pub name: String,
    /// Name relative to the listing prefix, without a leading `/`
    pub relative_path: String,
    pub role: ArtifactRole,
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

struct ListState {
    buffered: VecDeque<ObjectInfo>,
    cursor: Cursor,
}

/// Every object under `prefix`, fetching pages only as they are consumed
pub fn list_objects<'a>(
    store: &'a dyn ObjectStore,
    prefix: &'a str,
) -> impl Stream<Item = Result<ObjectInfo>> + Send + 'a {
    let initial = ListState {
        buffered: VecDeque::new(),
        cursor: Cursor::Start,
    };

    stream::try_unfold(initial, move |state| next_object(store, prefix, state))
}

async fn next_object(
    store: &dyn ObjectStore,
    prefix: &str,
    mut state: ListState,
) -> Result<Option<(ObjectInfo, ListState)>> {
    loop {
        if let Some(object) = state.buffered.pop_front() {
            return Ok(Some((object, state)));
        }

        let page_token = match std::mem::replace(&mut state.cursor, Cursor::Done) {
            Cursor::Done => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
        };

        let page = store.list_page(prefix, page_token).await?;
        debug!(count = page.objects.len(), "Listed page");

        if let Some(token) = page.next_page_token {
            state.cursor = Cursor::Next(token);
        }
        state.buffered.extend(page.objects);
    }
}

/// Completion markers and embedded reports under `prefix`
pub fn list_artifacts<'a>(
    store: &'a dyn ObjectStore,
    prefix: &'a str,
) -> impl Stream<Item = Result<ArtifactObject>> + Send + 'a {
    list_objects(store, prefix)
        .try_filter_map(move |object| future::ready(classify_object(object, prefix)))
}

fn classify_object(object: ObjectInfo, prefix: &str) -> Result<Option<ArtifactObject>> {
    let role = match ArtifactRole::classify(&object.name) {
        Some(role @ (ArtifactRole::CompletionMarker | ArtifactRole::EmbeddedReport)) => role,
        _ => return Ok(None),
    };
    let relative_path = relative_path(&object.name, prefix)?;
    debug!(path = %relative_path, ?role, "Classified artifact");

    Ok(Some(ArtifactObject {
        name: object.name,
        relative_path,
        role,
    }))
}

/// Path of `name` after `prefix`
///
/// The prefix must occur exactly once in the name; anything else means the
/// listing is inconsistent with the request.
pub fn relative_path(name: &str, prefix: &str) -> Result<String> {
    if prefix.is_empty() || name.matches(prefix).count() != 1 {
        return Err(ReportError::InvariantViolation(format!(
            "cannot determine path of {} relative to {}",
            name, prefix
        )));
    }
    let (_, rest) = name.split_once(prefix).ok_or_else(|| {
        ReportError::InvariantViolation(format!("{} does not contain {}", name, prefix))
    })?;

    Ok(rest.trim_start_matches('/').to_string())
}
