//! Per-request context: who is asking, and what to tell them afterwards.
//!
//! Authentication lives outside this crate. Callers resolve the current user
//! into a [`Principal`] and pass it in explicitly through a
//! [`RequestContext`]; workflows report their outcome as [`Flash`] messages
//! on the same context.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use trove_records::{SeriesId, UserId};

/// An authenticated user, as far as the browser cares.
pub trait Principal: std::fmt::Debug + Send + Sync {
    fn id(&self) -> UserId;

    /// Privileged users may lock and unlock records.
    fn has_elevated_privilege(&self) -> bool;

    fn is_watching_series(&self, series_id: SeriesId) -> bool;
}

/// Plain [`Principal`] for callers that already know everything up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub elevated: bool,
    pub watching: BTreeSet<SeriesId>,
}
impl User {
    pub fn new(id: UserId) -> Self {
        Self { id, ..Self::default() }
    }

    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    pub fn watching(mut self, series: impl IntoIterator<Item = SeriesId>) -> Self {
        self.watching.extend(series);
        self
    }
}
impl Principal for User {
    fn id(&self) -> UserId {
        self.id
    }

    fn has_elevated_privilege(&self) -> bool {
        self.elevated
    }

    fn is_watching_series(&self, series_id: SeriesId) -> bool {
        self.watching.contains(&series_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot message for the user about the outcome of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct RequestContext {
    principal: Option<Arc<dyn Principal>>,
    flashes: Vec<Flash>,
}
impl RequestContext {
    /// Context for a visitor that is not logged in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Arc<dyn Principal>) -> Self {
        Self { principal: Some(principal), flashes: Vec::new() }
    }

    pub fn principal(&self) -> Option<&dyn Principal> {
        self.principal.as_deref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.principal().map(|p| p.id())
    }

    /// Anonymous visitors are never privileged.
    pub fn is_elevated(&self) -> bool {
        self.principal().is_some_and(|p| p.has_elevated_privilege())
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.flashes.push(Flash { level: FlashLevel::Success, message: message.into() });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.flashes.push(Flash { level: FlashLevel::Error, message: message.into() });
    }

    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    /// Drain pending messages, e.g. once they have been shown.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}
