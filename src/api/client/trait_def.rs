//! Client trait definition
//!
//! This module defines the `Client` trait that abstracts over different client implementations.

use super::ClientError;
use crate::api::server::{AddLevelResponse, SpanResponse};
use crate::gesture::{Gesture, GestureOutcome};
use crate::models::{Forest, TaskId};
use crate::session::TransitionLogEntry;
use crate::view::LevelView;

/// Trait defining the API client interface for the taskline service
#[async_trait::async_trait]
pub trait Client {
    /// Get the full forest
    async fn get_forest(&self) -> Result<Forest, ClientError>;

    /// Replace the forest wholesale
    async fn replace_forest(&self, forest: Forest) -> Result<(), ClientError>;

    /// Get the padded per-level view
    async fn get_view(&self) -> Result<Vec<LevelView>, ClientError>;

    /// Get the column span of a task
    async fn get_span(&self, level_index: usize, task_id: TaskId)
        -> Result<SpanResponse, ClientError>;

    /// Apply a drop gesture
    async fn apply_gesture(&self, gesture: Gesture) -> Result<GestureOutcome, ClientError>;

    /// Append an empty level
    async fn add_level(&self) -> Result<AddLevelResponse, ClientError>;

    /// Recent state transitions
    async fn get_history(&self) -> Result<Vec<TransitionLogEntry>, ClientError>;
}
