//! Core client implementation
//!
//! This module provides a client implementation that wraps Core directly,
//! providing the same interface as HttpClient but without HTTP overhead.

use super::{Client, ClientError};
use crate::api::server::{AddLevelResponse, SpanResponse};
use crate::gesture::{Gesture, GestureOutcome};
use crate::models::{Forest, TaskId};
use crate::session::TransitionLogEntry;
use crate::view::LevelView;
use crate::Core;

/// A client implementation that wraps Core directly
#[derive(Clone)]
pub struct CoreClient {
    core: Core,
}

impl CoreClient {
    /// Create a new CoreClient with the given Core instance
    pub fn new(core: Core) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &Core {
        &self.core
    }
}

#[async_trait::async_trait]
impl Client for CoreClient {
    async fn get_forest(&self) -> Result<Forest, ClientError> {
        Ok(Forest::clone(&self.core.forest()))
    }

    async fn replace_forest(&self, forest: Forest) -> Result<(), ClientError> {
        self.core.replace_forest(forest).map_err(ClientError::from)
    }

    async fn get_view(&self) -> Result<Vec<LevelView>, ClientError> {
        Ok(self.core.view())
    }

    async fn get_span(
        &self,
        level_index: usize,
        task_id: TaskId,
    ) -> Result<SpanResponse, ClientError> {
        Ok(SpanResponse {
            level_index,
            task_id,
            span: self.core.span(task_id, level_index),
        })
    }

    async fn apply_gesture(&self, gesture: Gesture) -> Result<GestureOutcome, ClientError> {
        self.core.apply_gesture(&gesture).map_err(ClientError::from)
    }

    async fn add_level(&self) -> Result<AddLevelResponse, ClientError> {
        let level_index = self.core.add_level();
        Ok(AddLevelResponse {
            level_index,
            level_count: self.core.forest().level_count(),
        })
    }

    async fn get_history(&self) -> Result<Vec<TransitionLogEntry>, ClientError> {
        Ok(self.core.history())
    }
}
