//! Gesture classification and dispatch
//!
//! A drop event arrives as a source spec, a target spec, and an optional
//! left/right hint. The gesture is classified into exactly one mutation, which
//! then runs against a copy of the forest. The copy is only handed back once the
//! mutation and the invariant check have both succeeded.

use serde::{Deserialize, Serialize};

use crate::models::{Forest, ForestError, Position, TaskId, TaskSpec};

/// A drop event as reported by the drag-and-drop collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gesture {
    /// What was dragged
    pub source: TaskSpec,
    /// What it was dropped on or beside
    pub target: TaskSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// The mutation a gesture resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    DeleteSubtree,
    InsertNewTask,
    InsertWithinLevel,
    Swap,
    Reparent,
    MoveAcrossLevels,
}

/// What a committed gesture did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureOutcome {
    pub kind: GestureKind,
    /// Id of the task created by an insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<TaskId>,
    /// Ids removed by a delete, the dragged task first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<TaskId>,
}

impl GestureOutcome {
    fn new(kind: GestureKind) -> Self {
        Self {
            kind,
            created: None,
            removed: Vec::new(),
        }
    }
}

impl Gesture {
    pub fn new(source: TaskSpec, target: TaskSpec, position: Option<Position>) -> Self {
        Self {
            source,
            target,
            position,
        }
    }

    /// Drop of the create control onto (or beside) `target`
    pub fn create(target: TaskSpec, position: Option<Position>) -> Self {
        Self::new(TaskSpec::create_control(), target, position)
    }

    /// Drop of `source` onto the create control, which doubles as a delete zone
    pub fn delete(source: TaskSpec) -> Self {
        Self::new(source, TaskSpec::create_control(), None)
    }

    /// Decides which mutation this gesture triggers, in priority order:
    /// delete zone, create control, same-level reorder/swap/reparent, and
    /// finally a move across levels.
    pub fn classify(&self) -> Result<GestureKind, ForestError> {
        let Gesture {
            source,
            target,
            position,
        } = self;

        if target.is_create_control() {
            return if source.is_task() {
                Ok(GestureKind::DeleteSubtree)
            } else {
                Err(ForestError::InvalidGesture(format!(
                    "Only tasks can be dropped on the delete zone, got {}",
                    source
                )))
            };
        }

        if source.is_create_control() {
            return Ok(GestureKind::InsertNewTask);
        }

        if !source.is_task() {
            return Err(ForestError::InvalidGesture(format!(
                "Placeholder {} cannot be dragged",
                source
            )));
        }

        if source.level_index != target.level_index {
            return Ok(GestureKind::MoveAcrossLevels);
        }

        match position {
            Some(_) => Ok(GestureKind::InsertWithinLevel),
            None if target.is_task() => Ok(GestureKind::Swap),
            None if target.parent_id.is_some() => Ok(GestureKind::Reparent),
            None => Err(ForestError::InvalidGesture(format!(
                "Placeholder {} has no parent to attach to",
                target
            ))),
        }
    }
}

/// Applies a gesture to a snapshot of the forest.
///
/// Returns the next forest together with what happened. On error the input
/// forest is the current state and nothing needs to be rolled back.
pub fn apply_gesture(
    forest: &Forest,
    gesture: &Gesture,
) -> Result<(Forest, GestureOutcome), ForestError> {
    let kind = gesture.classify()?;
    tracing::debug!("Classified gesture {:?} as {:?}", gesture, kind);

    let Gesture {
        source,
        target,
        position,
    } = gesture;
    let mut next = forest.clone();
    let mut outcome = GestureOutcome::new(kind);

    match kind {
        GestureKind::DeleteSubtree => {
            outcome.removed = next.delete_subtree(source)?;
        }
        GestureKind::InsertNewTask => {
            let id = next.allocate_id();
            outcome.created = Some(next.insert_new_task(target, id, *position)?);
        }
        GestureKind::InsertWithinLevel => {
            let position = position.ok_or_else(|| {
                ForestError::InvalidGesture("Reordering needs a left or right hint".to_string())
            })?;
            next.insert_within_level(source.level_index, source, target, position)?;
        }
        GestureKind::Swap => {
            next.swap(source.level_index, source, target)?;
        }
        GestureKind::Reparent => {
            let parent = target.parent_id.ok_or_else(|| {
                ForestError::InvalidGesture(format!("Placeholder {} has no parent", target))
            })?;
            next.reparent(source.level_index, source.id, parent)?;
        }
        GestureKind::MoveAcrossLevels => {
            next.move_across_levels(source, target, *position)?;
        }
    }

    next.validate()?;
    Ok((next, outcome))
}
