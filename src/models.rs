//! Core models for the taskline library
//!
//! This module contains the data model of the layered task forest: tasks, the
//! levels they live on, the forest itself, and the task references handed to the
//! engine by the drag-and-drop collaborator.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Identifier of a task. Real tasks are strictly positive.
pub type TaskId = i64;

/// Stable label of a level, independent of its depth.
pub type LevelId = u32;

/// Sentinel id of the external "create" control (also acts as the delete zone).
pub const CREATE_CONTROL_ID: TaskId = 0;

/// Placeholder row marking an attach point under a real parent.
pub const PLACEHOLDER_ID: TaskId = -1;

/// Placeholder row below another placeholder: a branch with no real task in it.
pub const EMPTY_BRANCH_ID: TaskId = -2;

/// Content given to tasks created through the create control.
pub const DEFAULT_CONTENT: &str = "New Task";

/// Errors produced by forest operations.
///
/// Every error leaves the forest it was raised against untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid gesture: {0}")]
    InvalidGesture(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl ForestError {
    pub(crate) fn level_not_found(level_index: usize) -> Self {
        ForestError::NotFound(format!("Level {}", level_index))
    }

    pub(crate) fn task_not_found(level_index: usize, id: TaskId) -> Self {
        ForestError::NotFound(format!("Task {} on level {}", id, level_index))
    }
}

/// A single task of the forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<TaskId>,
    content: String,
}

impl Task {
    /// Creates a root task
    pub fn new(id: TaskId, content: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            content: content.into(),
        }
    }

    /// Creates a task attached to the given parent
    pub fn with_parent(id: TaskId, parent_id: TaskId, content: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
            content: content.into(),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub(crate) fn set_parent(&mut self, parent_id: Option<TaskId>) {
        self.parent_id = parent_id;
    }
}

/// Reference to a task as supplied by the drag collaborator.
///
/// `level_index` is the depth of the level holding the task, `parent_id` is the
/// parent the collaborator saw when the drag started. Placeholder rows carry a
/// negative id and the create control carries [`CREATE_CONTROL_ID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub level_index: usize,
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
}

impl TaskSpec {
    pub fn new(level_index: usize, id: TaskId) -> Self {
        Self {
            level_index,
            id,
            parent_id: None,
        }
    }

    pub fn with_parent(level_index: usize, id: TaskId, parent_id: TaskId) -> Self {
        Self {
            level_index,
            id,
            parent_id: Some(parent_id),
        }
    }

    /// The spec of the create control
    pub fn create_control() -> Self {
        Self::new(0, CREATE_CONTROL_ID)
    }

    pub fn is_create_control(&self) -> bool {
        self.id == CREATE_CONTROL_ID
    }

    pub fn is_placeholder(&self) -> bool {
        self.id < 0
    }

    /// True when the spec names a real task
    pub fn is_task(&self) -> bool {
        self.id > 0
    }
}

impl fmt::Display for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent_id {
            Some(parent) => write!(f, "{},{},{}", self.level_index, self.id, parent),
            None => write!(f, "{},{}", self.level_index, self.id),
        }
    }
}

/// Parses a string representation of a task spec (e.g., "1,5" or "1,5,1")
/// into a [`TaskSpec`]: level index, task id, and optional parent id.
pub fn parse_spec(spec_str: &str) -> Result<TaskSpec, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec_str.split(',').map(str::trim).collect();

    match parts.as_slice() {
        [level, id] => Ok(TaskSpec::new(level.parse()?, id.parse()?)),
        [level, id, parent] => Ok(TaskSpec::with_parent(
            level.parse()?,
            id.parse()?,
            parent.parse()?,
        )),
        _ => Err(format!(
            "Invalid task spec '{}': expected level,id[,parent]",
            spec_str
        )
        .into()),
    }
}

/// Which side of the hovered task a drop lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

impl Position {
    /// Offset applied to the hovered task's index when splicing
    pub fn offset(self) -> usize {
        match self {
            Position::Left => 0,
            Position::Right => 1,
        }
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            other => Err(format!("Unknown position '{}': use left or right", other)),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Left => f.write_str("left"),
            Position::Right => f.write_str("right"),
        }
    }
}

/// A task named either by bare id or by a full spec, resolved once at the API
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    ById(TaskId),
    BySpec(TaskSpec),
}

impl Reference {
    pub fn id(&self) -> TaskId {
        match self {
            Reference::ById(id) => *id,
            Reference::BySpec(spec) => spec.id,
        }
    }
}

impl From<TaskId> for Reference {
    fn from(id: TaskId) -> Self {
        Reference::ById(id)
    }
}

impl From<TaskSpec> for Reference {
    fn from(spec: TaskSpec) -> Self {
        Reference::BySpec(spec)
    }
}

impl From<&TaskSpec> for Reference {
    fn from(spec: &TaskSpec) -> Self {
        Reference::BySpec(*spec)
    }
}

/// One depth tier of the forest (a "pool" of tasks)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    id: LevelId,
    tasks: Vec<Task>,
}

impl Level {
    /// Creates an empty level with the given stable id
    pub fn new(id: LevelId) -> Self {
        Self {
            id,
            tasks: Vec::new(),
        }
    }

    pub fn with_tasks(id: LevelId, tasks: Vec<Task>) -> Self {
        Self { id, tasks }
    }

    pub fn id(&self) -> LevelId {
        self.id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Position of the referenced task within this level
    pub fn index_of(&self, reference: impl Into<Reference>) -> Option<usize> {
        let id = reference.into().id();
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    /// Ids of the tasks in this level whose parent is `parent`, in level order
    pub fn child_ids(&self, parent: impl Into<Reference>) -> Vec<TaskId> {
        let parent_id = parent.into().id();
        self.tasks
            .iter()
            .filter(|task| task.parent_id == Some(parent_id))
            .map(|task| task.id)
            .collect()
    }

    /// Removes the task with the given id, returning it
    pub(crate) fn take(&mut self, id: TaskId) -> Option<Task> {
        self.index_of(id).map(|index| self.tasks.remove(index))
    }
}

/// The full ordered sequence of levels.
///
/// Level 0 always exists. Every task on level L > 0 has its parent on level L-1,
/// and task ids are unique across all levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forest {
    levels: Vec<Level>,
    /// Highest id ever handed out, so that deleting the newest task does not
    /// make its id available again.
    #[serde(default)]
    last_allocated_id: TaskId,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl Forest {
    /// Creates a forest holding a single empty root level
    pub fn new() -> Self {
        Self {
            levels: vec![Level::new(1)],
            last_allocated_id: 0,
        }
    }

    /// Creates a forest from prebuilt levels, checking its invariants
    pub fn from_levels(levels: Vec<Level>) -> Result<Self, ForestError> {
        let forest = Self {
            levels,
            last_allocated_id: 0,
        };
        forest.validate()?;
        Ok(forest)
    }

    /// The demonstration forest: four roots, four children, and two grandchildren
    pub fn sample() -> Self {
        Self {
            levels: vec![
                Level::with_tasks(
                    1,
                    vec![
                        Task::new(1, "Task 1"),
                        Task::new(2, "Task 2"),
                        Task::new(3, "Task 3"),
                        Task::new(4, "Task 4"),
                    ],
                ),
                Level::with_tasks(
                    2,
                    vec![
                        Task::with_parent(5, 1, "Task 5"),
                        Task::with_parent(6, 1, "Task 6"),
                        Task::with_parent(7, 4, "Task 7"),
                        Task::with_parent(8, 3, "Task 8"),
                    ],
                ),
                Level::with_tasks(
                    3,
                    vec![
                        Task::with_parent(9, 5, "Task 9"),
                        Task::with_parent(10, 5, "Task 10"),
                    ],
                ),
            ],
            last_allocated_id: 0,
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub(crate) fn levels_mut(&mut self) -> &mut Vec<Level> {
        &mut self.levels
    }

    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub(crate) fn level_mut(&mut self, index: usize) -> Option<&mut Level> {
        self.levels.get_mut(index)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn task_count(&self) -> usize {
        self.levels.iter().map(Level::len).sum()
    }

    /// Finds a task anywhere in the forest, returning its level index
    pub fn find(&self, id: TaskId) -> Option<(usize, &Task)> {
        self.levels
            .iter()
            .enumerate()
            .find_map(|(index, level)| level.get(id).map(|task| (index, task)))
    }

    /// Next unused task id: one past the highest id present or ever allocated
    pub fn next_id(&self) -> TaskId {
        let max_present = self
            .levels
            .iter()
            .flat_map(|level| level.tasks.iter())
            .map(|task| task.id)
            .max()
            .unwrap_or(0);

        max_present.max(self.last_allocated_id) + 1
    }

    /// Reserves the next id
    pub(crate) fn allocate_id(&mut self) -> TaskId {
        let id = self.next_id();
        self.last_allocated_id = id;
        id
    }

    /// Builds the parent to children index of this forest
    pub fn child_index(&self) -> ChildIndex<'_> {
        ChildIndex::build(self)
    }

    /// Checks that `parent` is an acceptable parent for a task on `level_index`
    pub(crate) fn check_parent(
        &self,
        level_index: usize,
        parent: Option<TaskId>,
    ) -> Result<(), ForestError> {
        match (level_index, parent) {
            (0, None) => Ok(()),
            (0, Some(parent)) => Err(ForestError::InvariantViolation(format!(
                "Root-level tasks cannot have a parent (got {})",
                parent
            ))),
            (_, None) => Err(ForestError::InvariantViolation(format!(
                "Tasks on level {} need a parent",
                level_index
            ))),
            (_, Some(parent)) => {
                let parent_level = level_index - 1;
                match self.level(parent_level) {
                    Some(level) if level.index_of(parent).is_some() => Ok(()),
                    _ => Err(ForestError::InvariantViolation(format!(
                        "Parent {} does not live on level {}",
                        parent, parent_level
                    ))),
                }
            }
        }
    }

    /// Verifies the forest invariants: level 0 exists, ids are positive and
    /// unique, and every task's parent lives on the level directly above it.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.levels.is_empty() {
            return Err(ForestError::InvariantViolation(
                "A forest needs at least one level".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut previous_ids: HashSet<TaskId> = HashSet::new();

        for (index, level) in self.levels.iter().enumerate() {
            let mut level_ids = HashSet::with_capacity(level.len());
            for task in &level.tasks {
                if task.id <= 0 {
                    return Err(ForestError::InvariantViolation(format!(
                        "Task id {} on level {} is reserved",
                        task.id, index
                    )));
                }
                if !seen.insert(task.id) {
                    return Err(ForestError::InvariantViolation(format!(
                        "Task id {} appears more than once",
                        task.id
                    )));
                }

                match (index, task.parent_id) {
                    (0, None) => {}
                    (0, Some(parent)) => {
                        return Err(ForestError::InvariantViolation(format!(
                            "Root task {} has parent {}",
                            task.id, parent
                        )))
                    }
                    (_, None) => {
                        return Err(ForestError::InvariantViolation(format!(
                            "Task {} on level {} has no parent",
                            task.id, index
                        )))
                    }
                    (_, Some(parent)) if !previous_ids.contains(&parent) => {
                        return Err(ForestError::InvariantViolation(format!(
                            "Task {} on level {} has parent {} outside level {}",
                            task.id,
                            index,
                            parent,
                            index - 1
                        )))
                    }
                    _ => {}
                }
                level_ids.insert(task.id);
            }
            previous_ids = level_ids;
        }

        Ok(())
    }
}

/// Parent to ordered-children index over a forest.
///
/// Entry `L` maps a task on level `L` to its children on level `L + 1`, in
/// level order.
pub struct ChildIndex<'a> {
    levels: Vec<HashMap<TaskId, Vec<&'a Task>>>,
}

impl<'a> ChildIndex<'a> {
    pub fn build(forest: &'a Forest) -> Self {
        let mut levels: Vec<HashMap<TaskId, Vec<&'a Task>>> =
            vec![HashMap::new(); forest.levels.len()];

        for (index, level) in forest.levels.iter().enumerate().skip(1) {
            for task in &level.tasks {
                if let Some(parent) = task.parent_id {
                    levels[index - 1].entry(parent).or_default().push(task);
                }
            }
        }

        Self { levels }
    }

    /// Children of the task `parent` living on `level_index`
    pub fn children(&self, level_index: usize, parent: TaskId) -> &[&'a Task] {
        self.levels
            .get(level_index)
            .and_then(|map| map.get(&parent))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All descendants of a task as `(level index, id)` pairs, deepest first:
    /// every task appears after its own descendants.
    pub fn descendants(&self, level_index: usize, id: TaskId) -> Vec<(usize, TaskId)> {
        let mut out = Vec::new();
        self.collect_descendants(level_index, id, &mut out);
        out
    }

    fn collect_descendants(&self, level_index: usize, id: TaskId, out: &mut Vec<(usize, TaskId)>) {
        for child in self.children(level_index, id) {
            self.collect_descendants(level_index + 1, child.id, out);
            out.push((level_index + 1, child.id));
        }
    }
}
