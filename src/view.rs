//! Span calculation and the display-ready view of a forest
//!
//! The view pads every level with placeholder rows so that each root's subtree
//! reaches the deepest level, which lets the renderer lay the forest out as a
//! grid without holes.

use serde::{Deserialize, Serialize};

use crate::models::{
    ChildIndex, Forest, LevelId, Task, TaskId, EMPTY_BRANCH_ID, PLACEHOLDER_ID,
};

/// One rendered cell of a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewRow {
    /// Position of the row within its level view
    pub key: usize,
    pub level_index: usize,
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    /// Number of grid columns the row covers
    pub span: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ViewRow {
    pub fn is_placeholder(&self) -> bool {
        self.task_id < 0
    }
}

/// The rows of one level, in rendering order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelView {
    pub key: usize,
    pub level_id: LevelId,
    pub rows: Vec<ViewRow>,
}

impl LevelView {
    /// Total grid width covered by the rows of this level
    pub fn width(&self) -> usize {
        self.rows.iter().map(|row| row.span).sum()
    }
}

/// Number of grid columns the subtree of `task_id` (living on `level_index`)
/// occupies. Leaves, placeholders and unknown ids span a single column.
pub fn span(forest: &Forest, task_id: TaskId, level_index: usize) -> usize {
    subtree_span(&forest.child_index(), task_id, level_index)
}

fn subtree_span(index: &ChildIndex<'_>, task_id: TaskId, level_index: usize) -> usize {
    if task_id < 0 {
        return 1;
    }

    let children = index.children(level_index, task_id);
    let mut count = 1;
    if children.len() > 1 {
        count += children.len() - 1;
    }
    for child in children {
        let child_span = subtree_span(index, child.id(), level_index + 1);
        if child_span > 1 {
            count += child_span - 1;
        }
    }
    count
}

/// Materializes the per-level view of the forest.
///
/// Level 0 holds exactly the root tasks. Each row then expands depth-first into
/// the next level: real rows with children emit one row per child, anything
/// else emits a single placeholder.
pub fn build_view(forest: &Forest) -> Vec<LevelView> {
    let index = forest.child_index();
    let mut views: Vec<LevelView> = forest
        .levels()
        .iter()
        .enumerate()
        .map(|(key, level)| LevelView {
            key,
            level_id: level.id(),
            rows: Vec::new(),
        })
        .collect();

    let Some(roots) = forest.level(0) else {
        return views;
    };

    for task in roots.tasks() {
        let key = views[0].rows.len();
        views[0].rows.push(ViewRow {
            key,
            level_index: 0,
            task_id: task.id(),
            parent_id: None,
            span: subtree_span(&index, task.id(), 0),
            content: Some(task.content().to_string()),
        });
        expand_row(&mut views, &index, 0, key);
    }

    views
}

fn expand_row(views: &mut [LevelView], index: &ChildIndex<'_>, level_index: usize, key: usize) {
    let child_level = level_index + 1;
    if child_level >= views.len() {
        return;
    }

    let current_id = views[level_index].rows[key].task_id;
    let children: &[&Task] = if current_id > 0 {
        index.children(level_index, current_id)
    } else {
        &[]
    };

    if children.is_empty() {
        let (task_id, parent_id) = if current_id < 0 {
            (EMPTY_BRANCH_ID, None)
        } else {
            (PLACEHOLDER_ID, Some(current_id))
        };
        let child_key = views[child_level].rows.len();
        views[child_level].rows.push(ViewRow {
            key: child_key,
            level_index: child_level,
            task_id,
            parent_id,
            span: 1,
            content: None,
        });
        expand_row(views, index, child_level, child_key);
        return;
    }

    for child in children {
        let child_key = views[child_level].rows.len();
        views[child_level].rows.push(ViewRow {
            key: child_key,
            level_index: child_level,
            task_id: child.id(),
            parent_id: child.parent_id(),
            span: subtree_span(index, child.id(), child_level),
            content: Some(child.content().to_string()),
        });
        expand_row(views, index, child_level, child_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, Task};
    use pretty_assertions::assert_eq;

    fn ids(view: &LevelView) -> Vec<TaskId> {
        view.rows.iter().map(|row| row.task_id).collect()
    }

    #[test]
    fn test_span_counts_leaf_columns() {
        let forest = Forest::sample();

        assert_eq!(span(&forest, 1, 0), 3);
        assert_eq!(span(&forest, 5, 1), 2);
        assert_eq!(span(&forest, 2, 0), 1);
        assert_eq!(span(&forest, 4, 0), 1);
        assert_eq!(span(&forest, PLACEHOLDER_ID, 1), 1);
        assert_eq!(span(&forest, 99, 0), 1);
    }

    #[test]
    fn test_view_pads_every_level() {
        let view = build_view(&Forest::sample());

        assert_eq!(view.len(), 3);
        assert_eq!(ids(&view[0]), vec![1, 2, 3, 4]);
        assert_eq!(ids(&view[1]), vec![5, 6, -1, 8, 7]);
        assert_eq!(ids(&view[2]), vec![9, 10, -1, -2, -1, -1]);

        // Every level covers the same number of columns
        let width = view[0].width();
        assert_eq!(width, 6);
        assert!(view.iter().all(|level| level.width() == width));
    }

    #[test]
    fn test_placeholder_rows_point_at_their_parent() {
        let view = build_view(&Forest::sample());

        let under_two = &view[1].rows[2];
        assert_eq!(under_two.task_id, PLACEHOLDER_ID);
        assert_eq!(under_two.parent_id, Some(2));
        assert_eq!(under_two.content, None);

        let below_placeholder = &view[2].rows[3];
        assert_eq!(below_placeholder.task_id, EMPTY_BRANCH_ID);
        assert_eq!(below_placeholder.parent_id, None);

        let keys: Vec<usize> = view[2].rows.iter().map(|row| row.key).collect();
        assert_eq!(keys, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_empty_trailing_level_gets_placeholders() {
        let mut forest = Forest::from_levels(vec![Level::with_tasks(
            1,
            vec![Task::new(1, "a"), Task::new(2, "b")],
        )])
        .unwrap();
        forest.add_level();

        let view = build_view(&forest);
        assert_eq!(view[1].level_id, 2);
        assert_eq!(ids(&view[1]), vec![PLACEHOLDER_ID, PLACEHOLDER_ID]);
        assert_eq!(view[1].rows[1].parent_id, Some(2));
    }

    #[test]
    fn test_empty_forest_view() {
        let view = build_view(&Forest::new());
        assert_eq!(view.len(), 1);
        assert!(view[0].rows.is_empty());
    }
}
