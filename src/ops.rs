//! Mutation operations on the task forest
//!
//! Each operation validates everything it needs before touching the forest, so a
//! returned error always means the forest was left unchanged.

use std::collections::HashSet;

use crate::models::{
    Forest, ForestError, Position, Task, TaskId, TaskSpec, DEFAULT_CONTENT, PLACEHOLDER_ID,
};

impl Forest {
    /// Swaps two tasks of the same level.
    ///
    /// On level 0, or when both specs share a parent, the full records trade
    /// places. Otherwise only the parent links are exchanged and both tasks keep
    /// their positions.
    pub fn swap(
        &mut self,
        level_index: usize,
        a: &TaskSpec,
        b: &TaskSpec,
    ) -> Result<(), ForestError> {
        let level = self
            .level(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?;
        let index_a = level
            .index_of(a)
            .ok_or_else(|| ForestError::task_not_found(level_index, a.id))?;
        let index_b = level
            .index_of(b)
            .ok_or_else(|| ForestError::task_not_found(level_index, b.id))?;

        if index_a == index_b {
            return Ok(());
        }

        let tasks = self
            .level_mut(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?
            .tasks_mut();

        if level_index == 0 || a.parent_id == b.parent_id {
            tracing::debug!("Swapping tasks {} and {} on level {}", a.id, b.id, level_index);
            tasks.swap(index_a, index_b);
        } else {
            tracing::debug!(
                "Exchanging parents of tasks {} and {} on level {}",
                a.id,
                b.id,
                level_index
            );
            let parent_a = tasks[index_a].parent_id();
            let parent_b = tasks[index_b].parent_id();
            tasks[index_a].set_parent(parent_b);
            tasks[index_b].set_parent(parent_a);
        }

        Ok(())
    }

    /// Moves `from` next to `to` within one level, adopting `to`'s parent when
    /// the two specs disagree on it.
    pub fn insert_within_level(
        &mut self,
        level_index: usize,
        from: &TaskSpec,
        to: &TaskSpec,
        position: Position,
    ) -> Result<(), ForestError> {
        let level = self
            .level(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?;
        let from_index = level
            .index_of(from)
            .ok_or_else(|| ForestError::task_not_found(level_index, from.id))?;
        let to_index = level
            .index_of(to)
            .ok_or_else(|| ForestError::task_not_found(level_index, to.id))?;

        if from_index == to_index {
            return Ok(());
        }

        let new_parent = (from.parent_id != to.parent_id).then_some(to.parent_id);
        if let Some(parent) = new_parent {
            self.check_parent(level_index, parent)?;
        }

        // Removing the source shifts everything after it one slot left
        let mut slot = if from_index < to_index {
            to_index - 1
        } else {
            to_index
        };
        slot += position.offset();

        tracing::debug!(
            "Moving task {} to slot {} of level {}",
            from.id,
            slot,
            level_index
        );

        let tasks = self
            .level_mut(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?
            .tasks_mut();
        let mut task = tasks.remove(from_index);
        if let Some(parent) = new_parent {
            task.set_parent(parent);
        }
        tasks.insert(slot.min(tasks.len()), task);

        Ok(())
    }

    /// Creates a task with `new_id` relative to `target`.
    ///
    /// * no position, placeholder target: sibling under the placeholder's parent,
    ///   appended to the target's level
    /// * no position, real target: child of the target, appended to the level
    ///   below (grown on demand)
    /// * with a position: sibling of the target, spliced next to it
    pub fn insert_new_task(
        &mut self,
        target: &TaskSpec,
        new_id: TaskId,
        position: Option<Position>,
    ) -> Result<TaskId, ForestError> {
        if new_id <= 0 || self.find(new_id).is_some() {
            return Err(ForestError::InvariantViolation(format!(
                "Task id {} is not available",
                new_id
            )));
        }

        let level_index = target.level_index;
        let level = self
            .level(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?;

        match position {
            None if target.is_placeholder() => {
                self.check_parent(level_index, target.parent_id)?;
                let task = new_task(new_id, target.parent_id);
                self.push_task(level_index, task)?;
            }
            None => {
                if level.index_of(target).is_none() {
                    return Err(ForestError::task_not_found(level_index, target.id));
                }
                let child_level = self.ensure_level(level_index + 1);
                self.push_task(child_level, new_task(new_id, Some(target.id)))?;
            }
            Some(position) => {
                let index = level
                    .index_of(target)
                    .ok_or_else(|| ForestError::task_not_found(level_index, target.id))?;
                self.check_parent(level_index, target.parent_id)?;
                let tasks = self
                    .level_mut(level_index)
                    .ok_or_else(|| ForestError::level_not_found(level_index))?
                    .tasks_mut();
                let slot = (index + position.offset()).min(tasks.len());
                tasks.insert(slot, new_task(new_id, target.parent_id));
            }
        }

        tracing::debug!("Created task {} from target {}", new_id, target);
        Ok(new_id)
    }

    /// Points the task `task_id` on `level_index` at a new parent on the level
    /// above.
    pub fn reparent(
        &mut self,
        level_index: usize,
        task_id: TaskId,
        new_parent_id: TaskId,
    ) -> Result<(), ForestError> {
        let level = self
            .level(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?;
        if level.index_of(task_id).is_none() {
            return Err(ForestError::task_not_found(level_index, task_id));
        }
        self.check_parent(level_index, Some(new_parent_id))?;

        if let Some(task) = self
            .level_mut(level_index)
            .and_then(|level| level.get_mut(task_id))
        {
            tracing::debug!("Reparenting task {} under {}", task_id, new_parent_id);
            task.set_parent(Some(new_parent_id));
        }
        Ok(())
    }

    /// Removes a task and every descendant, then prunes emptied levels.
    /// Returns the removed ids, the task itself first.
    pub fn delete_subtree(&mut self, spec: &TaskSpec) -> Result<Vec<TaskId>, ForestError> {
        let level_index = spec.level_index;
        let level = self
            .level(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?;
        if level.index_of(spec).is_none() {
            return Err(ForestError::task_not_found(level_index, spec.id));
        }

        let mut removed = vec![spec.id];
        removed.extend(
            self.child_index()
                .descendants(level_index, spec.id)
                .into_iter()
                .map(|(_, id)| id),
        );

        let doomed: HashSet<TaskId> = removed.iter().copied().collect();
        for level in self.levels_mut().iter_mut().skip(level_index) {
            level.tasks_mut().retain(|task| !doomed.contains(&task.id()));
        }
        self.prune_empty_levels();

        tracing::debug!("Deleted task {} with {} descendant(s)", spec.id, removed.len() - 1);
        Ok(removed)
    }

    /// Moves a task and its whole subtree to another level.
    ///
    /// * onto a `-1` placeholder: adopts the placeholder's parent, appended to
    ///   the placeholder's level
    /// * onto a real task: becomes its child, appended one level below it
    /// * beside a real task: adopts its parent, spliced next to it
    ///
    /// Descendants shift by the same number of levels as the task, deepest first,
    /// and trailing levels left empty are pruned.
    pub fn move_across_levels(
        &mut self,
        from: &TaskSpec,
        to: &TaskSpec,
        position: Option<Position>,
    ) -> Result<(), ForestError> {
        let from_index = self
            .level(from.level_index)
            .ok_or_else(|| ForestError::level_not_found(from.level_index))?
            .index_of(from)
            .ok_or_else(|| ForestError::task_not_found(from.level_index, from.id))?;
        let target_level = self
            .level(to.level_index)
            .ok_or_else(|| ForestError::level_not_found(to.level_index))?;

        let mut delta = from.level_index as isize - to.level_index as isize;
        let (dest_level, parent) = if to.id == PLACEHOLDER_ID {
            (to.level_index, to.parent_id)
        } else if !to.is_task() {
            return Err(ForestError::InvalidGesture(format!(
                "Cannot move a task onto {}",
                to
            )));
        } else {
            if target_level.index_of(to).is_none() {
                return Err(ForestError::task_not_found(to.level_index, to.id));
            }
            match position {
                None => {
                    delta -= 1;
                    (to.level_index + 1, Some(to.id))
                }
                Some(_) => (to.level_index, to.parent_id),
            }
        };

        let subtree = self.child_index().descendants(from.level_index, from.id);
        let moving: HashSet<TaskId> = subtree
            .iter()
            .map(|(_, id)| *id)
            .chain(std::iter::once(from.id))
            .collect();
        if let Some(parent) = parent.filter(|parent| moving.contains(parent)) {
            return Err(ForestError::InvariantViolation(format!(
                "Task {} cannot move under {}, which belongs to its own subtree",
                from.id, parent
            )));
        }
        self.check_parent(dest_level, parent)?;

        let mut relocations = Vec::with_capacity(subtree.len());
        if delta != 0 {
            for (level_index, id) in subtree {
                let target = usize::try_from(level_index as isize - delta).map_err(|_| {
                    ForestError::InvariantViolation(format!(
                        "Task {} would move above the root level",
                        id
                    ))
                })?;
                relocations.push((level_index, id, target));
            }
        }

        tracing::debug!(
            "Moving task {} from level {} to level {} ({} descendant(s) shift by {})",
            from.id,
            from.level_index,
            dest_level,
            relocations.len(),
            -delta
        );

        let mut task = self
            .level_mut(from.level_index)
            .ok_or_else(|| ForestError::level_not_found(from.level_index))?
            .tasks_mut()
            .remove(from_index);
        task.set_parent(parent);

        self.ensure_level(dest_level);
        let slot = position.and_then(|position| {
            self.level(dest_level)
                .and_then(|level| level.index_of(to))
                .map(|index| index + position.offset())
        });
        let tasks = self
            .level_mut(dest_level)
            .ok_or_else(|| ForestError::level_not_found(dest_level))?
            .tasks_mut();
        match slot {
            Some(slot) => tasks.insert(slot.min(tasks.len()), task),
            _ => tasks.push(task),
        }

        for (level_index, id, target) in relocations {
            let Some(descendant) = self.level_mut(level_index).and_then(|level| level.take(id))
            else {
                continue;
            };
            self.ensure_level(target);
            if let Some(level) = self.level_mut(target) {
                level.tasks_mut().push(descendant);
            }
        }

        self.prune_empty_levels();
        Ok(())
    }

    fn push_task(&mut self, level_index: usize, task: Task) -> Result<(), ForestError> {
        self.level_mut(level_index)
            .ok_or_else(|| ForestError::level_not_found(level_index))?
            .tasks_mut()
            .push(task);
        Ok(())
    }
}

fn new_task(id: TaskId, parent_id: Option<TaskId>) -> Task {
    match parent_id {
        Some(parent) => Task::with_parent(id, parent, DEFAULT_CONTENT),
        None => Task::new(id, DEFAULT_CONTENT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Level, Reference, EMPTY_BRANCH_ID};
    use pretty_assertions::assert_eq;

    fn two_level_forest() -> Forest {
        Forest::from_levels(vec![
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
        ])
        .unwrap()
    }

    fn ids(forest: &Forest, level_index: usize) -> Vec<TaskId> {
        forest
            .level(level_index)
            .map(|level| level.tasks().iter().map(Task::id).collect())
            .unwrap_or_default()
    }

    fn parent_of(forest: &Forest, id: TaskId) -> Option<TaskId> {
        forest.find(id).and_then(|(_, task)| task.parent_id())
    }

    #[test]
    fn test_swap_roots() {
        let mut forest = two_level_forest();
        forest
            .swap(0, &TaskSpec::new(0, 2), &TaskSpec::new(0, 3))
            .unwrap();

        assert_eq!(ids(&forest, 0), vec![1, 3, 2, 4]);
        assert_eq!(parent_of(&forest, 8), Some(3));
    }

    #[test]
    fn test_swap_across_families_exchanges_parents() {
        let mut forest = two_level_forest();
        let a = TaskSpec::with_parent(1, 6, 1);
        let b = TaskSpec::with_parent(1, 7, 4);
        forest.swap(1, &a, &b).unwrap();

        assert_eq!(ids(&forest, 1), vec![5, 6, 7, 8]);
        assert_eq!(parent_of(&forest, 6), Some(4));
        assert_eq!(parent_of(&forest, 7), Some(1));
    }

    #[test]
    fn test_swap_unknown_task_leaves_forest_alone() {
        let mut forest = two_level_forest();
        let before = forest.clone();
        let result = forest.swap(0, &TaskSpec::new(0, 2), &TaskSpec::new(0, 42));

        assert!(matches!(result, Err(ForestError::NotFound(_))));
        assert_eq!(forest, before);
    }

    #[test]
    fn test_insert_within_level_right_and_left() {
        let mut forest = two_level_forest();
        forest
            .insert_within_level(0, &TaskSpec::new(0, 1), &TaskSpec::new(0, 3), Position::Right)
            .unwrap();
        assert_eq!(ids(&forest, 0), vec![2, 3, 1, 4]);

        forest
            .insert_within_level(0, &TaskSpec::new(0, 4), &TaskSpec::new(0, 2), Position::Left)
            .unwrap();
        assert_eq!(ids(&forest, 0), vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_insert_within_level_adopts_target_parent() {
        let mut forest = two_level_forest();
        forest
            .insert_within_level(
                1,
                &TaskSpec::with_parent(1, 5, 1),
                &TaskSpec::with_parent(1, 8, 3),
                Position::Left,
            )
            .unwrap();

        assert_eq!(ids(&forest, 1), vec![6, 7, 5, 8]);
        assert_eq!(parent_of(&forest, 5), Some(3));
    }

    #[test]
    fn test_insert_new_task_variants() {
        let mut forest = two_level_forest();

        // Dropped onto a real task: new child one level down
        let id = forest
            .insert_new_task(&TaskSpec::new(0, 2), 9, None)
            .unwrap();
        assert_eq!(id, 9);
        assert_eq!(ids(&forest, 1), vec![5, 6, 7, 8, 9]);
        assert_eq!(parent_of(&forest, 9), Some(2));

        // Dropped onto a placeholder: sibling under the placeholder's parent
        forest
            .insert_new_task(&TaskSpec::with_parent(1, PLACEHOLDER_ID, 3), 10, None)
            .unwrap();
        assert_eq!(parent_of(&forest, 10), Some(3));
        assert_eq!(forest.level(1).unwrap().index_of(Reference::ById(10)), Some(5));

        // Beside a task: spliced next to it with the same parent
        forest
            .insert_new_task(&TaskSpec::with_parent(1, 5, 1), 11, Some(Position::Right))
            .unwrap();
        assert_eq!(ids(&forest, 1), vec![5, 11, 6, 7, 8, 9, 10]);
        assert_eq!(parent_of(&forest, 11), Some(1));

        // A leaf on the deepest level grows a new level
        forest
            .insert_new_task(&TaskSpec::with_parent(1, 11, 1), 12, None)
            .unwrap();
        assert_eq!(forest.level_count(), 3);
        assert_eq!(ids(&forest, 2), vec![12]);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_insert_new_task_under_empty_branch_is_rejected() {
        let mut forest = two_level_forest();
        forest.add_level();
        let before = forest.clone();

        let result = forest.insert_new_task(&TaskSpec::new(2, EMPTY_BRANCH_ID), 9, None);
        assert!(matches!(result, Err(ForestError::InvariantViolation(_))));
        assert_eq!(forest, before);

        let taken = forest.insert_new_task(&TaskSpec::new(0, 1), 3, None);
        assert!(taken.is_err());
    }

    #[test]
    fn test_reparent_checks_parent_level() {
        let mut forest = two_level_forest();
        forest.reparent(1, 5, 2).unwrap();
        assert_eq!(parent_of(&forest, 5), Some(2));

        let result = forest.reparent(1, 5, 6);
        assert!(matches!(result, Err(ForestError::InvariantViolation(_))));

        let result = forest.reparent(1, 42, 2);
        assert!(matches!(result, Err(ForestError::NotFound(_))));
    }

    #[test]
    fn test_delete_subtree_cascades() {
        let mut forest = Forest::sample();
        let removed = forest.delete_subtree(&TaskSpec::new(0, 1)).unwrap();

        assert_eq!(removed, vec![1, 9, 10, 5, 6]);
        assert_eq!(ids(&forest, 0), vec![2, 3, 4]);
        assert_eq!(ids(&forest, 1), vec![7, 8]);
        assert_eq!(forest.level_count(), 2);
    }

    #[test]
    fn test_move_up_beside_task_carries_subtree() {
        let mut forest = Forest::sample();
        forest
            .move_across_levels(
                &TaskSpec::with_parent(1, 5, 1),
                &TaskSpec::new(0, 2),
                Some(Position::Right),
            )
            .unwrap();

        assert_eq!(ids(&forest, 0), vec![1, 2, 5, 3, 4]);
        assert_eq!(parent_of(&forest, 5), None);
        assert_eq!(ids(&forest, 1), vec![6, 7, 8, 9, 10]);
        assert_eq!(parent_of(&forest, 9), Some(5));
        assert_eq!(forest.level_count(), 2);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_move_onto_task_becomes_child() {
        let mut forest = Forest::sample();
        // Task 5 (with children 9 and 10) dropped onto root 2
        forest
            .move_across_levels(&TaskSpec::with_parent(1, 5, 1), &TaskSpec::new(0, 2), None)
            .unwrap();

        assert_eq!(parent_of(&forest, 5), Some(2));
        assert_eq!(ids(&forest, 1), vec![6, 7, 8, 5]);
        assert_eq!(ids(&forest, 2), vec![9, 10]);
    }

    #[test]
    fn test_move_down_onto_placeholder_grows_levels() {
        let mut forest = Forest::sample();
        // Root 1 and its subtree dropped on the placeholder under task 8
        forest
            .move_across_levels(
                &TaskSpec::new(0, 1),
                &TaskSpec::with_parent(2, PLACEHOLDER_ID, 8),
                None,
            )
            .unwrap();

        assert_eq!(ids(&forest, 0), vec![2, 3, 4]);
        assert_eq!(ids(&forest, 2), vec![1]);
        assert_eq!(ids(&forest, 3), vec![5, 6]);
        assert_eq!(ids(&forest, 4), vec![9, 10]);
        assert_eq!(parent_of(&forest, 1), Some(8));
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_move_under_own_descendant_is_rejected() {
        let mut forest = Forest::sample();
        let before = forest.clone();

        let onto_child =
            forest.move_across_levels(&TaskSpec::new(0, 1), &TaskSpec::with_parent(1, 5, 1), None);
        assert!(matches!(
            onto_child,
            Err(ForestError::InvariantViolation(_))
        ));

        let beside_grandchild = forest.move_across_levels(
            &TaskSpec::new(0, 1),
            &TaskSpec::with_parent(2, 9, 5),
            Some(Position::Left),
        );
        assert!(beside_grandchild.is_err());
        assert_eq!(forest, before);
    }
}
