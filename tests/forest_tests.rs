use pretty_assertions::assert_eq;
use taskline::models::{Level, Reference, Task, PLACEHOLDER_ID};
use taskline::{
    apply_gesture, build_view, span, Forest, ForestError, Gesture, GestureKind, Position, TaskId,
    TaskSpec,
};

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

fn apply(forest: &Forest, gesture: Gesture) -> Forest {
    let (next, _) = apply_gesture(forest, &gesture).unwrap();
    next
}

#[test]
fn test_two_level_scenario() {
    let forest = two_level_forest();
    assert_eq!(span(&forest, 1, 0), 2);

    // Swapping two roots
    let swapped = apply(
        &forest,
        Gesture::new(TaskSpec::new(0, 2), TaskSpec::new(0, 3), None),
    );
    assert_eq!(ids(&swapped, 0), vec![1, 3, 2, 4]);

    // Lifting a child beside a root
    let lifted = apply(
        &forest,
        Gesture::new(
            TaskSpec::with_parent(1, 5, 1),
            TaskSpec::new(0, 2),
            Some(Position::Right),
        ),
    );
    assert_eq!(ids(&lifted, 0), vec![1, 2, 5, 3, 4]);
    assert_eq!(lifted.find(5).unwrap().1.parent_id(), None);

    // Deleting a root cascades to its children
    let deleted = apply(&forest, Gesture::delete(TaskSpec::new(0, 1)));
    assert_eq!(ids(&deleted, 1), vec![7, 8]);
    assert_eq!(deleted.task_count(), 5);
}

#[test]
fn test_three_level_move_relocates_descendants() {
    let forest = Forest::sample();
    let moved = apply(
        &forest,
        Gesture::new(
            TaskSpec::with_parent(1, 5, 1),
            TaskSpec::new(0, 4),
            Some(Position::Right),
        ),
    );

    assert_eq!(moved.level_count(), 2);
    assert_eq!(ids(&moved, 0), vec![1, 2, 3, 4, 5]);
    assert_eq!(ids(&moved, 1), vec![6, 7, 8, 9, 10]);
    assert_eq!(moved.find(9).unwrap().1.parent_id(), Some(5));
    assert_eq!(moved.find(10).unwrap().1.parent_id(), Some(5));
}

fn error_kind(error: &ForestError) -> &'static str {
    match error {
        ForestError::NotFound(_) => "not found",
        ForestError::InvalidGesture(_) => "invalid gesture",
        ForestError::InvariantViolation(_) => "invariant violation",
    }
}

fn parents(forest: &Forest, level_index: usize) -> Vec<(TaskId, Option<TaskId>)> {
    forest
        .level(level_index)
        .map(|level| {
            level
                .tasks()
                .iter()
                .map(|task| (task.id(), task.parent_id()))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_invariants_hold_across_gesture_sequences() {
    let steps: Vec<(Gesture, Result<GestureKind, &str>)> = vec![
        (
            Gesture::create(TaskSpec::new(0, 3), None),
            Ok(GestureKind::InsertNewTask),
        ),
        (
            Gesture::new(TaskSpec::new(0, 1), TaskSpec::new(0, 4), Some(Position::Left)),
            Ok(GestureKind::InsertWithinLevel),
        ),
        (
            Gesture::new(TaskSpec::with_parent(2, 9, 5), TaskSpec::new(0, 2), None),
            Ok(GestureKind::MoveAcrossLevels),
        ),
        (
            Gesture::new(TaskSpec::with_parent(1, 6, 1), TaskSpec::with_parent(1, 7, 4), None),
            Ok(GestureKind::Swap),
        ),
        // Task 10 sits under task 1 through task 5
        (
            Gesture::new(TaskSpec::new(0, 1), TaskSpec::with_parent(2, 10, 5), None),
            Err("invariant violation"),
        ),
        (
            Gesture::create(TaskSpec::with_parent(2, PLACEHOLDER_ID, 9), None),
            Ok(GestureKind::InsertNewTask),
        ),
        (
            Gesture::delete(TaskSpec::with_parent(1, 5, 1)),
            Ok(GestureKind::DeleteSubtree),
        ),
        (
            Gesture::new(
                TaskSpec::with_parent(1, 8, 3),
                TaskSpec::with_parent(1, PLACEHOLDER_ID, 2),
                None,
            ),
            Ok(GestureKind::Reparent),
        ),
        (
            Gesture::create(TaskSpec::new(0, 2), Some(Position::Right)),
            Ok(GestureKind::InsertNewTask),
        ),
        (
            Gesture::delete(TaskSpec::new(0, 3)),
            Ok(GestureKind::DeleteSubtree),
        ),
    ];

    let mut forest = Forest::sample();
    let mut created = Vec::new();
    for (step, (gesture, expected)) in steps.into_iter().enumerate() {
        match apply_gesture(&forest, &gesture) {
            Ok((next, outcome)) => {
                assert_eq!(Ok::<_, &str>(outcome.kind), expected, "step {}", step);
                next.validate().unwrap();
                created.extend(outcome.created);
                forest = next;
            }
            Err(e) => {
                assert_eq!(Err::<GestureKind, _>(error_kind(&e)), expected, "step {}: {}", step, e);
                forest.validate().unwrap();
            }
        }
    }

    assert_eq!(created, vec![11, 12, 13]);
    assert_eq!(ids(&forest, 0), vec![2, 13, 1, 4]);
    assert_eq!(
        parents(&forest, 1),
        vec![(6, Some(4)), (7, Some(1)), (8, Some(2)), (9, Some(2))]
    );
    assert_eq!(parents(&forest, 2), vec![(12, Some(9))]);
}

#[test]
fn test_ids_survive_deleting_the_newest_task() {
    let mut forest = Forest::sample();
    let mut created = Vec::new();

    for _ in 0..3 {
        let (next, outcome) =
            apply_gesture(&forest, &Gesture::create(TaskSpec::new(0, 4), None)).unwrap();
        let id = outcome.created.unwrap();
        created.push(id);

        // Remove it straight away, freeing the highest id
        let (next, _) =
            apply_gesture(&next, &Gesture::delete(TaskSpec::with_parent(1, id, 4))).unwrap();
        forest = next;
    }

    assert_eq!(created, vec![11, 12, 13]);
    assert_eq!(forest.next_id(), 14);
}

#[test]
fn test_view_completeness() {
    let mut forest = Forest::sample();
    forest.add_level();

    let view = build_view(&forest);
    assert_eq!(view.len(), forest.level_count());

    for level_index in 1..view.len() {
        let level = forest.level(level_index).unwrap();
        let expected: usize = view[level_index - 1]
            .rows
            .iter()
            .map(|row| {
                if row.task_id > 0 {
                    level.child_ids(Reference::ById(row.task_id)).len().max(1)
                } else {
                    1
                }
            })
            .sum();
        assert_eq!(view[level_index].rows.len(), expected, "level {}", level_index);
    }

    for level in &view {
        assert!(level.rows.iter().all(|row| row.span >= 1));
        assert_eq!(level.width(), view[0].width());
    }
}

#[test]
fn test_swap_symmetry() {
    let forest = Forest::sample();
    let pairs = [
        (TaskSpec::new(0, 1), TaskSpec::new(0, 4)),
        (TaskSpec::with_parent(1, 5, 1), TaskSpec::with_parent(1, 6, 1)),
        (TaskSpec::with_parent(1, 6, 1), TaskSpec::with_parent(1, 8, 3)),
    ];

    for (a, b) in pairs {
        let ab = apply(&forest, Gesture::new(a, b, None));
        let ba = apply(&forest, Gesture::new(b, a, None));
        assert_eq!(ab, ba);
    }

    // Different parents: only the parents trade places
    let swapped = apply(
        &forest,
        Gesture::new(
            TaskSpec::with_parent(1, 6, 1),
            TaskSpec::with_parent(1, 8, 3),
            None,
        ),
    );
    assert_eq!(ids(&swapped, 1), ids(&forest, 1));
    assert_eq!(swapped.find(6).unwrap().1.parent_id(), Some(3));
    assert_eq!(swapped.find(8).unwrap().1.parent_id(), Some(1));
}

#[test]
fn test_swap_twice_restores_the_forest() {
    let forest = Forest::sample();
    let pairs = [
        // Whole records trade places
        (TaskSpec::new(0, 1), TaskSpec::new(0, 4)),
        (TaskSpec::with_parent(1, 5, 1), TaskSpec::with_parent(1, 6, 1)),
        // Only the parents trade places
        (TaskSpec::with_parent(1, 6, 1), TaskSpec::with_parent(1, 8, 3)),
    ];

    for (a, b) in pairs {
        let once = apply(&forest, Gesture::new(a, b, None));
        assert_ne!(once, forest);

        // The second swap addresses the tasks where the first left them
        let (a_again, b_again) = match (a.parent_id, b.parent_id) {
            (Some(pa), Some(pb)) if pa != pb => (
                TaskSpec::with_parent(a.level_index, a.id, pb),
                TaskSpec::with_parent(b.level_index, b.id, pa),
            ),
            _ => (a, b),
        };
        let twice = apply(&once, Gesture::new(a_again, b_again, None));
        assert_eq!(twice, forest);
    }
}

#[test]
fn test_rejected_gestures_name_their_cause() {
    let forest = Forest::sample();

    let missing = Gesture::new(TaskSpec::new(0, 99), TaskSpec::new(0, 1), Some(Position::Left));
    assert!(matches!(
        apply_gesture(&forest, &missing),
        Err(ForestError::NotFound(_))
    ));

    let meaningless = Gesture::new(TaskSpec::create_control(), TaskSpec::create_control(), None);
    assert!(matches!(
        apply_gesture(&forest, &meaningless),
        Err(ForestError::InvalidGesture(_))
    ));

    let cycle = Gesture::new(TaskSpec::new(0, 1), TaskSpec::with_parent(1, 5, 1), None);
    assert!(matches!(
        apply_gesture(&forest, &cycle),
        Err(ForestError::InvariantViolation(_))
    ));

    assert_eq!(
        Gesture::new(TaskSpec::new(0, 1), TaskSpec::with_parent(1, 5, 1), None)
            .classify()
            .unwrap(),
        GestureKind::MoveAcrossLevels
    );
}
