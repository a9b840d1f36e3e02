//! Guide module for generating context-appropriate help content
//!
//! The same gesture reference is rendered for the command line and for HTTP
//! callers; only the examples differ.

/// Mode for guide generation
#[derive(Debug, Clone, Copy)]
pub enum GuideMode {
    /// Command-line interface mode
    Cli,
    /// Raw HTTP API mode
    Api,
}

/// Generate a comprehensive guide string for the specified mode
pub fn get_guide_string(mode: GuideMode) -> String {
    let config = match mode {
        GuideMode::Cli => GuideConfig::cli(),
        GuideMode::Api => GuideConfig::api(),
    };

    format!(
        r#"=== {title} ===

{overview}

{task_specs}

{gestures}

{examples}

{levels}"#,
        title = config.title,
        overview = get_overview_section(),
        task_specs = config.task_specs,
        gestures = get_gestures_section(),
        examples = config.examples,
        levels = get_levels_section(),
    )
}

/// Configuration for different guide modes
struct GuideConfig {
    title: &'static str,
    task_specs: String,
    examples: String,
}

impl GuideConfig {
    fn cli() -> Self {
        let env_var = "TASKLINE_SERVER";

        Self {
            title: "TASKLINE GUIDE",
            task_specs: format!(
                r#"== NAMING TASKS ==

Commands name a task as LEVEL,ID[,PARENT]:
   1,5,1    task 5 on level 1, child of task 1
   0,2      root task 2
   1,-1,2   the empty slot under task 2 on level 1

Placeholders use id -1 (a free slot under a real task) and -2 (a slot below
another placeholder). Run `taskline view` to see every id and slot.

The CLI talks to a running server (`taskline serve`). Point it elsewhere with
--server or {env_var}."#
            ),
            examples: r#"== EXAMPLES ==

   $ taskline serve --example          # start with the demonstration forest
   $ taskline view                     # print the grid
   $ taskline drop 0,2 0,3             # swap two roots
   $ taskline drop 1,5,1 0,2 --position right
                                        # lift task 5 to the root level
   $ taskline drop 1,7,4 1,-1,2        # give task 7 to parent 2
   $ taskline create 1,-1,2            # new task under task 2
   $ taskline create 0,4 --position left
                                        # new root left of task 4
   $ taskline delete 0,1               # remove task 1 and everything below it
   $ taskline span 0 1                 # columns covered by task 1
   $ taskline add-level                # append an empty level"#
                .to_string(),
        }
    }

    fn api() -> Self {
        Self {
            title: "TASKLINE API GUIDE",
            task_specs: r#"== NAMING TASKS ==

Gestures name tasks with JSON specs:
   {"levelIndex": 1, "id": 5, "parentId": 1}

Placeholders use id -1 (a free slot under a real task, parentId set) and -2
(a slot below another placeholder, no parentId). The create control is id 0.
GET /api/view lists every row, including placeholders, in rendering order."#
                .to_string(),
            examples: r#"== ENDPOINTS ==

   GET  /api/forest            current forest
   PUT  /api/forest            replace the forest (validated)
   GET  /api/view              padded per-level rows with spans
   GET  /api/span/:level/:id   columns covered by one task
   POST /api/gesture           {"source": ..., "target": ..., "position": "left"|"right"}
   POST /api/levels            append an empty level
   GET  /api/history           recent transitions
   GET  /api/guide             this guide

Errors: 404 when a task or level is missing, 400 for gestures that mean
nothing, 409 when the edit would break the forest."#
                .to_string(),
        }
    }
}

/// Get the overview section (shared between modes)
fn get_overview_section() -> &'static str {
    r#"Taskline keeps tasks in a layered forest and edits it through drag-and-drop
gestures.

== OVERVIEW ==

- Tasks live on levels. Level 0 holds the roots.
- Every task below level 0 has its parent on the level directly above.
- Each task covers as many grid columns as its subtree has leaf slots, so
  children always line up under their parent."#
}

/// Get the gestures section (shared between modes)
fn get_gestures_section() -> &'static str {
    r#"== GESTURES ==

A gesture drops a SOURCE onto a TARGET, optionally on its left or right side.
The first matching rule wins:

  1. Task onto the create control (id 0)        delete the task and its subtree
  2. Create control onto anything               insert a new task there
  3. Same level, with left/right                reorder within the level
  4. Same level, onto a task                    swap the two tasks
  5. Same level, onto a placeholder             take the placeholder's parent
  6. Different levels                           move the whole subtree

Moves keep the subtree's shape: every descendant shifts by the same number of
levels. A task cannot be moved under its own descendants."#
}

/// Get the levels section (shared between modes)
fn get_levels_section() -> &'static str {
    r#"== LEVELS ==

  • Levels are created on demand when a move or insert needs a deeper one
  • Empty trailing levels disappear after deletes and moves
  • An explicitly added level stays until a delete or move prunes it
  • Task ids are never reused, even after the task is deleted"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guides_share_gesture_reference() {
        let cli = get_guide_string(GuideMode::Cli);
        let api = get_guide_string(GuideMode::Api);

        assert!(cli.starts_with("=== TASKLINE GUIDE ==="));
        assert!(cli.contains("TASKLINE_SERVER"));
        assert!(api.contains("POST /api/gesture"));
        for guide in [&cli, &api] {
            assert!(guide.contains("== GESTURES =="));
            assert!(guide.contains("== LEVELS =="));
        }
    }
}
