//! Example client for the taskline API
//!
//! Expects a server started with `taskline serve --example`.

use taskline::api::{Client, HttpClient};
use taskline::{Gesture, Position, TaskSpec};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Create a client with default configuration (localhost:3000)
    // You can customize with ClientConfig if needed
    let client = HttpClient::new();
    println!("Taskline API Client Example");
    println!("---------------------------");

    // Get the forest
    println!("\nFetching forest...");
    let forest = client.get_forest().await?;
    println!(
        "Forest has {} tasks on {} levels",
        forest.task_count(),
        forest.level_count()
    );

    // Create a task under the first root
    println!("\nCreating a task under task 1...");
    let outcome = client
        .apply_gesture(Gesture::create(TaskSpec::new(0, 1), None))
        .await?;
    let Some(created) = outcome.created else {
        return Err("server did not report the new task".into());
    };
    println!("Created task {}", created);

    // Lift it to the root level, right of task 2
    println!("\nMoving task {} beside task 2...", created);
    let outcome = client
        .apply_gesture(Gesture::new(
            TaskSpec::with_parent(1, created, 1),
            TaskSpec::new(0, 2),
            Some(Position::Right),
        ))
        .await?;
    println!("Applied {:?}", outcome.kind);

    let span = client.get_span(0, 1).await?;
    println!("Task 1 now spans {} column(s)", span.span);

    // Delete it again
    println!("\nDeleting task {}...", created);
    let outcome = client
        .apply_gesture(Gesture::delete(TaskSpec::new(0, created)))
        .await?;
    println!("Removed {:?}", outcome.removed);

    println!("\nRecent transitions:");
    for entry in client.get_history().await? {
        println!("  {} {}", entry.action, entry.details.unwrap_or_default());
    }

    println!("\nAll operations completed successfully!");
    Ok(())
}
