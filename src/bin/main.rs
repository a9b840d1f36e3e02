//! Binary entrypoint for the taskline tool

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    taskline::cli::run().await
}
