use std::path::Path;

use crate::app::{AppContext, DigestError, Result};
use crate::domain::{Forum, RunOutcome};
use crate::notifier::new_run_id;

pub async fn run_once(ctx: &AppContext, run_id: Option<String>) -> Result<RunOutcome> {
    let run_id = run_id.unwrap_or_else(new_run_id);
    let outcome = ctx.pipeline.run(&run_id).await;

    println!(
        "Run {}: {} delivered, {} failed",
        outcome.run_id,
        outcome.delivered(),
        outcome.failed().count()
    );
    if let Some(e) = &outcome.listing_error {
        eprintln!("  Could not list subscriptions: {}", e);
    }
    for failed in outcome.failed() {
        if let Err(e) = &failed.result {
            eprintln!("  r/{}: {}", failed.forum.name, e);
        }
    }

    Ok(outcome)
}

pub async fn list_forums(ctx: &AppContext) -> Result<()> {
    let forums = ctx.pipeline.list_forums().await?;

    if forums.is_empty() {
        println!("No subscribed forums");
        return Ok(());
    }

    for forum in forums {
        println!("{}\n  {}", forum.name, forum.url);
    }

    Ok(())
}

pub async fn preview(ctx: &AppContext, forum: &str, output: Option<&Path>) -> Result<()> {
    let forum = forum.trim_start_matches("r/");
    if forum.is_empty() {
        return Err(DigestError::Other("forum name is empty".into()));
    }

    let html = ctx.pipeline.preview(&Forum::new(forum)).await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &html).await?;
            println!("Wrote {} bytes to {}", html.len(), path.display());
        }
        None => println!("{}", html),
    }

    Ok(())
}
