use super::Ctx;
use crate::output::print_json;
use anyhow::Context;
use routine_core::responses;
use routine_core::tracker;
use routine_core::types::DayStatus;

/// `routine done` / `routine skip`.
pub fn run(ctx: &Ctx, status: DayStatus) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    let config = ctx.config()?;
    let today = ctx.today()?;
    let mut goal = ctx.goal(&store)?;

    tracker::record_status(
        &mut store,
        &mut goal,
        today,
        status,
        &config.stats,
        chrono::Utc::now(),
    )
    .context("failed to record status")?;

    let message = responses::status_message(status, &mut rand::thread_rng());
    let title_for_toast = ctx.routine.map(|_| goal.title.as_str());
    let (toast_title, toast_body) = responses::toast(status, title_for_toast);

    if ctx.json {
        return print_json(&serde_json::json!({
            "routine_id": goal.id,
            "date": today,
            "status": status,
            "streak": goal.streak,
            "total_days": goal.total_days,
            "success_rate": goal.success_rate,
            "message": message,
        }));
    }

    println!("{toast_title} {toast_body}");
    println!("{message}");
    println!(
        "streak {} · total {} days · success {}%",
        goal.streak, goal.total_days, goal.success_rate
    );
    if status == DayStatus::Skipped {
        println!("\nTell the coach what happened: routine reflect \"...\"");
    }
    Ok(())
}
