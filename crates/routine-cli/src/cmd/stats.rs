use super::Ctx;
use crate::output::{print_json, print_table};
use routine_core::stats;
use routine_core::tracker::status_lookup;

pub fn stats(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let config = ctx.config()?;
    let goal = ctx.goal(&store)?;
    let s = stats::compute_streaks_and_rate(
        status_lookup(&store, goal.id),
        ctx.today()?,
        config.stats.window_days,
        config.stats.recent_window,
    );
    let motivation = stats::motivation_message(s.success_rate);

    if ctx.json {
        return print_json(&serde_json::json!({
            "routine_id": goal.id,
            "stats": s,
            "motivation": motivation,
        }));
    }

    println!("{} · last {} days", goal.title, config.stats.window_days);
    print_table(
        &["RECORDED", "COMPLETED", "SUCCESS", "STREAK", "LONGEST", "THIS WEEK"],
        vec![vec![
            s.total_days.to_string(),
            s.completed_days.to_string(),
            format!("{}%", s.success_rate),
            s.current_streak.to_string(),
            s.longest_streak.to_string(),
            s.this_week_success.to_string(),
        ]],
    );
    println!("\n{motivation}");
    Ok(())
}

pub fn trend(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let config = ctx.config()?;
    let goal = ctx.goal(&store)?;
    let weeks = stats::compute_weekly_trend(
        status_lookup(&store, goal.id),
        ctx.today()?,
        config.stats.trend_weeks,
    );

    if ctx.json {
        return print_json(&weeks);
    }
    let rows = weeks
        .iter()
        .map(|w| {
            vec![
                w.week_label.clone(),
                w.completed.to_string(),
                w.total.to_string(),
                format!("{}%", w.success_rate),
            ]
        })
        .collect();
    print_table(&["WEEK", "COMPLETED", "RECORDED", "SUCCESS"], rows);
    Ok(())
}

pub fn daily(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let config = ctx.config()?;
    let goal = ctx.goal(&store)?;
    let points = stats::compute_daily_series(
        status_lookup(&store, goal.id),
        ctx.today()?,
        config.stats.series_days,
    );

    if ctx.json {
        return print_json(&points);
    }
    let rows = points
        .iter()
        .map(|p| {
            vec![
                p.date_label.clone(),
                p.day_label.clone(),
                if p.completed == 1 { "✓" } else { "·" }.to_string(),
            ]
        })
        .collect();
    print_table(&["DATE", "DAY", "DONE"], rows);
    Ok(())
}

pub fn week(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let goal = ctx.goal(&store)?;
    let progress = stats::week_progress(status_lookup(&store, goal.id), ctx.today()?);

    if ctx.json {
        return print_json(&progress);
    }
    let rows = progress
        .days
        .iter()
        .map(|d| {
            vec![
                d.date.to_string(),
                d.day_label.clone(),
                d.status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["DATE", "DAY", "STATUS"], rows);
    println!(
        "\ncompleted {} · skipped {} · remaining {} · success {}%",
        progress.completed, progress.skipped, progress.remaining, progress.success_rate
    );
    Ok(())
}
