use super::goal::DraftArgs;
use super::Ctx;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use routine_core::goal::{self, GoalDraft};
use routine_core::tracker;

#[derive(Subcommand)]
pub enum RoutineSubcommand {
    /// Add a routine
    Add(DraftArgs),

    /// List routines with today's status
    List,

    /// Remove a routine
    Remove { id: u64 },
}

pub fn run(ctx: &Ctx, subcmd: RoutineSubcommand) -> anyhow::Result<()> {
    match subcmd {
        RoutineSubcommand::Add(args) => add(ctx, args),
        RoutineSubcommand::List => list(ctx),
        RoutineSubcommand::Remove { id } => remove(ctx, id),
    }
}

fn add(ctx: &Ctx, args: DraftArgs) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    let draft = args.apply(GoalDraft::default())?;
    let routine = goal::add_routine(
        &mut store,
        draft,
        chrono::Utc::now(),
        &mut rand::thread_rng(),
    )
    .context("failed to add routine")?;

    if ctx.json {
        print_json(&routine)?;
    } else {
        println!("Added routine: {} (id {})", routine.title, routine.id);
    }
    Ok(())
}

fn list(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let today = ctx.today()?;
    let routines = goal::list_routines(&store)?;

    if ctx.json {
        let items: Vec<_> = routines
            .iter()
            .map(|r| {
                serde_json::json!({
                    "routine": r,
                    "today": tracker::status_on(&store, r.id, today),
                })
            })
            .collect();
        return print_json(&items);
    }

    if routines.is_empty() {
        println!("No routines. Add one with: routine routine add --title \"...\"");
        return Ok(());
    }

    let rows = routines
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.title.clone(),
                r.frequency.label().to_string(),
                format!("{}분", r.duration),
                r.time.clone(),
                r.streak.to_string(),
                format!("{}%", r.success_rate),
                tracker::status_on(&store, r.id, today)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(
        &["ID", "TITLE", "FREQ", "TIME", "AT", "STREAK", "SUCCESS", "TODAY"],
        rows,
    );
    Ok(())
}

fn remove(ctx: &Ctx, id: u64) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    if !goal::remove_routine(&mut store, id)? {
        anyhow::bail!("routine not found: {id}");
    }
    if ctx.json {
        print_json(&serde_json::json!({ "removed": id }))?;
    } else {
        println!("Removed routine {id}");
    }
    Ok(())
}
