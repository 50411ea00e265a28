use super::Ctx;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use routine_core::advisor::{self, Adjustment};
use routine_core::reflection::{self, WeeklyInput, WeeklyReflection};
use routine_core::types::Mood;

#[derive(Subcommand)]
pub enum WeeklySubcommand {
    /// Show this week's statistics and reflection, if written
    Show,

    /// Write this week's reflection (once per week)
    Submit {
        /// How the week went
        #[arg(long)]
        text: String,
        /// great, good, neutral, tired, stressed or motivated
        #[arg(long)]
        mood: Option<String>,
        /// What got in the way
        #[arg(long, default_value = "")]
        challenges: String,
    },
}

pub fn run(ctx: &Ctx, subcmd: WeeklySubcommand) -> anyhow::Result<()> {
    match subcmd {
        WeeklySubcommand::Show => show(ctx),
        WeeklySubcommand::Submit {
            text,
            mood,
            challenges,
        } => submit(ctx, text, mood.as_deref(), challenges),
    }
}

fn show(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let config = ctx.config()?;
    let today = ctx.today()?;
    let goal = ctx.goal(&store)?;
    let (weekly, _) = reflection::weekly_inputs(&store, &goal, today, &config.stats);
    let existing = reflection::load_weekly(&store, today)?;
    let (year, week) = reflection::week_key(today);

    if ctx.json {
        return print_json(&serde_json::json!({
            "year": year,
            "week": week,
            "weekly_stats": weekly,
            "reflection": existing,
        }));
    }

    println!("{year} week {week}");
    println!(
        "completed {} · recorded {} · success {}%",
        weekly.completed_days, weekly.total_days, weekly.success_rate
    );
    match existing {
        Some(r) => print_reflection(&r),
        None => println!("\nNo reflection yet. Write one with: routine weekly submit --text \"...\""),
    }
    Ok(())
}

fn submit(
    ctx: &Ctx,
    text: String,
    mood: Option<&str>,
    challenges: String,
) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    let config = ctx.config()?;
    let today = ctx.today()?;
    let goal = ctx.goal(&store)?;

    reflection::ensure_not_reflected(&store, today)?;
    let input = WeeklyInput {
        reflection: text,
        mood: mood.map(str::parse::<Mood>).transpose()?,
        challenges,
    };
    let record = reflection::submit_weekly(
        &mut store,
        &goal,
        today,
        input,
        &config.stats,
        chrono::Utc::now(),
    )
    .context("failed to save weekly reflection")?;

    if ctx.json {
        return print_json(&record);
    }
    println!("회고 완료! 🎉");
    print_reflection(&record);
    Ok(())
}

fn print_reflection(r: &WeeklyReflection) {
    println!("\n{}", r.ai_insight);
    print_adjustments(&r.suggested_adjustments);
}

fn print_adjustments(adjustments: &[Adjustment]) {
    if adjustments.is_empty() {
        return;
    }
    println!();
    let rows = adjustments
        .iter()
        .map(|a| {
            vec![
                a.kind.to_string(),
                a.current_value.clone(),
                a.suggested_value.clone(),
                a.reason.clone(),
            ]
        })
        .collect();
    print_table(&["ADJUST", "NOW", "SUGGESTED", "WHY"], rows);
}

/// `routine adjust`: suggestions for the current week without writing a
/// reflection.
pub fn adjust(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let config = ctx.config()?;
    let goal = ctx.goal(&store)?;
    let (weekly, failures) = reflection::weekly_inputs(&store, &goal, ctx.today()?, &config.stats);
    let adjustments = advisor::suggest_adjustments(&goal, &weekly, &failures);

    if ctx.json {
        return print_json(&adjustments);
    }
    if adjustments.is_empty() {
        println!("No adjustments suggested. Keep going!");
    } else {
        print_adjustments(&adjustments);
    }
    Ok(())
}
