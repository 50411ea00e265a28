use super::Ctx;
use crate::output::{print_json, print_table};
use anyhow::{anyhow, Context};
use clap::{Args, Subcommand};
use routine_core::goal::{self, Goal, GoalDraft, GOAL_SUGGESTIONS, PRESET_CRITERIA};
use routine_core::types::{Difficulty, Frequency};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum GoalSubcommand {
    /// Create the goal, or edit the fields given
    Set(DraftArgs),

    /// Show the goal and its counters
    Show,

    /// List suggested starter goals and preset success criteria
    Suggestions,
}

/// Goal fields accepted on the command line. Omitted fields keep their
/// current (or default) values.
#[derive(Args, Default)]
pub struct DraftArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// daily, weekdays, alternate or weekly
    #[arg(long)]
    pub frequency: Option<String>,
    /// Minutes per session
    #[arg(long)]
    pub duration: Option<u32>,
    /// Start time, HH:MM
    #[arg(long)]
    pub time: Option<String>,
    /// easy, medium or hard
    #[arg(long)]
    pub difficulty: Option<String>,
    /// Custom success criterion (repeatable)
    #[arg(long = "criterion")]
    pub criteria: Vec<String>,
    /// Preset criterion number from `goal suggestions` (repeatable)
    #[arg(long = "preset")]
    pub presets: Vec<usize>,
    /// Start from suggested goal number N
    #[arg(long)]
    pub suggestion: Option<usize>,
}

impl DraftArgs {
    pub fn apply(self, base: GoalDraft) -> anyhow::Result<GoalDraft> {
        let mut draft = match self.suggestion {
            Some(n) => {
                let s = n
                    .checked_sub(1)
                    .and_then(|i| GOAL_SUGGESTIONS.get(i))
                    .ok_or_else(|| anyhow!("no suggestion #{n}"))?;
                GoalDraft::from_suggestion(s)
            }
            None => base,
        };
        if let Some(v) = self.title {
            draft.title = v;
        }
        if let Some(v) = self.description {
            draft.description = v;
        }
        if let Some(v) = self.frequency {
            draft.frequency = v.parse::<Frequency>()?;
        }
        if let Some(v) = self.duration {
            draft.duration = v;
        }
        if let Some(v) = self.time {
            draft.time = v;
        }
        if let Some(v) = self.difficulty {
            draft.difficulty = v.parse::<Difficulty>()?;
        }
        for n in self.presets {
            let preset = n
                .checked_sub(1)
                .and_then(|i| PRESET_CRITERIA.get(i))
                .ok_or_else(|| anyhow!("no preset criterion #{n}"))?;
            if !draft.add_preset(preset) {
                tracing::warn!(text = preset.text, "criterion already present");
            }
        }
        for text in &self.criteria {
            if !draft.add_criterion(text) {
                tracing::warn!(text = %text, "criterion skipped: blank or duplicate");
            }
        }
        Ok(draft)
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(ctx: &Ctx, subcmd: GoalSubcommand) -> anyhow::Result<()> {
    match subcmd {
        GoalSubcommand::Set(args) => set(ctx, args),
        GoalSubcommand::Show => show(ctx),
        GoalSubcommand::Suggestions => suggestions(ctx.json),
    }
}

fn set(ctx: &Ctx, args: DraftArgs) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    let base = goal::load_goal(&store)?
        .map(|g| g.to_draft())
        .unwrap_or_default();
    let draft = args.apply(base)?;
    let saved = goal::set_goal(&mut store, draft, chrono::Utc::now())
        .context("failed to save goal")?;

    if ctx.json {
        print_json(&saved)?;
    } else {
        println!("Goal saved: {} (id {})", saved.title, saved.id);
    }
    Ok(())
}

fn show(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let goal = ctx.goal(&store)?;
    if ctx.json {
        return print_json(&goal);
    }
    print_goal(&goal);
    Ok(())
}

pub fn print_goal(goal: &Goal) {
    println!("{}  (id {})", goal.title, goal.id);
    if !goal.description.is_empty() {
        println!("  {}", goal.description);
    }
    println!(
        "  {} · {}분 · {} · {}",
        goal.frequency.label(),
        goal.duration,
        goal.time,
        goal.difficulty
    );
    println!(
        "  streak {}  ·  total {} days  ·  success {}%",
        goal.streak, goal.total_days, goal.success_rate
    );
    if !goal.success_criteria.is_empty() {
        println!("  success criteria:");
        for c in &goal.success_criteria {
            println!("    - {}", c.text);
        }
    }
}

fn suggestions(json: bool) -> anyhow::Result<()> {
    if json {
        let goals: Vec<_> = GOAL_SUGGESTIONS
            .iter()
            .map(|s| serde_json::json!({ "title": s.title, "description": s.description, "duration": s.duration }))
            .collect();
        let presets: Vec<_> = PRESET_CRITERIA
            .iter()
            .map(|p| serde_json::json!({ "text": p.text, "category": p.category }))
            .collect();
        return print_json(&serde_json::json!({ "goals": goals, "criteria": presets }));
    }

    let rows = GOAL_SUGGESTIONS
        .iter()
        .enumerate()
        .map(|(i, s)| {
            vec![
                (i + 1).to_string(),
                s.title.to_string(),
                format!("{}분", s.duration),
                s.description.to_string(),
            ]
        })
        .collect();
    print_table(&["#", "GOAL", "TIME", "DESCRIPTION"], rows);
    println!();
    let rows = PRESET_CRITERIA
        .iter()
        .enumerate()
        .map(|(i, p)| vec![(i + 1).to_string(), p.text.to_string(), p.category.to_string()])
        .collect();
    print_table(&["#", "CRITERION", "CATEGORY"], rows);
    Ok(())
}
