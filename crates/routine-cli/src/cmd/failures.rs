use super::Ctx;
use crate::output::{print_json, print_table};
use routine_core::failure::{self, find_reason};
use routine_core::reflection::reflection_lookup;

pub fn failures(ctx: &Ctx) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let config = ctx.config()?;
    let goal = ctx.goal(&store)?;
    let stats = failure::aggregate_failure_stats(
        reflection_lookup(&store, goal.id),
        ctx.today()?,
        config.stats.window_days,
    );

    if ctx.json {
        return print_json(&stats);
    }

    println!(
        "{} · {} skipped days with reasons in the last {} days",
        goal.title, stats.total, config.stats.window_days
    );
    if stats.by_category.is_empty() {
        return Ok(());
    }
    let rows = stats
        .by_category
        .iter()
        .map(|(c, n)| vec![c.to_string(), n.to_string()])
        .collect();
    print_table(&["CATEGORY", "COUNT"], rows);
    Ok(())
}

pub fn classify(ctx: &Ctx, text: &str) -> anyhow::Result<()> {
    let ids = failure::classify(text);
    if ctx.json {
        return print_json(&ids);
    }
    for id in &ids {
        match find_reason(id) {
            Some(r) => println!("{id}\t{}\t{}", r.category, r.text),
            None => println!("{id}"),
        }
    }
    Ok(())
}
