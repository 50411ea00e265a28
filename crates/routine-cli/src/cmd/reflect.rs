use super::Ctx;
use crate::output::print_json;
use anyhow::Context;
use routine_core::coach;
use routine_core::reflection;

pub fn run(ctx: &Ctx, text: &str, reasons: Vec<String>) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    let config = ctx.config()?;
    let today = ctx.today()?;
    let goal = ctx.goal(&store)?;
    let client = config.coach.client();

    let record = reflection::reflect_daily(
        &mut store,
        &goal,
        today,
        text,
        reasons,
        chrono::Utc::now(),
        |store, prompt| {
            coach::ask(
                store,
                &client,
                config.coach.key_failure_threshold,
                prompt,
                &config.coach.reflection,
            )
        },
    )
    .context("failed to save reflection")?;

    if ctx.json {
        return print_json(&record);
    }
    if !record.failure_reasons.is_empty() {
        println!("reasons: {}", record.failure_reasons.join(", "));
    }
    println!("{}", record.ai_response);
    Ok(())
}
