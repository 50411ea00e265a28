use super::Ctx;
use crate::output::print_json;
use routine_core::coach;
use routine_core::responses;

pub fn run(ctx: &Ctx, message: Option<&str>) -> anyhow::Result<()> {
    let mut store = ctx.store()?;
    let goal = ctx.goal(&store)?;

    let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) else {
        let welcome = responses::welcome_message(&goal.title);
        if ctx.json {
            return print_json(&serde_json::json!({
                "reply": welcome,
                "quick_messages": responses::QUICK_MESSAGES,
            }));
        }
        println!("{welcome}\n");
        for q in responses::QUICK_MESSAGES {
            println!("  routine chat \"{q}\"");
        }
        return Ok(());
    };

    let (reply, source) = if coach::stored_api_key(&store).is_some() {
        let config = ctx.config()?;
        let prompt = coach::build_chat_prompt(&goal.title, message);
        let reply = coach::ask(
            &mut store,
            &config.coach.client(),
            config.coach.key_failure_threshold,
            &prompt,
            &config.coach.chat,
        )?;
        (reply, "coach")
    } else {
        let reply = responses::offline_reply(message, &mut rand::thread_rng());
        (reply.to_string(), "offline")
    };

    if ctx.json {
        return print_json(&serde_json::json!({ "reply": reply, "source": source }));
    }
    println!("{reply}");
    Ok(())
}
