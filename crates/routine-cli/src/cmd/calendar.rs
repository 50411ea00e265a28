use super::Ctx;
use crate::output::{print_json, print_table};
use chrono::Datelike;
use routine_core::goal;
use routine_core::paths;
use routine_core::tracker;

pub fn run(ctx: &Ctx, month: Option<&str>) -> anyhow::Result<()> {
    let store = ctx.store()?;
    let (year, month) = match month {
        Some(m) => paths::parse_month(m)?,
        None => {
            let today = ctx.today()?;
            (today.year(), today.month())
        }
    };
    let routines = match ctx.routine {
        Some(id) => vec![goal::resolve(&store, Some(id))?],
        None => goal::all_goals(&store)?,
    };
    let days = tracker::month_calendar(&store, &routines, year, month);

    if ctx.json {
        return print_json(&days);
    }

    println!("{year}년 {month}월");
    let rows = days
        .iter()
        .filter(|d| !d.marks.is_empty())
        .map(|d| {
            let marks: Vec<String> = d
                .marks
                .iter()
                .map(|m| format!("{}:{}", m.title, m.status))
                .collect();
            vec![d.date.to_string(), marks.join(", ")]
        })
        .collect::<Vec<_>>();
    if rows.is_empty() {
        println!("Nothing recorded this month.");
    } else {
        print_table(&["DATE", "MARKS"], rows);
    }
    Ok(())
}
