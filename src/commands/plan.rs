use chrono::Local;

use cadence::config::Config;
use cadence::error::Result;
use cadence::scheduler::planner;

/// Preview the slot plan the scheduler would build right now
pub fn plan(config: Config, json: bool) -> Result<()> {
    let fixed_time = config.fixed_time()?;
    let now = Local::now().naive_local();

    let day_plan = planner::plan(
        now,
        fixed_time,
        config.schedule.random_posts_per_day,
        config.min_interval(),
        config.max_interval(),
    );
    let snapshot = day_plan.snapshot();

    if json {
        println!("{}", snapshot.to_json()?);
        return Ok(());
    }

    println!("Plan Preview");
    println!("============");
    println!("Date: {}", snapshot.date);
    println!("Now:  {}", now.format("%H:%M:%S"));
    println!();

    if snapshot.slots.is_empty() {
        println!("No slots remain today.");
        return Ok(());
    }

    for slot in &snapshot.slots {
        println!(
            "  {}  {}",
            slot.at.format("%H:%M:%S"),
            slot.post_type.as_str()
        );
    }
    println!();
    println!("{} slot(s) planned", snapshot.slots.len());

    Ok(())
}
