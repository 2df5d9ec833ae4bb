// =============================================================================
//  Astra HTN - Demo Binary
//  File: htn_demo.rs
//
//  Description:
//      A small end-to-end demonstration: the classic river-crossing puzzle
//      (a farmer ferrying a fox, a goose, and a sack of corn) encoded as a
//      planning domain, solved with a multigoal, and printed as an ordered
//      command plan with durations.
//
//  Author:      Alex Roussinov
//  Created:     2026-07-20
//
//  License:
//      Dual licensed under the MIT and Apache 2.0 licenses.
//      See LICENSE-MIT and LICENSE-APACHE at the repository root for details.
// =============================================================================

use anyhow::Result;
use astra_htn::{
    Domain, DomainBuilder, Metadata, Multigoal, PlanError, PlannerBuilder, State, Todo, Unigoal,
    Value,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "htn_demo", about = "River-crossing demo for the Astra HTN planner")]
struct Args {
    /// Verbosity level (0..=3); refinement detail goes to the log facade.
    #[arg(short, long, default_value_t = 1)]
    verbose: u8,

    /// Maximum refinement depth.
    #[arg(long, default_value_t = 64)]
    max_depth: usize,
}

const ITEMS: [&str; 3] = ["fox", "goose", "corn"];

fn side_of(state: &State, item: &str) -> String {
    state
        .get_fact("side", item)
        .and_then(Value::as_str)
        .unwrap_or("west")
        .to_string()
}

fn opposite(side: &str) -> &'static str {
    if side == "west" {
        "east"
    } else {
        "west"
    }
}

/// Renders the item/boat positions as a compact configuration key used to
/// prune revisits along the current path.
fn config_key(state: &State) -> String {
    let mut key = String::new();
    for item in ITEMS {
        key.push_str(&side_of(state, item));
        key.push('|');
    }
    key.push_str(&side_of(state, "boat"));
    key
}

/// A bank is safe when the farmer is present, or when neither fox+goose
/// nor goose+corn are left together.
fn bank_is_safe(state: &State, bank: &str, boat_side: &str) -> bool {
    if bank == boat_side {
        return true;
    }
    let fox = side_of(state, "fox") == bank;
    let goose = side_of(state, "goose") == bank;
    let corn = side_of(state, "corn") == bank;
    !(fox && goose || goose && corn)
}

fn river_domain() -> astra_htn::Result<Domain> {
    DomainBuilder::new("river_crossing")
        .command("cross", |state: &State, args: &[Value]| {
            let cargo = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| PlanError::precondition("cross", "missing cargo argument"))?;
            let boat = side_of(state, "boat");
            let far = opposite(&boat);

            let mut next = state.set_fact("side", "boat", far);
            if cargo != "nothing" {
                if side_of(state, cargo) != boat {
                    return Err(PlanError::precondition(
                        "cross",
                        format!("{cargo} is not on the {boat} bank"),
                    ));
                }
                next = next.set_fact("side", cargo, far);
            }

            // The bank the farmer leaves behind must stay safe.
            if !bank_is_safe(&next, &boat, far) {
                return Err(PlanError::precondition(
                    "cross",
                    format!("leaving the {boat} bank unattended is unsafe"),
                ));
            }
            let key = config_key(&next);
            if next.matches("visited", &key, &Value::Bool(true)) {
                return Err(PlanError::precondition("cross", "configuration already seen"));
            }
            next = next.set_fact("visited", &key, true);

            let meta = Metadata::new().with_duration("PT5M")?;
            Ok((next, meta))
        })
        .task_method("ferry_all", "all_delivered", |state: &State, _args| {
            if ITEMS.iter().all(|item| side_of(state, item) == "east") {
                Ok(vec![])
            } else {
                Err(PlanError::precondition("all_delivered", "items remain west"))
            }
        })
        .task_method("ferry_all", "carry_goose", |_state, _args| {
            Ok(vec![
                Todo::command("cross", vec!["goose".into()]),
                Todo::task("ferry_all", vec![]),
            ])
        })
        .task_method("ferry_all", "carry_fox", |_state, _args| {
            Ok(vec![
                Todo::command("cross", vec!["fox".into()]),
                Todo::task("ferry_all", vec![]),
            ])
        })
        .task_method("ferry_all", "carry_corn", |_state, _args| {
            Ok(vec![
                Todo::command("cross", vec!["corn".into()]),
                Todo::task("ferry_all", vec![]),
            ])
        })
        .task_method("ferry_all", "carry_nothing", |_state, _args| {
            Ok(vec![
                Todo::command("cross", vec!["nothing".into()]),
                Todo::task("ferry_all", vec![]),
            ])
        })
        .unigoal_method("side", "take_across", |_state, _subject, _value| {
            Ok(vec![Todo::task("ferry_all", vec![])])
        })
        .build()
}

fn initial_state() -> State {
    let state = State::new("west_bank");
    let state = ITEMS
        .iter()
        .fold(state, |acc, item| acc.set_fact("side", item, "west"));
    let state = state.set_fact("side", "boat", "west");
    let key = config_key(&state);
    state.set_fact("visited", &key, true)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let domain = river_domain()?;
    let planner = PlannerBuilder::new()
        .with_domain(domain)
        .with_max_depth(args.max_depth)
        .with_verbose_level(args.verbose)?
        .build()?;

    let goal = Multigoal::new(
        ITEMS
            .iter()
            .map(|item| Unigoal::new("side", *item, "east"))
            .collect(),
    )
    .with_tag("everything_east");

    let outcome = planner.plan(initial_state(), vec![Todo::multigoal(goal)])?;

    println!("plan with {} crossings:", outcome.steps.len());
    for (index, step) in outcome.steps.iter().enumerate() {
        println!("  {}. {step}", index + 1);
    }
    println!(
        "final state: {}",
        ITEMS
            .iter()
            .map(|item| format!("{item}=east"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
