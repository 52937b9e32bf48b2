use anyhow::{Result, bail};
use colored::Colorize;
use itertools::Itertools;
use stamina::{
    models::UserProfile,
    profile,
    types::{Difficulty, WorkoutLocation, emit, normalize},
};

use super::Ctx;
use crate::cli::{ProfileArgs, ProfileCmd};

fn print_profile(p: &UserProfile) {
    println!("{}", p.name.cyan().bold());
    println!("  {:?}, {} years, {:.0} cm, {:.1} kg", p.sex, p.age, p.height_cm, p.weight_kg);
    println!("  {} · trains at {}", p.experience, p.location);
    let equipment = if p.equipment.is_empty() {
        "anything".dimmed().to_string()
    } else {
        p.equipment.iter().join(", ")
    };
    println!("  equipment: {}", equipment);
    if !p.health_conditions.is_empty() {
        println!("  conditions: {}", p.health_conditions.join(", ").yellow());
    }
}

/// Fold `args` over the stored profile; a first profile needs the body fields.
fn merge(existing: Option<UserProfile>, args: ProfileArgs) -> Result<UserProfile> {
    let mut p = match existing {
        Some(p) => p,
        None => {
            let (Some(sex), Some(age), Some(height_cm), Some(weight_kg)) =
                (args.sex, args.age, args.height, args.weight)
            else {
                bail!("a new profile needs --sex, --age, --height and --weight");
            };
            UserProfile {
                name: "me".into(),
                sex,
                age,
                height_cm,
                weight_kg,
                experience: Difficulty::Beginner,
                location: WorkoutLocation::Gym,
                equipment: Vec::new(),
                health_conditions: Vec::new(),
            }
        }
    };

    if let Some(v) = args.name {
        p.name = v;
    }
    if let Some(v) = args.sex {
        p.sex = v;
    }
    if let Some(v) = args.age {
        p.age = v;
    }
    if let Some(v) = args.height {
        p.height_cm = v;
    }
    if let Some(v) = args.weight {
        p.weight_kg = v;
    }
    if let Some(v) = args.experience {
        p.experience = v;
    }
    if let Some(v) = args.location {
        p.location = v;
    }
    if let Some(v) = args.equipment {
        p.equipment = v;
    }
    if let Some(v) = args.conditions {
        p.health_conditions = v.iter().map(|c| normalize(c)).filter(|c| !c.is_empty()).collect();
    }

    if p.height_cm <= 0.0 || p.weight_kg <= 0.0 {
        bail!("height and weight must be positive");
    }
    Ok(p)
}

pub fn handle(cmd: ProfileCmd, ctx: &Ctx) -> Result<()> {
    let path = ctx.settings.profile_path();
    match cmd {
        ProfileCmd::Show => match profile::load(&path)? {
            Some(p) => emit(ctx.fmt, &p, || print_profile(&p)),
            None => println!(
                "{} no profile yet; create one with `stamina profile set`",
                "warning:".yellow().bold()
            ),
        },

        ProfileCmd::Set(args) => {
            let p = merge(profile::load(&path)?, args)?;
            profile::save(&path, &p)?;
            println!("{} saved profile for `{}`", "ok:".green().bold(), p.name);
        }
    }
    Ok(())
}
