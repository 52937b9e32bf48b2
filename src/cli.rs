use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

use stamina::types::{
    Difficulty, Equipment, FitnessGoal, MetricKind, PlanStatus, Sex, WorkoutLocation,
};

#[derive(Parser)]
#[command(name = "stamina", version, about = "Training plans, daily tracking and guided workouts")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(global = true, short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate and manage training plans
    #[command(subcommand, visible_alias = "p")]
    Plan(PlanCmd),

    /// Mark today's (or another day's) task
    #[command(subcommand, visible_alias = "t")]
    Task(TaskCmd),

    /// Summary of the current plan week
    #[command(visible_alias = "w")]
    Week(DateArg),

    /// Short hints for the day
    #[command(visible_alias = "i")]
    Insights(DateArg),

    /// Progress towards the plan's weight goal
    #[command(visible_alias = "g")]
    Goal(DateArg),

    /// Record and list body metrics
    #[command(subcommand, visible_alias = "m")]
    Metric(MetricCmd),

    /// Guided workout session
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Browse the exercise catalog
    #[command(subcommand, visible_alias = "ex")]
    Catalog(CatalogCmd),

    /// Show or edit your profile
    #[command(subcommand)]
    Profile(ProfileCmd),

    /// View or edit stamina config
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Args, Clone, Copy)]
pub struct DateArg {
    /// Day to act on, YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,
}

//
// Commands
//

#[derive(Subcommand)]
pub enum PlanCmd {
    /// Generate a new plan and make it the active one
    #[command(visible_alias = "g")]
    Generate {
        /// What the plan is for
        #[arg(short, long, value_enum)]
        goal: FitnessGoal,

        /// Target body weight in kg
        #[arg(short, long)]
        target: f64,

        /// Plan length in days
        #[arg(short, long, default_value = "30")]
        days: u32,

        /// First day of the plan (defaults to today)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Date the target weight should be reached by
        #[arg(long)]
        by: Option<NaiveDate>,

        /// Allow a faster weekly rate before warning
        #[arg(long)]
        professional: bool,

        /// Fixed seed for reproducible exercise selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the active plan day by day
    #[command(visible_alias = "s")]
    Show {
        /// Print every day instead of the next seven
        #[arg(short, long)]
        all: bool,
    },

    /// List plans
    #[command(visible_alias = "l")]
    List {
        /// Only plans with this status
        #[arg(short, long, value_enum)]
        status: Option<PlanStatus>,
    },

    /// Archive the active plan
    Archive,

    /// Delete a plan and everything it owns
    #[command(visible_alias = "d")]
    Delete {
        /// Plan id (from `plan list`)
        plan: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCmd {
    /// Show the day's workouts and meals
    #[command(visible_alias = "s")]
    Show(DateArg),

    /// Mark the day completed
    Done(DateArg),

    /// Clear the day's completion
    Undo(DateArg),

    /// Skip the day, or un-skip it
    Skip(DateArg),

    /// Toggle one workout (1-based, as in `task show`)
    #[command(visible_alias = "w")]
    Workout {
        index: usize,
        #[command(flatten)]
        day: DateArg,
    },

    /// Toggle one meal (1-based, as in `task show`)
    Meal {
        index: usize,
        #[command(flatten)]
        day: DateArg,
    },
}

#[derive(Subcommand)]
pub enum MetricCmd {
    /// Record a reading
    #[command(visible_alias = "l")]
    Log {
        #[arg(value_enum)]
        kind: MetricKind,

        value: f64,

        /// Day of the reading (defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Latest reading per day
    #[command(visible_alias = "ls")]
    List {
        #[arg(value_enum, default_value = "weight")]
        kind: MetricKind,

        /// How many days back to show
        #[arg(short, long, default_value = "14")]
        days: u32,
    },
}

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a guided session for the day's workouts
    #[command(visible_alias = "r")]
    Run(DateArg),

    /// Pick up a paused session
    Resume,

    /// Throw away a paused session
    Discard,

    /// Show whether a paused session is waiting
    #[command(visible_alias = "st")]
    Status,
}

#[derive(Subcommand)]
pub enum CatalogCmd {
    /// List catalog exercises
    #[command(visible_alias = "l")]
    List {
        /// Filter by muscle group
        #[arg(short, long)]
        muscle: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ProfileCmd {
    /// Show the stored profile
    Show,

    /// Create or update the profile; omitted fields keep their value
    Set(ProfileArgs),
}

#[derive(Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_enum)]
    pub sex: Option<Sex>,

    #[arg(long)]
    pub age: Option<u32>,

    /// Height in cm
    #[arg(long)]
    pub height: Option<f64>,

    /// Weight in kg
    #[arg(long)]
    pub weight: Option<f64>,

    #[arg(long, value_enum)]
    pub experience: Option<Difficulty>,

    #[arg(long, value_enum)]
    pub location: Option<WorkoutLocation>,

    /// Owned equipment, comma separated; empty means no restriction
    #[arg(long, value_enum, value_delimiter = ',', num_args = 0..)]
    pub equipment: Option<Vec<Equipment>>,

    /// Health conditions, comma separated (e.g. knee-injury)
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub conditions: Option<Vec<String>>,
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
