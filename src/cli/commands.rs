// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per thing the assistant can do, plus
// `evaluate` and `init-config`.
//
// Every numeric flag is optional: when it is left out the
// value comes from the config file (or the built-in default).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Suggest the next word for a message prefix
    Suggest(SuggestArgs),

    /// Classify the sentiment of a message
    Classify(ClassifyArgs),

    /// Classify a message and pick a Mundart reply
    Answer(AnswerArgs),

    /// Show the closest reply examples for a message
    Neighbors(NeighborsArgs),

    /// Train on the training split and score the test split
    Evaluate(EvaluateArgs),

    /// Write the default config as JSON
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// The message typed so far
    #[arg(long)]
    pub text: String,

    /// Longest n-gram to try first (clamped to the built order)
    #[arg(long)]
    pub max_order: Option<usize>,

    /// Number of suggestions to show
    #[arg(long)]
    pub top_k: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    #[arg(long)]
    pub text: String,
}

#[derive(Args, Debug)]
pub struct AnswerArgs {
    #[arg(long)]
    pub text: String,

    /// Catalog rows to retrieve before taking the best
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Best similarity must reach this for a reply
    #[arg(long)]
    pub min_similarity: Option<f32>,
}

#[derive(Args, Debug)]
pub struct NeighborsArgs {
    #[arg(long)]
    pub text: String,

    /// How many neighbours to list
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Search the whole catalog instead of the predicted label only
    #[arg(long)]
    pub no_label_filter: bool,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Append the result to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the config
    #[arg(long, default_value = "mundart_chat.json")]
    pub out: PathBuf,
}
