// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with `clap`, loads the config, builds the
// assistant and prints results. All work is delegated to
// Layer 2 (application).
//
// Commands:
//   suggest      — next-word suggestions
//   classify     — sentiment label and probabilities
//   answer       — classification plus a Mundart reply
//   neighbors    — closest catalog rows (debug view)
//   evaluate     — held-out accuracy / F1
//   init-config  — write the default config
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::application::{
    assistant::{Assistant, AssistantConfig},
    evaluate_use_case::EvaluateUseCase,
};
use crate::domain::traits::Prediction;
use crate::infra::config_store::ConfigStore;
use commands::{
    AnswerArgs, ClassifyArgs, Commands, EvaluateArgs, InitConfigArgs, NeighborsArgs, SuggestArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "mundart-chat",
    version = "0.1.0",
    about = "Next-word suggestions, sentiment and canned replies for Swiss German chat."
)]
pub struct Cli {
    /// JSON config file; built-in defaults are used without it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = ConfigStore::load(self.config.as_deref())?;

        match self.command {
            Commands::Suggest(args)    => run_suggest(config, args),
            Commands::Classify(args)   => run_classify(config, args),
            Commands::Answer(args)     => run_answer(config, args),
            Commands::Neighbors(args)  => run_neighbors(config, args),
            Commands::Evaluate(args)   => run_evaluate(config, args),
            Commands::InitConfig(args) => run_init_config(config, args),
        }
    }
}

fn run_suggest(config: AssistantConfig, args: SuggestArgs) -> Result<()> {
    let max_order = args.max_order.unwrap_or(config.max_order);
    let top_k     = args.top_k.unwrap_or(config.suggest_top_k);
    let assistant = Assistant::build(config)?;

    let result = assistant.suggest(&args.text, max_order, top_k);

    println!("\nNext-word suggestions");
    if result.is_empty() {
        println!("  (no usable suggestions)");
        return Ok(());
    }
    if let Some(order) = result.order {
        println!("  [{order}-gram]");
    }
    for s in &result.candidates {
        let completed = format!("{} {}", args.text, s.token);
        println!("  {:15}  (p ≈ {:.2})   →  {}", s.token, s.probability, completed.trim());
    }
    Ok(())
}

fn run_classify(config: AssistantConfig, args: ClassifyArgs) -> Result<()> {
    let assistant  = Assistant::build(config)?;
    let prediction = assistant.classify(&args.text)?;

    println!("\nClassification");
    println!(
        "  {}  |  {}",
        prediction.label,
        format_probabilities(&prediction, &assistant.config().label_order)
    );
    Ok(())
}

fn run_answer(config: AssistantConfig, args: AnswerArgs) -> Result<()> {
    let top_k     = args.top_k.unwrap_or(config.reply_top_k);
    let min_sim   = args.min_similarity.unwrap_or(config.min_similarity);
    let assistant = Assistant::build(config)?;

    let answer = assistant.answer(&args.text, top_k, min_sim)?;

    println!("\nClassification");
    println!(
        "  {}  |  {}",
        answer.prediction.label,
        format_probabilities(&answer.prediction, &assistant.config().label_order)
    );

    println!("\nReply (Mundart)");
    match (&answer.outcome.reply, answer.outcome.similarity) {
        (Some(reply), Some(sim)) => {
            println!("  {reply}");
            println!("  [similarity: {sim:.2}]");
        }
        (_, Some(sim)) => {
            println!("  (no fitting reply in the catalog)");
            println!("  [best similarity was only {sim:.2}]");
        }
        _ => println!("  (no fitting reply in the catalog)"),
    }
    Ok(())
}

fn run_neighbors(config: AssistantConfig, args: NeighborsArgs) -> Result<()> {
    let top_n     = args.top_n.unwrap_or(config.neighbors_top_n);
    let assistant = Assistant::build(config)?;

    let report = assistant.neighbors(&args.text, top_n, !args.no_label_filter)?;

    println!("\nClosest reply examples");
    println!("Input: «{}»", args.text);
    println!("Predicted label: {}", report.prediction.label);

    if report.hits.is_empty() {
        println!("  (no candidates in the reply catalog)");
        return Ok(());
    }

    println!("\nTop {} neighbours:", report.hits.len());
    for hit in &report.hits {
        println!(
            "\n[{}] similarity: {:.3} | label={} | intent={} | is_seed={}",
            hit.rank,
            hit.similarity,
            hit.label,
            hit.intent.as_deref().unwrap_or("?"),
            hit.is_seed
        );
        println!("   user_text:      {}", shorten(&hit.utterance, 80));
        println!("   answer_mundart: {}", shorten(&hit.reply, 80));
    }
    Ok(())
}

fn run_evaluate(config: AssistantConfig, args: EvaluateArgs) -> Result<()> {
    let report = EvaluateUseCase::new(config, args.metrics_csv).execute()?;

    println!("\nEvaluation on {} held-out examples", report.examples);
    println!("  {:10} {:>9} {:>9} {:>9} {:>9}", "label", "precision", "recall", "f1", "support");
    for s in &report.per_label {
        println!(
            "  {:10} {:>9.3} {:>9.3} {:>9.3} {:>9}",
            s.label, s.precision, s.recall, s.f1, s.support
        );
    }
    println!("\n  accuracy: {:.3}", report.accuracy);
    println!("  macro F1: {:.3}", report.macro_f1);
    Ok(())
}

fn run_init_config(config: AssistantConfig, args: InitConfigArgs) -> Result<()> {
    ConfigStore::save(&config, &args.out)?;
    println!("Config written to '{}'", args.out.display());
    Ok(())
}

/// "negativ: 0.12 | neutral: 0.30 | positiv: 0.58"
///
/// Labels follow `label_order`; labels the classifier knows
/// beyond that list come last.
fn format_probabilities(prediction: &Prediction, label_order: &[String]) -> String {
    let extra = prediction
        .probabilities
        .iter()
        .map(|(label, _)| label)
        .filter(|label| !label_order.contains(*label));

    label_order
        .iter()
        .chain(extra)
        .map(|label| format!("{label}: {:.2}", prediction.probability_of(label)))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn shorten(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_keeps_short_text() {
        assert_eq!(shorten("hoi", 80), "hoi");
    }

    #[test]
    fn test_shorten_counts_chars_not_bytes() {
        let long = "ä".repeat(100);
        let short = shorten(&long, 80);
        assert_eq!(short.chars().count(), 80);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_probabilities_follow_label_order() {
        let p = Prediction {
            label:         "positiv".into(),
            probabilities: vec![
                ("positiv".into(), 0.7),
                ("frag".into(), 0.2),
                ("negativ".into(), 0.1),
            ],
        };
        let order: Vec<String> = vec!["negativ".into(), "neutral".into(), "positiv".into()];
        assert_eq!(
            format_probabilities(&p, &order),
            "negativ: 0.10 | neutral: 0.00 | positiv: 0.70 | frag: 0.20"
        );
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from([
            "mundart-chat", "neighbors", "--text", "hoi", "--top-n", "3", "--no-label-filter",
        ])
        .unwrap();
        match cli.command {
            Commands::Neighbors(a) => {
                assert_eq!(a.top_n, Some(3));
                assert!(a.no_label_filter);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["mundart-chat", "suggest", "--text", "i ha", "--config", "c.json"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
    }
}
