use crate::demo::{run_demo, DemoArgs};
use crate::infra::load_catalog;
use crate::server;
use ai_readiness::assessment::{AnswerEntry, AnswerSet, PipelineError, ScoreResult};
use ai_readiness::config::AppConfig;
use ai_readiness::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "TAICC AI Readiness",
    about = "Run the AI readiness assessment service or score questionnaires from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the domains and tiers of the question catalog
    Catalog(CatalogArgs),
    /// Score a set of answers offline and print the maturity level
    Score(ScoreArgs),
    /// Run the full pipeline with offline collaborators and write the PDF report
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// JSON question catalog (defaults to APP_CATALOG_PATH, then the built-in catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    #[arg(long)]
    pub(crate) domain: String,
    #[arg(long)]
    pub(crate) tier: String,
    /// Comma-separated responses in question order, e.g. "Very,Fully,Moderately"
    #[arg(long)]
    pub(crate) answers: String,
    #[command(flatten)]
    pub(crate) catalog: CatalogArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog(args) => run_catalog(args),
        Command::Score(args) => run_score(args),
        Command::Demo(args) => run_demo(args),
    }
}

fn catalog_path(args: CatalogArgs) -> Result<Option<PathBuf>, AppError> {
    match args.catalog {
        Some(path) => Ok(Some(path)),
        None => Ok(AppConfig::load()?.assessment.catalog_path),
    }
}

fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = load_catalog(catalog_path(args)?.as_deref())?;

    println!("Question catalog");
    for domain in catalog.summary() {
        println!("- {}", domain.domain);
        for tier in domain.tiers {
            println!("    {} ({} questions)", tier.tier, tier.question_count);
        }
    }
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        domain,
        tier,
        answers,
        catalog,
    } = args;

    let catalog = load_catalog(catalog_path(catalog)?.as_deref())?;
    let questions = catalog
        .questions(&domain, &tier)
        .map_err(PipelineError::from)?;
    let entries = parse_answers(&answers);
    let answer_set = AnswerSet::new(questions.len(), entries).map_err(PipelineError::from)?;
    let score = ScoreResult::from_scores(&answer_set.scores()).map_err(PipelineError::from)?;

    println!("{domain} / {tier}");
    for (prompt, response) in questions.iter().zip(answer_set.responses()) {
        println!("- [{}] {}", response.score(), prompt);
        println!("    {}", response);
    }
    println!(
        "Average score {:.2} -> AI Maturity Level: {}",
        score.average,
        score.maturity.label()
    );
    Ok(())
}

pub(crate) fn parse_answers(raw: &str) -> Vec<AnswerEntry> {
    raw.split(',')
        .map(str::trim)
        .filter(|response| !response.is_empty())
        .enumerate()
        .map(|(index, response)| AnswerEntry::new(index, response))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_answers_assigns_positions() {
        let entries = parse_answers(" Very, Fully ,,Not at all");
        assert_eq!(
            entries,
            vec![
                AnswerEntry::new(0, "Very"),
                AnswerEntry::new(1, "Fully"),
                AnswerEntry::new(2, "Not at all"),
            ]
        );
    }

    #[test]
    fn cli_parses_score_command() {
        let cli = Cli::try_parse_from([
            "ai-readiness-api",
            "score",
            "--domain",
            "Healthcare",
            "--tier",
            "Tier 1",
            "--answers",
            "Very,Fully",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.domain, "Healthcare");
                assert_eq!(args.tier, "Tier 1");
                assert!(args.catalog.catalog.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn score_accepts_documented_answer_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"Retail & E-commerce": {"Tier 1": ["Q1?", "Q2?", "Q3?"]}}"#,
        )
        .expect("write catalog");

        run_score(ScoreArgs {
            domain: "Retail & E-commerce".to_string(),
            tier: "Tier 1".to_string(),
            answers: "Very,Fully,Moderately".to_string(),
            catalog: CatalogArgs {
                catalog: Some(path.clone()),
            },
        })
        .expect("documented answers score");

        let result = run_score(ScoreArgs {
            domain: "Retail & E-commerce".to_string(),
            tier: "Tier 1".to_string(),
            answers: "Mostly,Fully,Moderately".to_string(),
            catalog: CatalogArgs {
                catalog: Some(path),
            },
        });
        assert!(matches!(result, Err(AppError::Assessment(_))));
    }
}
