use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

use recall_core::model::{CardId, EnhancedCard, StudyRecommendation, UserId};
use services::AppServices;

use crate::sqlite_url::DEFAULT_DB_URL;

/// Adaptive spaced-repetition study planner.
#[derive(Debug, Parser)]
#[command(name = "recall", version, about, long_about = None)]
pub struct Cli {
    /// `SQLite` database url or path.
    #[arg(long = "db", env = "RECALL_DB_URL", default_value = DEFAULT_DB_URL, global = true)]
    pub db_url: String,

    /// TOML file with `[scheduler]`, `[analyzer]` and `[plan]` tables.
    #[arg(long, env = "RECALL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a card.
    Add {
        #[arg(long)]
        front: String,
        #[arg(long)]
        back: String,
    },
    /// Replace the text of a card, keeping its schedule.
    Edit {
        id: CardId,
        #[arg(long)]
        front: String,
        #[arg(long)]
        back: String,
    },
    /// Record a review score between 0 and 1.
    Review {
        id: CardId,
        #[arg(value_parser = parse_performance)]
        performance: f64,
    },
    /// Record a finished study session.
    Session {
        #[arg(long)]
        user: UserId,
        /// Outcomes as `CARD_ID:correct|wrong:MILLIS`, in the order shown.
        #[arg(required = true)]
        outcomes: Vec<OutcomeArg>,
    },
    /// Print today's study plan.
    Plan {
        #[arg(long)]
        user: UserId,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Print strengths, weaknesses and recommendations as JSON.
    Analyze {
        #[arg(long)]
        user: UserId,
    },
    /// List all cards with their scheduling state.
    Cards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn parse_performance(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("performance must be within [0, 1], got {value}"));
    }
    Ok(value)
}

/// One `CARD_ID:correct|wrong:MILLIS` session outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeArg {
    pub card_id: CardId,
    pub was_correct: bool,
    pub time_spent_ms: u64,
}

impl FromStr for OutcomeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(id), Some(verdict), Some(ms), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected CARD_ID:correct|wrong:MILLIS, got `{s}`"));
        };
        let card_id = id.parse::<CardId>().map_err(|e| e.to_string())?;
        let was_correct = match verdict.trim() {
            "correct" | "c" => true,
            "wrong" | "w" => false,
            other => return Err(format!("expected `correct` or `wrong`, got `{other}`")),
        };
        let time_spent_ms = ms
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid milliseconds `{ms}`"))?;
        Ok(Self {
            card_id,
            was_correct,
            time_spent_ms,
        })
    }
}

pub async fn execute(
    command: Command,
    services: &AppServices,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Add { front, back } => {
            let card = services.card_service().add_card(front, back).await?;
            println!("{}", card.id());
        }
        Command::Edit { id, front, back } => {
            let card = services.card_service().edit_card(id, front, back).await?;
            println!("{}", card_line(&card));
        }
        Command::Review { id, performance } => {
            let reviewed = services
                .reviews()
                .review_card_persisted_by_id(id, services.storage().cards.as_ref(), performance)
                .await?;
            let scheduled = &reviewed.result.scheduled;
            println!(
                "card {id}: {} review, interval {} days, ease {:.2}, next review {}",
                scheduled.classification,
                scheduled.state.interval(),
                scheduled.state.ease_factor(),
                scheduled.next_review_date,
            );
        }
        Command::Session { user, outcomes } => {
            let recorder = services.recorder();
            let mut session = recorder.start(user);
            for outcome in outcomes {
                recorder.record(
                    &mut session,
                    outcome.card_id,
                    outcome.was_correct,
                    outcome.time_spent_ms,
                );
            }
            let stored = recorder.finish(session).await?;
            println!(
                "session {} recorded with {} outcomes",
                stored.id(),
                stored.outcomes().len()
            );
        }
        Command::Plan { user, format } => {
            let plan = services.plans().plan_for_user(&user).await?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                Format::Text => print!("{}", render_plan(&plan)),
            }
        }
        Command::Analyze { user } => {
            let report = services.plans().analyze_user(&user).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Cards => {
            let card_service = services.card_service();
            for card in card_service.list_cards().await? {
                println!("{}", card_line(&card));
            }
            let stats = card_service.stats().await?;
            println!(
                "{} cards, {} due, {} new",
                stats.total, stats.due, stats.new
            );
        }
    }
    Ok(())
}

fn card_line(card: &EnhancedCard) -> String {
    let schedule = match card.spaced_repetition() {
        Some(state) => format!(
            "next {} interval {}d ease {:.2} streak {}",
            state.next_review_date(),
            state.interval(),
            state.ease_factor(),
            state.consecutive_correct()
        ),
        None => "new".to_string(),
    };
    format!(
        "{:>4}  {}  [{} reviews]  {}",
        card.id().value(),
        schedule,
        card.review_count(),
        card.card().front()
    )
}

fn render_plan(plan: &StudyRecommendation) -> String {
    if plan.is_empty() {
        return "nothing due\n".to_string();
    }
    let mut out = format!(
        "{} cards, about {} minutes\n",
        plan.cards.len(),
        plan.suggested_duration
    );
    for (position, card) in plan.cards.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. [{}] {}\n",
            position + 1,
            card.id(),
            card.card().front()
        ));
    }
    for area in &plan.focus_areas {
        out.push_str(&format!("* {area}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use recall_core::model::Card;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn review_checks_performance_range() {
        let cli = Cli::try_parse_from(["recall", "review", "3", "0.75"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Review { id, performance } if id == CardId::new(3) && (performance - 0.75).abs() < f64::EPSILON
        ));

        assert!(Cli::try_parse_from(["recall", "review", "3", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["recall", "review", "3", "NaN"]).is_err());
        assert!(Cli::try_parse_from(["recall", "review", "x", "0.5"]).is_err());
    }

    #[test]
    fn session_outcomes_parse() {
        let cli = Cli::try_parse_from([
            "recall",
            "--db",
            "sqlite::memory:",
            "session",
            "--user",
            "alice",
            "4:correct:1200",
            "2:wrong:9000",
        ])
        .unwrap();
        assert_eq!(cli.db_url, "sqlite::memory:");
        let Command::Session { user, outcomes } = cli.command else {
            panic!("expected session command");
        };
        assert_eq!(user.as_str(), "alice");
        assert_eq!(
            outcomes,
            vec![
                OutcomeArg {
                    card_id: CardId::new(4),
                    was_correct: true,
                    time_spent_ms: 1_200
                },
                OutcomeArg {
                    card_id: CardId::new(2),
                    was_correct: false,
                    time_spent_ms: 9_000
                },
            ]
        );
    }

    #[test]
    fn malformed_outcomes_are_rejected() {
        for bad in ["4:maybe:100", "4:correct", "4:correct:-1", "a:wrong:1", "1:c:2:3"] {
            assert!(bad.parse::<OutcomeArg>().is_err(), "{bad}");
        }
        assert!(Cli::try_parse_from(["recall", "session", "--user", "alice"]).is_err());
        assert!(Cli::try_parse_from(["recall", "plan", "--user", " "]).is_err());
    }

    #[test]
    fn plan_text_lists_cards_in_order() {
        let plan = StudyRecommendation {
            cards: vec![
                EnhancedCard::new(Card::new(CardId::new(3), "gato", "cat").unwrap()),
                EnhancedCard::new(Card::new(CardId::new(1), "hola", "hello").unwrap()),
            ],
            suggested_duration: 4,
            focus_areas: vec!["Practice quick recall with timed review sessions".into()],
        };
        assert_eq!(
            render_plan(&plan),
            "2 cards, about 4 minutes\n  1. [3] gato\n  2. [1] hola\n* Practice quick recall with timed review sessions\n"
        );
        assert_eq!(render_plan(&StudyRecommendation::default()), "nothing due\n");
    }
}
