use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use revuoo_pipeline::board::{BoardEvent, BoardView, CommitOutcome, PipelineBoard};
use revuoo_pipeline::config::Config;
use revuoo_pipeline::domain::{CardId, LeadStage, OpportunityStage, Pipeline, PipelineStage};
use revuoo_pipeline::services::HttpStore;

const USAGE: &str = "usage: revuoo-board <leads|opportunities> [move <card_id> <drop_target_id>]";

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    let pipeline = args
        .first()
        .ok_or_else(|| anyhow::anyhow!(USAGE))?
        .parse::<Pipeline>()
        .map_err(anyhow::Error::msg)?;

    let action = match args.get(1).map(String::as_str) {
        None => None,
        Some("move") => match (args.get(2), args.get(3)) {
            (Some(card), Some(target)) => Some((CardId::from(card.as_str()), target.clone())),
            _ => anyhow::bail!(USAGE),
        },
        Some(other) => anyhow::bail!("unknown command '{}'\n{}", other, USAGE),
    };

    match pipeline {
        Pipeline::Leads => run::<LeadStage>(&config, action).await,
        Pipeline::Opportunities => run::<OpportunityStage>(&config, action).await,
    }
}

async fn run<S: PipelineStage>(
    config: &Config,
    action: Option<(CardId, String)>,
) -> Result<(), anyhow::Error> {
    let store = Arc::new(HttpStore::<S>::new(reqwest::Client::new(), &config.api_url));
    let board = PipelineBoard::mount(store, config.board_options()).await?;

    if let Some((card_id, target)) = action {
        let mut events = board.subscribe();

        if !board.on_drag_start(&card_id).await {
            anyhow::bail!("no card with id '{}' on the {} board", card_id, S::PIPELINE);
        }

        match board.on_drag_end(&card_id, Some(target.as_str())).await {
            None => println!("Nothing to do: '{}' is not a new stage for {}", target, card_id),
            Some(handle) => match handle.await? {
                CommitOutcome::Confirmed { message, .. } => {
                    println!("✓ {}", message);
                    // wait for the background refresh so the printed board is current
                    let refreshed = async {
                        while let Ok(event) = events.recv().await {
                            if matches!(event, BoardEvent::Refreshed { .. }) {
                                break;
                            }
                        }
                    };
                    if tokio::time::timeout(config.board_options().mutation_timeout, refreshed)
                        .await
                        .is_err()
                    {
                        tracing::warn!("Board refresh did not arrive, showing local state");
                    }
                }
                CommitOutcome::RolledBack { error, .. } => println!("✗ {}", error),
            },
        }
    }

    print_board(&board.view().await);
    Ok(())
}

fn print_board<S: PipelineStage>(view: &BoardView<S>) {
    for column in &view.columns {
        println!("{} ({})", column.title, column.cards.len());
        for card in &column.cards {
            let company = card.details.company.as_deref().unwrap_or("-");
            println!(
                "  [{}] {} · {} · score {}",
                card.id, card.details.name, company, card.details.score
            );
        }
    }
}
