use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use td_connect_four::ai::{TabularAgent, ValueTable};
use td_connect_four::checkpoint::{CheckpointManager, TableFormat};
use td_connect_four::config::AppConfig;
use td_connect_four::training::{Trainer, TrainingSummary};

/// Train the tabular Connect Four agent via self-play.
#[derive(Parser)]
#[command(name = "train", about = "Train a tabular TD Connect Four agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Import the existing table before training
    #[arg(long)]
    resume: bool,

    /// Table format to import with --resume: full or compressed
    #[arg(long, default_value = "full")]
    format: String,

    /// Seed the random generator for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Print a config file with all default values and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let Some(format) = TableFormat::from_name(&cli.format) else {
        bail!(
            "unknown table format '{}' (expected 'full' or 'compressed')",
            cli.format
        );
    };

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(episodes) = cli.episodes {
        app_config.training.num_episodes = episodes;
    }
    app_config.validate().context("validating config")?;

    let manager = CheckpointManager::new(app_config.checkpoint.clone());

    let (table, completed_episodes) = if cli.resume {
        let data = manager.load_latest(format).with_context(|| {
            format!(
                "importing {} table from {}",
                cli.format,
                manager.table_path(format).display()
            )
        })?;
        println!(
            "Resumed {} entries from episode {}",
            data.table.len(),
            data.episode()
        );
        let episode = data.episode();
        (data.table, episode)
    } else {
        (ValueTable::new(), 0)
    };

    let trainer = Trainer::new(app_config.training.clone(), manager);
    let summary = match cli.seed {
        Some(seed) => {
            let mut agent = TabularAgent::seeded(app_config.td, table, seed);
            trainer.train(&mut agent, completed_episodes)
        }
        None => {
            let mut agent = TabularAgent::from_table(app_config.td, table);
            trainer.train(&mut agent, completed_episodes)
        }
    }
    .context("training")?;

    print_summary(&summary, &app_config);
    Ok(())
}

fn print_summary(summary: &TrainingSummary, config: &AppConfig) {
    println!("-------------------------------------------");
    println!(
        "Trained {} episodes (last episode {})",
        summary.episodes_run, summary.last_episode
    );
    println!("Table entries: {}", summary.table_entries);
    println!(
        "Red win rate: {:.1}% | draw: {:.1}% | avg_len: {:.1} | |td|: {:.4}",
        summary.metrics.red_win_rate * 100.0,
        summary.metrics.draw_rate * 100.0,
        summary.metrics.average_game_length,
        summary.metrics.mean_abs_td_error,
    );
    if let Some(eval_wr) = summary.metrics.eval_win_rate {
        println!(
            "Final eval vs Random ({} games): {:.1}% win rate",
            config.training.eval_games,
            eval_wr * 100.0
        );
    }
    println!(
        "Tables written to {}",
        config.checkpoint.table_dir.display()
    );
}
