use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use commonware_runtime::{tokio, Clock, Metrics, Runner as _};
use liftoff_execution::crash::{crash_time_ms, derive_crash_multiplier};
use liftoff_simulator::{
    reporter::LogReporter,
    scheduler::{Actor, MailboxError},
    Config,
};
use liftoff_types::crash::{Bet, VolatilityLevel, DEFAULT_VOLATILITY};
use std::{path::PathBuf, time::Duration};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive the crash point for a seed.
    Derive {
        #[arg(long)]
        seed: String,

        /// Volatility level (1 = widest spread, 5 = narrowest).
        #[arg(long, conflicts_with = "volatility")]
        level: Option<u8>,

        /// Issuer volatility fraction in [0, 1].
        #[arg(long)]
        volatility: Option<f64>,
    },
    /// Play rounds against a local scheduler.
    Play {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        bet: String,

        /// Auto-cashout multiplier (e.g. 2.00).
        #[arg(long)]
        auto: Option<String>,

        /// Request a manual cashout this long after the bet is placed.
        #[arg(long)]
        cashout_after_ms: Option<u64>,

        #[arg(long, default_value_t = 1)]
        rounds: u32,
    },
}

fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    match args.command {
        Command::Derive {
            seed,
            level,
            volatility,
        } => derive(&seed, level, volatility),
        Command::Play {
            config,
            token,
            bet,
            auto,
            cashout_after_ms,
            rounds,
        } => play(config, token, &bet, auto.as_deref(), cashout_after_ms, rounds),
    }
}

fn init_logging(level: Level, json: bool) {
    let subscriber = tracing_subscriber::fmt().with_max_level(level);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn derive(seed: &str, level: Option<u8>, volatility: Option<f64>) -> anyhow::Result<()> {
    let level = match (level, volatility) {
        (Some(level), _) => VolatilityLevel::new(level).context("level must be within [1, 5]")?,
        (None, Some(volatility)) => VolatilityLevel::from_fraction(volatility)?,
        (None, None) => VolatilityLevel::from_fraction(DEFAULT_VOLATILITY)?,
    };

    let crash = derive_crash_multiplier(seed, level);
    println!("seed:       {seed}");
    println!("level:      {level}");
    println!("crash:      {crash}");
    println!("crash time: {:.0}ms", crash_time_ms(crash));
    Ok(())
}

fn play(
    config: Option<PathBuf>,
    token: Option<String>,
    bet: &str,
    auto: Option<&str>,
    cashout_after_ms: Option<u64>,
    rounds: u32,
) -> anyhow::Result<()> {
    // Load config
    let mut config: Config = match config {
        Some(path) => {
            let file = std::fs::read_to_string(&path)
                .with_context(|| format!("could not read config file {}", path.display()))?;
            serde_yaml::from_str(&file).context("could not parse config file")?
        }
        None => Config::default(),
    };
    if token.is_some() {
        config.token = token;
    }
    let config = config.validate().context("invalid config")?;
    let bet = Bet::from_input(bet, auto.unwrap_or("")).context("invalid bet")?;
    if rounds == 0 {
        bail!("rounds must be > 0");
    }

    // Create logger
    init_logging(config.log_level, config.json_logs);

    // Start runtime
    let executor = tokio::Runner::new(tokio::Config::default());
    executor.start(|context| async move {
        let (actor, mut mailbox) = Actor::new(
            context.with_label("scheduler"),
            config.scheduler(),
            LogReporter,
        )?;
        actor.start();

        let mut balance = 0.0;
        for round in 1..=rounds {
            let generation = mailbox.new_round().await?;
            mailbox.ready().await?;
            mailbox.place_bet(bet).await?;
            info!(round, generation, bet = bet.amount, "bet placed");

            if let Some(delay) = cashout_after_ms {
                context.sleep(Duration::from_millis(delay)).await;
                match mailbox.cash_out().await {
                    Ok(_) => {}
                    Err(MailboxError::Round(err)) => info!(%err, "cashout not accepted"),
                    Err(err) => return Err(err.into()),
                }
            }

            let settlement = mailbox.settled().await?;
            balance += settlement.payout() - settlement.bet;
            info!(
                round,
                crash = %settlement.crash,
                won = settlement.won(),
                payout = settlement.payout(),
                balance,
                "round settled"
            );
        }
        Ok::<_, anyhow::Error>(())
    })
}
