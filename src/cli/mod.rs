//! CLI argument parsing and run dispatch

mod report;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use hammer_core::{
    CoordinatorBuilder, HttpProber, RunConfig, RunPhase, RunSummary, Target,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use report::{render_banner, render_summary, render_worker_line};

/// hammer - Open-loop HTTP load generator
#[derive(Parser, Debug)]
#[command(name = "hammer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target URL (http or https)
    pub url: String,

    /// Number of concurrent workers
    #[arg(short, long, env = "HAMMER_PARALLEL", default_value_t = 1)]
    pub parallel: usize,

    /// How long to run (e.g. "10s", "1m 30s")
    #[arg(
        short,
        long,
        env = "HAMMER_DURATION",
        default_value = "1s",
        value_parser = humantime::parse_duration
    )]
    pub duration: Duration,

    /// Per-request timeout
    #[arg(long, env = "HAMMER_TIMEOUT", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Extra request header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Override the User-Agent header
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Ignore Ctrl+C and always run for the full duration
    #[arg(long)]
    pub no_interrupt: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Print per-worker results and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Hide the banner and progress spinner
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Run configuration derived from the flags
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new(self.parallel)
            .with_duration(self.duration)
            .with_request_timeout(self.timeout)
            .with_handle_interrupt(!self.no_interrupt)
    }

    /// Request target derived from the URL and header flags
    pub fn target(&self) -> Result<Target> {
        let mut target =
            Target::parse(&self.url).with_context(|| format!("invalid target: {}", self.url))?;

        if let Some(ref user_agent) = self.user_agent {
            target = target
                .with_user_agent(user_agent)
                .context("invalid --user-agent")?;
        }

        for line in &self.headers {
            target = target
                .with_header_line(line)
                .with_context(|| format!("invalid --header '{line}'"))?;
        }

        Ok(target)
    }

    fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Run the load test based on CLI arguments
    pub async fn run(&self) -> Result<()> {
        let config = self.run_config();
        config.validate().context("invalid configuration")?;
        let target = self.target()?;

        tracing::debug!(?config, url = %target, "Parsed arguments");

        let prober = HttpProber::new(config.request_timeout).context("failed to build HTTP client")?;
        let coordinator = CoordinatorBuilder::new()
            .config(config.clone())
            .target(target)
            .prober(Arc::new(prober))
            .build()?;

        let progress = self.spawn_progress(coordinator.phase_receiver(), &config);
        let result = coordinator.run_with_signal_handling().await;
        drop(coordinator);
        if let Err(e) = progress.await {
            tracing::warn!(error = %e, "Progress task failed");
        }

        let summary = match result {
            Ok(summary) => summary,
            Err(e) if e.is_pre_flight() => anyhow::bail!("Aborting: {e}"),
            Err(e) => return Err(e.into()),
        };

        self.print_summary(&summary)
    }

    /// Follow phase transitions: print the banner once workers are
    /// launched and tick a spinner until the run ends
    fn spawn_progress(
        &self,
        mut phases: watch::Receiver<RunPhase>,
        config: &RunConfig,
    ) -> JoinHandle<()> {
        let banner = self
            .show_progress()
            .then(|| render_banner(config.worker_count, config.duration));
        let spinner = if self.show_progress() {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) =
                ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
            {
                pb.set_style(style);
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        tokio::spawn(async move {
            let mut banner = banner;
            loop {
                let phase = *phases.borrow_and_update();

                if let Some(line) = take_banner(phase, &mut banner) {
                    spinner.suspend(|| println!("{line}"));
                    spinner.enable_steady_tick(Duration::from_millis(100));
                }
                if phase.is_active() {
                    spinner.set_message(format!("{phase:?}").to_lowercase());
                }

                if phase.is_terminal() || phases.changed().await.is_err() {
                    break;
                }
            }
            spinner.finish_and_clear();
        })
    }

    fn print_summary(&self, summary: &RunSummary) -> Result<()> {
        if self.json {
            let json = serde_json::to_string_pretty(summary).context("failed to serialize summary")?;
            println!("{json}");
            return Ok(());
        }

        if self.verbose {
            for tally in &summary.workers {
                println!("{}", render_worker_line(tally));
            }
        }
        println!("{}", render_summary(summary));

        Ok(())
    }
}

/// Hand out the banner at most once, and only while workers are running
///
/// Phase updates coalesce, so a short run may be first observed as `Done`;
/// the banner is then never printed.
fn take_banner(phase: RunPhase, banner: &mut Option<String>) -> Option<String> {
    if phase.is_active() {
        banner.take()
    } else {
        None
    }
}
