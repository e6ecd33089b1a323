use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use tokio::runtime::Runtime;
use tokio::signal;

use tumblr_dl::cli::{Cli, CommandFactory, Parser};
use tumblr_dl::config::Config;
use tumblr_dl::crawler::{CrawlEvent, CrawlOptions, Crawler};
use tumblr_dl::fetch::Session;
use tumblr_dl::save::{SaveOutcome, Saver};

const SPINNER_FINISH_MODE: ProgressFinish = ProgressFinish::AndClear;
const SPINNER_TICK_SECS: f32 = 0.1;

/// current crawl number status
struct CrawlStatus {
    /// the number of images written to disk
    saved: u64,
    /// the number of images that already existed, which means no need to save
    existed: u64,
    /// the number of images that failed to save
    failed: u64,
    /// the page currently being crawled
    page_number: u64,
}

#[inline]
fn build_spinner() -> ProgressBar {
    ProgressBar::new_spinner()
        .with_finish(SPINNER_FINISH_MODE)
        .with_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap()
                // For more spinners check out the cli-spinners project:
                // https://github.com/sindresorhus/cli-spinners/blob/master/spinners.json
                // NOTE: use `ascii` only, because cmd/powershell maybe not support unicode.
                .tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]),
        )
}

#[inline]
fn status_msg(blog: &str, status: &CrawlStatus) -> String {
    let CrawlStatus {
        saved,
        existed,
        failed,
        page_number,
    } = status;
    format!("Crawling {blog} (page {page_number}) [saved:{saved}\texisted:{existed}\tfailed:{failed}]")
}

#[inline]
fn build_options(config: &Config) -> CrawlOptions {
    let mut options = CrawlOptions::new(&config.blog)
        .start_page(config.start_page.get())
        .download_binaries(true)
        .accumulate(config.manifest);
    if let Some(ceiling) = config.page_ceiling {
        options = options.page_ceiling(ceiling);
    }
    if let Some(ceiling) = config.step_ceiling {
        options = options.step_ceiling(ceiling);
    }
    options
}

#[inline]
async fn async_main(config: Config) -> anyhow::Result<()> {
    let session = Session::build(config.timeout).context("failed to build reqwest client")?;

    // Because `config` and `cli` modules have already validated the config, we can safely expect here.
    let mut crawler = Crawler::build(session, build_options(&config))
        .expect("wrong config validation, please raise an issue on GitHub");
    let mut events = crawler.subscribe();

    let saver = Saver::new(&config.download_dir)
        .ensure()
        .await
        .context("Unable to ensure the existence of the download directory")?;

    let spinner = build_spinner();
    let mut status = CrawlStatus {
        saved: 0,
        existed: 0,
        failed: 0,
        page_number: config.start_page.get(),
    };
    spinner.set_message(status_msg(&config.blog, &status));
    spinner.enable_steady_tick(Duration::from_secs_f32(SPINNER_TICK_SECS));

    let crawl = tokio::spawn(crawler.run());

    while let Some(event) = events.recv().await {
        match event {
            CrawlEvent::Record(record) => {
                // why `suspend`: https://docs.rs/indicatif/0.17.8/indicatif/struct.ProgressBar.html#method.suspend
                // why `{:#}`: https://docs.rs/anyhow/1.0.86/anyhow/struct.Error.html#display-representations
                match saver.save(&record).await {
                    Ok(SaveOutcome::Done) => status.saved += 1,
                    Ok(SaveOutcome::Existed) => status.existed += 1,
                    Err(err) => {
                        status.failed += 1;
                        spinner.suspend(|| eprintln!("{:#}", err));
                    }
                }
            }
            CrawlEvent::PageAdvance { page_number, .. } => status.page_number = page_number,
            // the crawl outcome is handled below, through the join
            CrawlEvent::Ended | CrawlEvent::Failed { .. } => {}
            // `CrawlEvent` is `#[non_exhaustive]` in this (binary) crate,
            // so a wildcard is required even though all current variants
            // are handled above.
            _ => {}
        }
        spinner.set_message(status_msg(&config.blog, &status));
    }

    let accumulated = crawl
        .await
        .context("crawl task panicked")?
        .context("crawl failed")?;

    if config.manifest {
        let manifest_path = saver.write_manifest(&accumulated).await?;
        spinner.suspend(|| println!("Manifest written to {}", manifest_path.display()));
    }

    spinner.finish();
    println!(
        "Done: {} saved, {} already existed, {} failed.",
        status.saved, status.existed, status.failed
    );

    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // here, if parse fails, the program will be `abort`ed, and no `Drop` will be called,
    // but it's okay, because we don't need to clean up anything.
    let cli = Cli::parse();

    let config = if let Some(blog) = cli.blog {
        Cli::config_for_blog(blog)?
    } else {
        match cli.config {
            Some(config) => config,
            None => match Cli::get_config_from_editor(&mut Cli::command()) {
                Ok(config) => config,
                // if we can't get the config from the editor, we drop the whole program.
                Err(err) => {
                    let _ = err.print();
                    return Ok(ExitCode::from(u8::try_from(err.exit_code()).unwrap()));
                }
            },
        }
    };

    let runtime = Runtime::new().context("failed to build tokio runtime")?;
    runtime.block_on(async {
        tokio::select! {
            result = async_main(config) => {result},
            result = signal::ctrl_c() => {
                result.expect("failed to listen for ctrl-c signal");
                println!("Ctrl-C received, exiting...");
                Ok(())
            },
        }
    })?;

    Ok(ExitCode::SUCCESS)
}
