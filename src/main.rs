use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use std::process::ExitCode;
use zh_en_ru_translator::cli::{Args, Command, DownloadArgs, StatusArgs};
use zh_en_ru_translator::models::{REQUIRED_FILES, TRANSLATION_MODEL, missing_files, model_dir};
use zh_en_ru_translator::report::{collect_states, render_fatal, render_report, render_status};
use zh_en_ru_translator::session::build_session;
use zh_en_ru_translator::{Downloader, SourceCatalog};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Download(args) => download(args).await,
        Command::Status(args) => status(args),
    }
}

async fn download(args: DownloadArgs) -> Result<ExitCode> {
    let config = args.resolve().context("Failed to load configuration")?;
    let catalog = SourceCatalog::builtin().context("Invalid source catalog")?;
    let client = build_session(config.enable_proxy, config.proxy.as_deref())
        .context("Failed to build HTTP client")?;

    let downloader = Downloader::new(client, &config.models_root, config.concurrency);
    let models = vec![TRANSLATION_MODEL.to_string()];

    let run = match downloader
        .run(&catalog, config.source, &models, &REQUIRED_FILES, !args.no_progress)
        .await
    {
        Ok(run) => run,
        Err(e) => {
            println!("{}", render_fatal(&e));
            return Ok(ExitCode::FAILURE);
        }
    };

    for status in run.statuses.iter().filter(|s| !s.is_success()) {
        warn!("{status}");
    }

    print!("{}", render_report(downloader.models_root(), &models, &REQUIRED_FILES));

    let complete = models.iter().all(|model| {
        missing_files(&model_dir(downloader.models_root(), model), &REQUIRED_FILES).is_empty()
    });
    Ok(if complete && run.model_errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn status(args: StatusArgs) -> Result<ExitCode> {
    let config = args.common.resolve().context("Failed to load configuration")?;
    let models = vec![TRANSLATION_MODEL.to_string()];
    let states = collect_states(&config.models_root, &models, &REQUIRED_FILES);

    let missing = missing_files(
        &model_dir(&config.models_root, TRANSLATION_MODEL),
        &REQUIRED_FILES,
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&states).context("Failed to serialize status")?
        );
    } else {
        print!("{}", render_status(&config.models_root, &states));
        if missing.is_empty() {
            println!("Translator ready.");
        } else {
            println!("Translator not ready: missing {}", missing.join(", "));
        }
    }

    Ok(if missing.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
