use clap::Parser;
use tpc_report::{cli, config, error, pipeline, report};
use cli::Cli;
use config::Config;
use error::Result;
use pipeline::RunOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// CLI指定で設定を上書き
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.sessions_url {
        config.sources.sessions_url = Some(url.clone());
    }
    if let Some(url) = &cli.talks_url {
        config.sources.talks_url = Some(url.clone());
    }
    if let Some(provider) = cli.ai_provider {
        if provider != config.generation.provider {
            config.generation.provider = provider;
            config.generation.model = provider.default_model().into();
            config.generation.endpoint = None;
        }
    }
    if let Some(model) = &cli.model {
        config.generation.model = model.clone();
    }
}

fn show_config(config: &Config) {
    println!("設定:");
    println!("  プロバイダ: {}", config.generation.provider);
    println!("  モデル: {}", config.generation.model);
    println!("  エンドポイント: {}", config.generation.endpoint_url());
    println!("  最大トークン: {}", config.generation.max_tokens);
    println!("  temperature: {}", config.generation.temperature);
    println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
    println!(
        "  セッション一覧: {}",
        config.sources.sessions_url.as_deref().unwrap_or("未設定")
    );
    println!(
        "  トーク表: {}",
        config.sources.talks_url.as_deref().unwrap_or("未設定")
    );
    println!(
        "  マスタープロンプト: {}",
        config
            .master_prompt
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "組み込み".into())
    );
}

async fn run(cli: &Cli, work_dir: PathBuf) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, cli);

    if cli.show_config {
        show_config(&config);
        return Ok(());
    }

    let group = pipeline::require_group(cli.group.as_deref())?;

    println!("📝 tpc-report - セッションレポート生成: {}\n", group);

    let options = RunOptions {
        group,
        attendees: cli.attendees.clone(),
        notes: cli.notes.clone(),
        output: cli.output.clone(),
        prompt_only: cli.prompt_only,
        verbose: cli.verbose,
        work_dir,
    };

    let outcome = pipeline::run(&options, &config).await?;

    println!(
        "\n✅ 完了: {} ({}件のトーク, 参加者{}, 議事メモ{})",
        outcome.session,
        outcome.talk_count,
        if outcome.attendees_available { "あり" } else { "なし" },
        if outcome.notes_available { "あり" } else { "なし" },
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let code = match run(&cli, work_dir.clone()).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("\n{} {}", e.tag(), e);
            for line in e.diagnostic_context() {
                eprintln!("{}", line);
            }

            match report::write_diagnostic(&work_dir, &e, cli.group.as_deref(), chrono::Local::now()) {
                Ok(path) => eprintln!("診断ファイル: {}", path.display()),
                Err(write_err) => tracing::error!(error = %write_err, "failed to write diagnostic file"),
            }
            e.exit_code()
        }
    };

    std::process::exit(code);
}
