// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use nudgedash_app::{AppState, RefreshScheduler, refresh_all};
use nudgedash_client::Client;
use runtime::ClientRuntime;
use std::env;
use std::path::PathBuf;
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `nudgedash --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let mut board = config.board()?;
    let client = Client::new(config.endpoint(), config.timeout()?).with_context(|| {
        format!(
            "invalid [source] config in {}; fix endpoint/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only || options.once {
        logging::init_stderr()?;
        let report = refresh_all(&client, &mut board)
            .with_context(|| format!("refresh from {}", client.endpoint()))?;

        if options.check_only {
            if !report.skipped.is_empty() {
                bail!(
                    "{}; add a [[tables]] entry for each missing id in {}",
                    report.summary(),
                    options.config_path.display()
                );
            }
            println!("ok: {} from {}", report.summary(), client.endpoint());
        } else {
            print!("{}", nudgedash_tui::board_text(&config.navigation(), &board));
        }
        return Ok(());
    }

    let log_path = config.log_path()?;
    logging::init_file(&log_path)?;
    info!(
        endpoint = client.endpoint(),
        config = %options.config_path.display(),
        "starting dashboard"
    );

    let mut state = AppState::new(config.navigation());
    let scheduler = RefreshScheduler::new(config.refresh_interval()?);
    let mut runtime = ClientRuntime::new(client);
    nudgedash_tui::run_app(&mut state, board, scheduler, &mut runtime)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    once: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        once: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--once" => {
                options.once = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("nudgedash: terminal dashboard for nudgebot statistics");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and fetch statistics once");
    println!("  --once                   Fetch once and print every table, no TUI");
    println!("  --help                   Show this help");
    println!();
    println!("  NUDGEDASH_CONFIG_PATH    Config file override");
    println!("  {:<24} Log filter (default: info)", logging::LOG_FILTER_ENV);
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/nudgedash-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_example: false,
                check_only: false,
                once: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_config_value() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_mode_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check", "--once"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(options.once);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn once_keeps_config_override_in_either_order() -> Result<()> {
        for args in [
            vec!["--once", "--config", "/srv/nudgedash.toml"],
            vec!["--config", "/srv/nudgedash.toml", "--once"],
        ] {
            let options = parse_cli_args(args, default_options_path())?;
            assert_eq!(
                options,
                CliOptions {
                    config_path: PathBuf::from("/srv/nudgedash.toml"),
                    print_config_path: false,
                    print_example: false,
                    check_only: false,
                    once: true,
                    show_help: false,
                }
            );
        }
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
