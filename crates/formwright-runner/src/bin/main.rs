use clap::Parser;
use formwright_runner::{AnswerMap, Config, FieldKind, FieldOutcome, Runner};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "formwright-runner")]
#[command(about = "Declarative form filling")]
#[command(version)]
struct Cli {
    /// Site config to run
    config: PathBuf,

    /// Answers file (YAML mapping of field name to value)
    #[arg(short, long, value_name = "FILE")]
    answers: Option<PathBuf>,

    /// Set an answer (can be used multiple times)
    #[arg(short = 'A', long = "answer", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config and answers without running
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> formwright_runner::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = Config::load(&cli.config)?;

    // Answers file first, then -A overrides
    let mut answers = match cli.answers {
        Some(ref path) => AnswerMap::load(path)?,
        None => AnswerMap::new(),
    };
    answers = answers.merge(&AnswerMap::from_args(&cli.overrides)?);

    if cli.check {
        println!("Config valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  Steps: {}", config.steps.len());
        for (i, step) in config.steps.iter().enumerate() {
            println!("    {}. {} ({} fields)", i + 1, step.display_name(i), step.fields.len());
            for field in &step.fields {
                let req = if field.required { " (required)" } else { "" };
                let detail = match (&field.group, field.kind) {
                    (Some(group), FieldKind::RepeatableGroup) => {
                        format!(" [{} entry fields]", group.entry.fields.len())
                    }
                    _ => String::new(),
                };
                println!("       - {}: {}{}{}", field.name, field.kind, req, detail);
            }
        }
        if let Some(ref on_failure) = config.on_failure {
            if let Some(ref screenshot) = on_failure.screenshot {
                println!("  Failure screenshot: {}", screenshot);
            }
        }
        let missing = config.missing_answers(&config.answers(&answers));
        if !missing.is_empty() {
            println!("  Missing required answers:");
            for name in &missing {
                println!("    - {}", name);
            }
            std::process::exit(1);
        }
        return Ok(());
    }

    // Override headless if specified
    if cli.headless {
        config.browser.headless = true;
    }

    println!("Running: {}", config.name);

    let runner = Runner::new(&config.browser).await?;
    let result = runner.run(&config, &answers).await?;

    // Print result
    println!();
    if result.success {
        println!("✓ Success");
    } else {
        println!("✗ Failed");
        if let Some(ref error) = result.error {
            println!("  Error: {}", error);
        }
    }
    for step in &result.report.steps {
        let filled = step
            .fill
            .fields
            .iter()
            .filter(|f| f.outcome == FieldOutcome::Filled)
            .count();
        println!("  {}: {}/{} fields filled", step.name, filled, step.fill.fields.len());
    }
    println!("  Duration: {}ms", result.duration_ms);

    runner.close().await?;

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
