use anyhow::{Context, Result};
use flowbot::cli::commands::{RunCommand, StepsCommand, TimespanCommand, ValidateCommand};
use flowbot::cli::output::*;
use flowbot::cli::{Cli, Command};
use flowbot::core::{AppConfig, ExecutionContext, Timespan};
use flowbot::driver::{create_driver, ChallengeSolver, DriverKind, SolverConfig, SubprocessSolver};
use flowbot::execution::{Composer, CycleSupervisor, Namespace};
use flowbot::logging::{init_tracing, CascadingLogger};
use flowbot::steps::builtin_registry;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    init_tracing(cli.verbose)?;

    match &cli.command {
        Command::Run(cmd) => run_flow(&cli, cmd).await?,
        Command::Validate(cmd) => validate_flow(&cli, cmd).await?,
        Command::Steps(cmd) => list_steps(cmd)?,
        Command::Timespan(cmd) => show_timespan(cmd)?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    AppConfig::load(cli.config.as_deref()).context("Failed to load settings")
}

fn solver(config: &SolverConfig) -> Arc<dyn ChallengeSolver> {
    Arc::new(SubprocessSolver::new(config))
}

async fn run_flow(cli: &Cli, cmd: &RunCommand) -> Result<()> {
    let mut config = load_config(cli)?;

    if let Some(cycles) = cmd.cycles {
        config.supervisor.max_cycles = Some(cycles);
    }
    if cmd.dry_run {
        println!("{} Dry run: using the in-memory driver", INFO);
        config.driver.kind = DriverKind::Memory;
    }

    let registry = builtin_registry(solver(&config.solver));
    let flow = Composer::new(&registry, &config)
        .compose_flow()
        .await
        .context("Failed to compose flow")?;

    println!("{} Flow ready: {}", ROCKET, style(config.flow()?).bold());

    let ctx = ExecutionContext::new(create_driver(&config.driver), CascadingLogger::default());
    let mut supervisor = CycleSupervisor::new(config.supervisor.clone(), flow, ctx);

    let result = tokio::select! {
        result = supervisor.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            println!("\n{} Interrupted after {} cycles", WARN, supervisor.cycles());
            return Ok(());
        }
    };

    match result {
        Ok(cycles) => {
            println!("{} Completed {} cycles", CHECK, style(cycles).cyan());
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", format_supervisor_error(&e));
            std::process::exit(1);
        }
    }
}

async fn validate_flow(cli: &Cli, cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating settings...", INFO);

    let result = async {
        let config = load_config(cli)?;
        let registry = builtin_registry(solver(&config.solver));
        Composer::new(&registry, &config).compose_flow().await?;
        Ok::<_, anyhow::Error>(config)
    }
    .await;

    match result {
        Ok(config) => {
            let flow = config.flow()?;
            println!("{} Flow is valid!", CHECK);
            println!("  Steps: {}", style(flow.leaf_names().len()).cyan());
            println!("  Cycle delay: {}", style(config.supervisor.cycle_delay).cyan());
            println!("{}", format_tree(&flow));

            if cmd.json {
                let json = serde_json::to_string_pretty(&flow)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn list_steps(cmd: &StepsCommand) -> Result<()> {
    let registry = builtin_registry(solver(&SolverConfig::default()));
    let core = registry.names(Namespace::Core);
    let env = registry.names(Namespace::Environment);

    if cmd.json {
        let data = serde_json::json!({ "core": core, "env": env });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        println!("{}", format_names("Core steps", &core));
        println!("{}", format_names("Environment modules", &env));
    }

    Ok(())
}

fn show_timespan(cmd: &TimespanCommand) -> Result<()> {
    let timespan = Timespan::parse(&cmd.literal)
        .with_context(|| format!("Invalid timespan literal \"{}\"", cmd.literal))?;

    println!(
        "{} = {} ({} ms)",
        style(&cmd.literal).bold(),
        style(timespan).cyan(),
        timespan.as_millis()
    );
    Ok(())
}
