//! Hexacopter Launch CLI
//!
//! Usage:
//!   hexacopter_launch
//!   hexacopter_launch launch/hexacopter.yaml -a entity:=hexa_1 --gui
//!   hexacopter_launch --format yaml > plan.yaml

use hexacopter_launch::{
    AmentIndex, LaunchArgs, LaunchConfig, LaunchPlanBuilder, StaticResolver,
};

fn main() {
    let args: LaunchArgs = argh::from_env();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "info",
    };
    let env = env_logger::Env::default().default_filter_or(log_level);
    env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .init();

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading launch config: {}", path);
            match LaunchConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Failed to load launch config: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            log::info!("Using built-in hexacopter launch config");
            LaunchConfig::default()
        }
    };

    // Validate only mode
    if args.validate {
        if let Err(e) = config.validate() {
            log::error!("Invalid launch config: {}", e);
            std::process::exit(1);
        }
        println!("Launch config is valid");
        println!("  Version: {}", config.version);
        println!("  Args: {}", config.args.len());
        println!("  Robot package: {}", config.robot.package);
        println!("  Controllers: {}", config.controllers.names.join(", "));
        return;
    }

    let mut builder = match LaunchPlanBuilder::new(config, args.arg_overrides()) {
        Ok(builder) => builder,
        Err(e) => {
            log::error!("Failed to create plan builder: {}", e);
            std::process::exit(1);
        }
    };
    if args.gui {
        builder = builder.with_gui(true);
    }

    let explicit = args
        .share
        .iter()
        .fold(StaticResolver::new(), |resolver, (package, dir)| {
            resolver.with_package(package, dir)
        });

    let result = if args.share.is_empty() {
        AmentIndex::from_env()
            .map_err(Into::into)
            .and_then(|index| builder.build(&index))
    } else {
        match AmentIndex::from_env() {
            Ok(index) => builder.build(&(explicit, index)),
            Err(e) => {
                log::debug!("{}; using --share entries only", e);
                builder.build(&explicit)
            }
        }
    };

    let plan = match result {
        Ok(plan) => plan,
        Err(e) => {
            log::error!("Failed to build launch plan: {}", e);
            std::process::exit(1);
        }
    };

    match args.format.render(&plan) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
