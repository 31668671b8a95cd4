use std::{path::Path, sync::Arc};

use atrium::{
    adapters::{
        HandlerRegistry, LoginHandler, LogoutHandler, StaticLocaleResolver, StatusHandler,
        build_pipeline, session::SessionStore,
    },
    config::{ServerConfigValidator, models::ServerConfig},
    core::{AuthenticationGate, RouteTable},
    metrics, tracing_setup,
    utils::GracefulShutdown,
};
use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "atrium.yaml")]
    config: String,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        #[clap(short, long, default_value = "atrium.yaml")]
        config: String,
    },
    /// Initialize a new configuration file
    Init {
        /// Output path for the new config file
        #[clap(short, long, default_value = "atrium.yaml")]
        config: String,
    },
    /// Start the backend server (default)
    Serve {
        /// Configuration file to use
        #[clap(short, long, default_value = "atrium.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    // Determine the command to run
    let (command, config_path) = match args.command {
        Some(Commands::Validate { config }) => ("validate", config),
        Some(Commands::Init { config }) => ("init", config),
        Some(Commands::Serve { config }) => ("serve", config),
        None => ("serve", args.config), // Default to serve with config from args
    };

    match command {
        "validate" => {
            return validate_config_command(&config_path).await;
        }
        "init" => {
            return init_config_command(&config_path).await;
        }
        "serve" => {
            // Continue with normal server startup
        }
        _ => unreachable!(),
    }

    tracing_setup::init_tracing().map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    metrics::init_metrics();

    tracing::info!("Loading configuration from {config_path}");
    let config: ServerConfig = atrium::config::load_config(&config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    ServerConfigValidator::validate(&config).context("Configuration validation failed")?;
    let config = Arc::new(config);

    let table = Arc::new(
        RouteTable::from_entries(&config.routes).context("Failed to build the route table")?,
    );
    tracing::info!(routes = table.len(), "Route table built");

    let store = Arc::new(SessionStore::new(config.session.lifetime_secs));
    let locales = Arc::new(StaticLocaleResolver::new(&config.session.default_locale));
    let gate = Arc::new(AuthenticationGate::new(store.clone(), locales));

    let mut registry = HandlerRegistry::new();
    registry.register("login", Arc::new(LoginHandler));
    registry.register(
        "logout",
        Arc::new(LogoutHandler::new(
            store.clone(),
            &config.session.cookie_name,
            &config.login_path,
        )),
    );
    registry.register("status", Arc::new(StatusHandler));
    // Any configured target without a dedicated handler gets the status
    // handler so the pipeline stays drivable out of the box.
    for entry in &config.routes {
        if registry.get(&entry.target).is_none() {
            tracing::warn!(
                handler = %entry.target,
                route = %entry.id,
                "no handler registered for target; serving the status handler"
            );
            registry.register(&entry.target, Arc::new(StatusHandler));
        }
    }

    let app = build_pipeline(table, gate, Arc::new(registry), config.clone());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!("Atrium listening on {}", config.listen_addr);

    let shutdown = Arc::new(GracefulShutdown::new());
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown.run_signal_handler().await {
                tracing::error!("Signal handler error: {}", e);
            }
        });
    }

    let wait = {
        let shutdown = shutdown.clone();
        async move { shutdown.wait_for_shutdown().await }
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(wait)
        .await
        .context("Server error")?;

    tracing::info!("Atrium shut down cleanly");
    Ok(())
}

async fn validate_config_command(config_path: &str) -> Result<()> {
    tracing_setup::init_console_tracing()
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

    let config = atrium::config::load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    match ServerConfigValidator::validate(&config) {
        Ok(()) => {
            println!("Configuration '{config_path}' is valid ({} routes)", config.routes.len());
            Ok(())
        }
        Err(e) => Err(eyre!("Configuration '{config_path}' is invalid:\n{e}")),
    }
}

async fn init_config_command(config_path: &str) -> Result<()> {
    if Path::new(config_path).exists() {
        return Err(eyre!("Refusing to overwrite existing file '{config_path}'"));
    }

    let template = r#"listen_addr: "127.0.0.1:8080"
login_path: "/login"

session:
  cookie_name: "atrium_session"
  lifetime_secs: 28800
  default_locale: "en"

# Routes are matched literal-first, then variable patterns, then wildcard
# patterns; registration order breaks ties. A route without an "access"
# option requires an authenticated session.
routes:
  - id: "login"
    path: "/login"
    target: "login"
    access: "public"

  - id: "logout"
    path: "/logout"
    target: "logout"

  - id: "module"
    path: "/modules/{module}"
    target: "status"

  - id: "file_browser"
    path: "/files/{*path}"
    target: "status"
"#;

    tokio::fs::write(config_path, template)
        .await
        .with_context(|| format!("Failed to write '{config_path}'"))?;
    println!("Wrote starter configuration to '{config_path}'");
    Ok(())
}
