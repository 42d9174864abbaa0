//! CLI entry point for cryptoblog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cryptoblog::commands::setup_admin::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD};
use cryptoblog::Blog;

#[derive(Parser)]
#[command(name = "cryptoblog")]
#[command(version)]
#[command(about = "A server-rendered crypto-news blog with an admin console", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    #[command(alias = "s")]
    Server {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to the configured host)
        #[arg(short, long)]
        ip: Option<String>,

        /// Keep content in memory instead of using the hosted backend
        #[arg(long)]
        in_memory: bool,
    },

    /// Print sitemap.xml
    Sitemap,

    /// Print robots.txt
    Robots,

    /// List site content
    List {
        /// Type of content to list (post, page, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Create the admin account in the hosted auth service
    SetupAdmin {
        #[arg(long, default_value = DEFAULT_ADMIN_EMAIL)]
        email: String,

        #[arg(long, default_value = DEFAULT_ADMIN_PASSWORD)]
        password: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; variables may come from the environment
    let _ = dotenvy::dotenv();

    // Initialize logging
    let filter = if cli.debug {
        "cryptoblog=debug,info"
    } else {
        "cryptoblog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Server {
            port,
            ip,
            in_memory,
        } => {
            let blog = if in_memory {
                Blog::in_memory(&base_dir)?
            } else {
                Blog::new(&base_dir)?
            };
            let ip = ip.unwrap_or_else(|| blog.config.host.clone());
            let port = port.unwrap_or(blog.config.port);

            tracing::info!("Starting server at http://{}:{}", ip, port);
            blog.serve(&ip, port).await?;
        }

        Commands::Sitemap => {
            let blog = Blog::new(&base_dir)?;
            cryptoblog::commands::sitemap::run(&blog).await?;
        }

        Commands::Robots => {
            let blog = Blog::new(&base_dir)?;
            cryptoblog::commands::sitemap::robots(&blog)?;
        }

        Commands::List { r#type } => {
            let blog = Blog::new(&base_dir)?;
            cryptoblog::commands::list::run(&blog, &r#type).await?;
        }

        Commands::SetupAdmin { email, password } => {
            let blog = Blog::new(&base_dir)?;
            cryptoblog::commands::setup_admin::run(&blog, &email, &password).await?;
        }

        Commands::Version => {
            println!("cryptoblog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
