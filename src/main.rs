use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use newsdesk::api::{ApiClient, HttpApiClient, ImageFile};
use newsdesk::browser;
use newsdesk::controller::NewsController;
use newsdesk::editor::{self, EditorError};
use newsdesk::export;
use newsdesk::form::NewsForm;
use newsdesk::models::{Category, NewsId, Severity};
use newsdesk::session::SessionStore;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "Manage news items on the newsdesk API", long_about = None)]
struct Cli {
    /// Base URL of the news API
    #[arg(long, env = "NEWSDESK_API_URL", default_value = "http://localhost:8080", global = true)]
    api_url: String,
    /// Request timeout in seconds
    #[arg(long, env = "NEWSDESK_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct NewsFields {
    #[arg(long)]
    title_ar: Option<String>,
    #[arg(long)]
    title_en: Option<String>,
    #[arg(long)]
    description_ar: Option<String>,
    #[arg(long)]
    description_en: Option<String>,
    #[arg(long)]
    category: Option<Category>,
    /// Publication date, YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
    /// Image file to upload
    #[arg(long)]
    image: Option<String>,
}

impl NewsFields {
    fn apply_to(&self, form: &mut NewsForm) {
        let set = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                *target = value.clone();
            }
        };
        set(&mut form.title_arabic, &self.title_ar);
        set(&mut form.title_english, &self.title_en);
        set(&mut form.description_arabic, &self.description_ar);
        set(&mut form.description_english, &self.description_en);
        set(&mut form.date, &self.date);
        if let Some(category) = self.category {
            form.category = category.label().to_string();
        }
    }

    async fn image_file(&self) -> Result<Option<ImageFile>, EditorError> {
        match &self.image {
            Some(path) => ImageFile::from_path(path).await.map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Store the API token used by every other command
    Login {
        #[arg(short, long)]
        token: String,
    },
    Logout,
    List {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<Category>,
        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: u64,
    },
    Show {
        #[arg(short, long)]
        id: String,
    },
    Create(NewsFields),
    Update {
        #[arg(short, long)]
        id: String,
        #[command(flatten)]
        fields: NewsFields,
    },
    Delete {
        #[arg(short, long)]
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Write every news item matching the filters to a CSV file
    Export {
        #[arg(short, long)]
        output: String,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// Interactive list browser
    Browse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The browser owns the terminal, keep logs quiet unless asked for
    let default_level = if matches!(cli.command, Commands::Browse) { "off" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let store = SessionStore::new()?;

    let token = match &cli.command {
        Commands::Login { token } => {
            store.save_token(token)?;
            println!("Logged in.");
            return Ok(());
        }
        Commands::Logout => {
            store.clear()?;
            println!("Logged out.");
            return Ok(());
        }
        _ => store.require_token()?,
    };

    let client = HttpApiClient::new(&cli.api_url, Some(token), Duration::from_secs(cli.timeout))
        .context("Failed to build HTTP client")?;
    let controller = NewsController::new(client);

    let ok = run(cli.command, &controller).await?;
    if !ok {
        std::process::exit(1);
    }

    Ok(())
}

/// Returns false when the command ended in a reported failure
async fn run<C: ApiClient>(command: Commands, controller: &NewsController<C>) -> Result<bool> {
    match command {
        Commands::Login { .. } | Commands::Logout => Ok(true),
        Commands::List { search, category, page } => {
            controller.set_search(search.unwrap_or_default());
            controller.set_category(category);
            controller.apply_filters().await;
            if page > 1 {
                controller.change_page(page - 1).await;
            }

            let state = controller.snapshot();
            if report(controller) {
                println!(
                    "News {} (page {}/{})",
                    state.result.total_count,
                    state.page + 1,
                    state.result.page_count
                );
                for record in &state.result.news {
                    println!(
                        "  [{}] {} · {} · {}",
                        record.id,
                        record.display_title(),
                        record.category.label(),
                        record.date.map_or("-".to_string(), |d| d.format("%Y-%m-%d").to_string())
                    );
                }
                Ok(true)
            } else {
                Ok(false)
            }
        }
        Commands::Show { id } => {
            let id: NewsId = id.parse()?;
            match controller.fetch_record_by_id(&id).await {
                Some(record) => {
                    println!("[{}]", record.id);
                    for line in browser::detail_lines(&record, 80) {
                        println!("{}", line);
                    }
                    Ok(true)
                }
                None => Ok(report(controller)),
            }
        }
        Commands::Create(fields) => {
            let mut form = NewsForm::new();
            fields.apply_to(&mut form);
            let outcome = match fields.image_file().await {
                Ok(image) => editor::create_news(controller, form, image).await,
                Err(err) => Err(err),
            };
            Ok(finish_edit(controller, outcome))
        }
        Commands::Update { id, fields } => {
            let id: NewsId = id.parse()?;
            let Some(existing) = controller.fetch_record_by_id(&id).await else {
                return Ok(report(controller));
            };

            let mut form = NewsForm::from_record(&existing);
            fields.apply_to(&mut form);
            let outcome = match fields.image_file().await {
                Ok(image) => editor::update_news(controller, &id, form, image).await,
                Err(err) => Err(err),
            };
            Ok(finish_edit(controller, outcome))
        }
        Commands::Delete { id, yes } => {
            let id: NewsId = id.parse()?;
            controller.request_deletion(id.clone());

            if !yes && !confirm(&format!("Delete news {}? This action cannot be undone. [y/N] ", id))? {
                controller.cancel_deletion();
                println!("Cancelled.");
                return Ok(true);
            }

            let deleted = controller.confirm_deletion().await;
            report(controller);
            Ok(deleted)
        }
        Commands::Export { output, search, category } => {
            controller.set_search(search.unwrap_or_default());
            controller.set_category(category);
            controller.apply_filters().await;
            if !report(controller) {
                return Ok(false);
            }

            let records = controller.fetch_all_matching().await;
            if records.is_empty() {
                println!("No news to export.");
                return Ok(true);
            }

            let path = PathBuf::from(shellexpand::tilde(&output).to_string());
            export::export_to_path(&records, &path)?;
            println!("✓ Exported {} items to {}", records.len(), path.display());
            Ok(true)
        }
        Commands::Browse => {
            browser::run_browser(controller).await?;
            Ok(true)
        }
    }
}

fn finish_edit<C: ApiClient>(
    controller: &NewsController<C>,
    outcome: Result<serde_json::Value, EditorError>,
) -> bool {
    match outcome {
        Ok(_) => report(controller),
        Err(EditorError::Save(_)) => {
            // the controller already queued the user-facing message
            report(controller);
            false
        }
        Err(err) => {
            eprintln!("  ✗ {}", err);
            false
        }
    }
}

/// Prints and drains queued notifications. Returns false if any was an error.
fn report<C: ApiClient>(controller: &NewsController<C>) -> bool {
    let mut ok = true;
    for notification in controller.drain_notifications() {
        match notification.severity {
            Severity::Success => println!("  ✓ {}", notification.message),
            Severity::Error => {
                ok = false;
                eprintln!("  ✗ {}", notification.message);
            }
        }
    }
    ok
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
