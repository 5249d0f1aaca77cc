use book_catalog::common::{SearchView, find_by_id, validate};
use book_catalog::{cli, config, error, Alert, AlertKind, Entry, RequestState};
use clap::Parser;
use cli::{Cli, Commands, OutputFormat};
use config::Config;
use error::{CatalogError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const COLLECTION: &str = "books";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOGがあれば優先
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "info" } else { "warn" }));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load()?;
    if let Some(url) = &cli.url {
        config.base_url = url.clone();
    }

    match cli.command {
        Commands::List { search } => {
            let books: RequestState<Vec<Entry>> = RequestState::from_config(&config)?;
            books.get(COLLECTION).await?;
            report(&books.alert(), cli.format)?;

            let data = books.data().unwrap_or_default();
            let mut view = SearchView::new();
            view.set_query(search.unwrap_or_default());
            let visible = view.apply(&data);

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&visible)?),
                OutputFormat::Text => {
                    for book in &visible {
                        print_summary(book);
                    }
                    println!("\n{} / {}冊", visible.len(), data.len());
                }
            }
        }

        Commands::Show { id } => {
            let books: RequestState<Vec<Entry>> = RequestState::from_config(&config)?;
            books.get(COLLECTION).await?;
            report(&books.alert(), cli.format)?;

            let data = books.data().unwrap_or_default();
            let book = find_by_id(&data, &id).ok_or(CatalogError::EntryNotFound(id))?;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(book)?),
                OutputFormat::Text => print_detail(book),
            }
        }

        Commands::Add { entry } => {
            let book = entry.to_entry(None);
            check(&book)?;

            let books: RequestState<Value> = RequestState::from_config(&config)?;
            books.post(COLLECTION, &book).await?;
            report(&books.alert(), cli.format)?;
            print_response(books.data(), cli.format)?;
        }

        Commands::Update { id, entry } => {
            let book = entry.to_entry(Some(&id));
            check(&book)?;

            let books: RequestState<Value> = RequestState::from_config(&config)?;
            books.update(&format!("{}/{}", COLLECTION, id), &book).await?;
            report(&books.alert(), cli.format)?;
            print_response(books.data(), cli.format)?;
        }

        Commands::Remove { id } => {
            let books: RequestState<Value> = RequestState::from_config(&config)?;
            books.remove(&format!("{}/{}", COLLECTION, id)).await?;
            report(&books.alert(), cli.format)?;
        }

        Commands::Config { set_url, show } => {
            let mut config = Config::load()?;

            if let Some(url) = set_url {
                config.set_base_url(url)?;
                println!("✔ 接続先を設定しました");
            }

            if show {
                println!("設定:");
                println!("  接続先: {}", config.base_url);
                println!("  通知表示時間: {}秒", config.alert_seconds);
                match config.timeout() {
                    Some(timeout) => println!("  タイムアウト: {}秒", timeout.as_secs()),
                    None => println!("  タイムアウト: なし"),
                }
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

/// 通知を表示し、失敗ならエラーとして返す
fn report(alert: &Alert, format: OutputFormat) -> Result<()> {
    match alert.kind {
        AlertKind::Error => {
            if format == OutputFormat::Text {
                eprintln!("✖ {}", alert.message);
            }
            Err(CatalogError::Request(alert.message.clone()))
        }
        AlertKind::Success if format == OutputFormat::Text => {
            eprintln!("✔ {}", alert.message);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// 登録前の入力チェック
fn check(book: &Entry) -> Result<()> {
    let issues = validate(book);
    if issues.is_empty() {
        return Ok(());
    }

    let text = issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
    Err(CatalogError::InvalidEntry(text))
}

fn print_response(data: Option<Arc<Value>>, format: OutputFormat) -> Result<()> {
    let Some(data) = data else {
        return Ok(());
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*data)?),
        OutputFormat::Text => {
            // 一覧が返ってきた場合は件数だけ表示
            if let Value::Array(items) = &*data {
                println!("{}冊", items.len());
            } else if let Ok(book) = serde_json::from_value::<Entry>((*data).clone()) {
                print_summary(&book);
            }
        }
    }
    Ok(())
}

fn print_summary(book: &Entry) {
    let id = book.id.as_ref().map(|i| i.to_string()).unwrap_or_else(|| "-".into());
    let stars = book.stars.map(|s| format!(" ★{}", s)).unwrap_or_default();
    let genres = if book.genres.is_empty() {
        String::new()
    } else {
        format!(" [{}]", book.genres.join(", "))
    };
    println!("{:>4}  {} / {}{}{}", id, book.name, book.author, stars, genres);
}

fn print_detail(book: &Entry) {
    println!("{}", book.name);
    println!("  著者: {}", book.author);
    println!("  ジャンル: {}", book.genres.join(", "));
    match book.stars {
        Some(stars) => println!("  評価: {}/5", stars),
        None => println!("  評価: 未評価"),
    }
    if let Some(img) = &book.img {
        println!("  表紙: {}", img);
    }
    if let Ok(Some(start)) = book.start_date() {
        println!("  読み始め: {}", start);
    }
    if let Ok(Some(end)) = book.end_date() {
        println!("  読み終わり: {}", end);
    }
    println!("  状態: {}", if book.completed { "読了" } else { "読書中" });
}
