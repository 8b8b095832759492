use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use vitrine::config::ViewConfig;
use vitrine::domain::Product;
use vitrine::services::{InMemoryFavouriteStore, InMemoryProductService, TracingNavigator};
use vitrine::ui::ProductListView;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = ViewConfig::load()?;

    let product_service = Arc::new(InMemoryProductService::with_demo_catalog());
    let favourite_store = Arc::new(InMemoryFavouriteStore::new());

    let view = ProductListView::new(
        product_service,
        Arc::clone(&favourite_store) as Arc<dyn vitrine::services::FavouriteStore>,
        Arc::new(TracingNavigator),
        &config,
    );

    // Let the view pick up the initial catalogue before the first render.
    tokio::time::sleep(Duration::from_millis(50)).await;

    println!("vitrine - product catalogue browser");
    println!("  /<text>      filter by name (/ alone clears)");
    println!("  :next :prev  change page");
    println!("  :select <id> open a product");
    println!("  :fav <id>    mark a product as favourite");
    println!("  :reset       reload the catalogue");
    println!("  :show        re-render   :quit  exit");
    render(&view);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        match line.as_str() {
            ":quit" | ":q" => break,
            ":next" => view.next_page(),
            ":prev" => view.previous_page(),
            ":show" => {}
            ":reset" => {
                view.reset().await?;
                settle(&config).await;
            }
            cmd if cmd.starts_with(":select ") => match lookup(&view, &cmd[8..]) {
                Some(product) => view.select(&product),
                None => println!("no such product"),
            },
            cmd if cmd.starts_with(":fav ") => match lookup(&view, &cmd[5..]) {
                Some(product) => {
                    favourite_store.add_favourite(product);
                    settle(&config).await;
                }
                None => println!("no such product"),
            },
            cmd if cmd.starts_with('/') => {
                view.type_filter(&cmd[1..]);
                settle(&config).await;
            }
            other => {
                println!("unknown command: {other}");
                continue;
            }
        }
        render(&view);
    }

    Ok(())
}

/// Give the pipelines time to apply the last command before rendering.
async fn settle(config: &ViewConfig) {
    tokio::time::sleep(Duration::from_millis(config.debounce_ms + 50)).await;
}

fn lookup(view: &ProductListView, raw_id: &str) -> Option<Product> {
    let id: u32 = raw_id.trim().parse().ok()?;
    view.snapshot().products.into_iter().find(|p| p.id == id)
}

fn render(view: &ProductListView) {
    let snapshot = view.snapshot();

    println!();
    println!("== {} ==", snapshot.title);
    if snapshot.filtered {
        println!(
            "filter \"{}\" - {} matching",
            snapshot.filter, snapshot.products_number
        );
    } else {
        println!("{} products", snapshot.products_number);
    }

    for product in view.page() {
        let marker = if snapshot.selected_product.as_ref().map(|p| p.id) == Some(product.id) {
            ">"
        } else {
            " "
        };
        println!(
            "{marker} [{:>3}] {:<12} {:>6.2}",
            product.id, product.name, product.price
        );
    }

    println!(
        "page {} ({}..{})  favourites: {}{}",
        snapshot.pagination.current_page,
        snapshot.pagination.start,
        snapshot.pagination.end,
        view.favourites(),
        snapshot
            .favourite_added
            .as_ref()
            .map(|p| format!("  (last added: {})", p.name))
            .unwrap_or_default(),
    );
}
