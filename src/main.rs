use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use mercari_storefront::api::{MarketApi, MarketClient};
use mercari_storefront::config::{self, Config};
use mercari_storefront::display::ImageStore;
use mercari_storefront::model::{CategoryId, ImageFile, ItemId};
use mercari_storefront::notify::{LogNotifier, Notifier};
use mercari_storefront::route::Route;
use mercari_storefront::screens::{
    DetailScreen, DraftField, ListingScreen, PurchaseOutcome, SubmitOutcome,
};
use mercari_storefront::session::Session;

#[derive(Debug, Parser)]
#[command(author, version, about = "Browse, buy and sell items on the storefront")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "storefront.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Navigate to a route such as /item/3 or /sell
    Open { route: String },
    /// Show an item
    Item { id: ItemId },
    /// Buy an item, then show it again
    Purchase { id: ItemId },
    /// Print the category catalog
    Categories,
    /// Create an item and put it on sale
    List {
        #[arg(long)]
        name: String,
        /// Category id; defaults to the first category
        #[arg(long)]
        category: Option<CategoryId>,
        #[arg(long)]
        price: i64,
        #[arg(long)]
        description: String,
        /// Image file to upload
        #[arg(long)]
        image: PathBuf,
    },
    /// Put an already created item on sale
    Sell { item_id: ItemId },
}

struct App {
    cfg: Config,
    api: Arc<dyn MarketApi>,
    notifier: Arc<dyn Notifier>,
    images: ImageStore,
}

impl App {
    fn new(cfg: Config) -> Result<Self> {
        let api = MarketClient::from_config(&cfg).context("failed to build API client")?;
        let images = ImageStore::in_data_dir(&cfg.app.data_dir)
            .context("failed to prepare image directory")?;
        Ok(Self {
            cfg,
            api: Arc::new(api),
            notifier: Arc::new(LogNotifier),
            images,
        })
    }

    fn session(&self) -> Result<Session> {
        if let Ok(header) = std::env::var(config::COOKIES_ENV) {
            return Ok(Session::from_header(header));
        }
        Session::from_file(&self.cfg.session.cookie_file).with_context(|| {
            format!(
                "failed to read cookie store {}",
                self.cfg.session.cookie_file
            )
        })
    }

    fn detail(&self, id: ItemId) -> DetailScreen {
        DetailScreen::new(
            self.api.clone(),
            self.notifier.clone(),
            self.images.clone(),
            id,
        )
    }

    fn listing(&self) -> ListingScreen {
        ListingScreen::new(self.api.clone(), self.notifier.clone(), self.images.clone())
    }

    async fn show_item(&self, id: ItemId) -> Result<()> {
        let mut screen = self.detail(id);
        screen.load().await;
        print_detail(&screen);
        Ok(())
    }

    async fn show_sell_form(&self) -> Result<()> {
        let mut screen = self.listing();
        screen.load().await;
        println!("{}", screen.view());
        Ok(())
    }

    async fn purchase(&self, id: ItemId) -> Result<()> {
        let creds = self.session()?.credentials()?;
        let mut screen = self.detail(id);
        screen.load().await;
        match screen.purchase(&creds).await {
            PurchaseOutcome::Purchased => info!(item_id = id, "purchased"),
            PurchaseOutcome::Rejected => {}
            PurchaseOutcome::Unavailable => {
                print_detail(&screen);
                return Err(anyhow!("item {} cannot be purchased", id));
            }
        }
        print_detail(&screen);
        Ok(())
    }

    async fn categories(&self) -> Result<()> {
        let mut screen = self.listing();
        screen.load().await;
        for category in screen.categories() {
            println!("{}\t{}", category.id, category.name);
        }
        Ok(())
    }

    async fn list(
        &self,
        name: String,
        category: Option<CategoryId>,
        price: i64,
        description: String,
        image: PathBuf,
    ) -> Result<()> {
        let creds = self.session()?.credentials()?;
        let file = ImageFile::read(&image)
            .await
            .with_context(|| format!("failed to read image {}", image.display()))?;

        let mut screen = self.listing();
        screen.load().await;
        screen.set_field(DraftField::Name(name));
        if let Some(category) = category {
            screen.set_field(DraftField::CategoryId(category));
        }
        screen.set_field(DraftField::Price(price));
        screen.set_field(DraftField::Description(description));
        screen.select_image(file).await;
        println!("{}", screen.view());

        match screen.submit(&creds).await {
            SubmitOutcome::Listed { item_id } => {
                println!("Listed item {} ({})", item_id, Route::ItemDetail(item_id));
                Ok(())
            }
            SubmitOutcome::CreatedUnlisted { item_id } => Err(anyhow!(
                "item {} was created but is not on sale yet; retry with `sell {}`",
                item_id,
                item_id
            )),
            SubmitOutcome::CreateFailed => Err(anyhow!("item was not created")),
            SubmitOutcome::Incomplete => Err(anyhow!("the form is incomplete")),
        }
    }

    async fn sell(&self, item_id: ItemId) -> Result<()> {
        let creds = self.session()?.credentials()?;
        match self.listing().sell(&creds, item_id).await {
            SubmitOutcome::Listed { .. } => Ok(()),
            _ => Err(anyhow!("item {} is still not on sale", item_id)),
        }
    }
}

fn print_detail(screen: &DetailScreen) {
    match screen.view() {
        Some(view) => println!("{}", view),
        None => println!("{}", screen.phase()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;
    let app = App::new(cfg)?;

    match args.command {
        Command::Open { route } => match route.parse::<Route>()? {
            Route::ItemDetail(id) => app.show_item(id).await,
            Route::Sell => app.show_sell_form().await,
        },
        Command::Item { id } => app.show_item(id).await,
        Command::Purchase { id } => app.purchase(id).await,
        Command::Categories => app.categories().await,
        Command::List {
            name,
            category,
            price,
            description,
            image,
        } => app.list(name, category, price, description, image).await,
        Command::Sell { item_id } => app.sell(item_id).await,
    }
}
