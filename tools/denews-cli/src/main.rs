//! DeNews CLI: command-line client for the DeNews publishing platform.
//!
//! Dispatches user intents into the article synchronization workflow and
//! renders per-operation status: in-progress, success, recoverable
//! failure, or fatal failure.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use denews_client::{
    AccessLevel, Address, Article, ArticleDraft, ArticleSyncService, ClientConfig, ClientError,
    ContentHash, HttpContentGateway, LedgerRpc, LivenessMonitor, NewsroomApi, PublishError, Role,
    RpcTransport, StoreConfig, WalletRpc, WalletSession, WorkflowEvent,
};

/// DeNews command-line client.
#[derive(Parser, Debug)]
#[command(name = "denews")]
#[command(about = "Browse, publish, and administer DeNews articles")]
struct Args {
    /// JSON-RPC endpoint serving wallet and ledger methods
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    rpc: String,

    /// Address of the deployed DeNews contract
    #[arg(long)]
    contract: Address,

    /// The deployment's admin identity
    #[arg(long)]
    admin: Address,

    /// Content-store daemon API host
    #[arg(long, default_value = "127.0.0.1")]
    store_host: String,

    /// Content-store daemon API port
    #[arg(long, default_value = "5001")]
    store_port: u16,

    /// Public gateway base URL for content links
    #[arg(long, default_value = "http://localhost:8080")]
    store_gateway: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show wallet connection, role, and content-store liveness
    Status {
        /// Keep watching liveness and wallet changes until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// List articles (public feed, or your own with --mine)
    List {
        /// Only articles published by the connected wallet
        #[arg(long)]
        mine: bool,
        /// Sort newest first instead of ledger id order
        #[arg(long)]
        newest_first: bool,
    },
    /// Fetch and print one article's body
    Read {
        /// Article id
        id: u64,
    },
    /// Upload content and record the article on the ledger
    Publish {
        /// Article title
        #[arg(long)]
        title: String,
        /// Read the body from this file ("-" for stdin)
        #[arg(long)]
        file: String,
        /// Restrict visibility instead of publishing publicly
        #[arg(long)]
        restricted: bool,
    },
    /// Re-record an already-uploaded body using its content hash
    Resubmit {
        /// Article title
        #[arg(long)]
        title: String,
        /// Content hash from the earlier upload
        #[arg(long)]
        hash: ContentHash,
        /// Restrict visibility instead of publishing publicly
        #[arg(long)]
        restricted: bool,
    },
    /// Authorize a new author (admin only)
    AddAuthor {
        /// Identity to authorize
        address: Address,
    },
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            rpc_endpoint: self.rpc.clone(),
            contract_address: self.contract.clone(),
            admin_address: self.admin.clone(),
            store: StoreConfig {
                host: self.store_host.clone(),
                port: self.store_port,
                protocol: "http".to_string(),
                public_gateway: self.store_gateway.clone(),
            },
            ..ClientConfig::default()
        }
    }
}

/// Everything a command needs, wired once per invocation.
struct App {
    config: ClientConfig,
    wallet: Arc<WalletRpc>,
    session: WalletSession<WalletRpc>,
    gateway: Arc<HttpContentGateway>,
    service: ArticleSyncService<LedgerRpc, HttpContentGateway>,
}

impl App {
    fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(
            RpcTransport::new(&config.rpc_endpoint)
                .map_err(|e| anyhow!("cannot build RPC client: {e:?}"))?,
        );
        let wallet = Arc::new(WalletRpc::new(Arc::clone(&transport)));
        let session = WalletSession::new(Arc::clone(&wallet));
        let ledger = Arc::new(LedgerRpc::new(
            transport,
            config.contract_address.clone(),
            Duration::from_millis(config.receipt_poll_millis),
        ));
        let gateway = Arc::new(HttpContentGateway::new(&config.store)?);
        let service =
            ArticleSyncService::new(config.clone(), ledger, Arc::clone(&gateway));
        Ok(Self {
            config,
            wallet,
            session,
            gateway,
            service,
        })
    }

    /// Connect the wallet, printing the identity in use.
    async fn connect(&self) -> Result<Address> {
        let identity = self
            .session
            .connect()
            .await
            .map_err(|e| anyhow!(render_error(&e)))?;
        println!("connected: {} ({})", identity.short(), identity);
        Ok(identity)
    }

    /// Relay workflow progress to the terminal while an operation runs.
    fn spawn_progress_printer(&self) -> tokio::task::JoinHandle<()> {
        let mut events = self.service.subscribe_events();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    WorkflowEvent::UploadStarted => println!("uploading content..."),
                    WorkflowEvent::ContentUploaded { content_hash } => {
                        println!("content stored: {content_hash}")
                    }
                    WorkflowEvent::TxSubmitted { tx_hash } => {
                        println!("transaction submitted ({tx_hash}), waiting for confirmation...")
                    }
                    WorkflowEvent::TxConfirmed { .. } => println!("transaction confirmed"),
                }
            }
        })
    }
}

/// Well-known chain ids, for the status line.
fn network_name(chain_id: &str) -> &str {
    match chain_id {
        "0x1" => "Ethereum Mainnet",
        "0x5" => "Goerli Testnet",
        "0xaa36a7" => "Sepolia Testnet",
        "0x539" => "Localhost 8545",
        "0x7a69" => "Hardhat Network",
        _ => "Unknown Network",
    }
}

/// Human-readable rendering with a recovery hint where one exists.
fn render_error(error: &ClientError) -> String {
    let hint = match error {
        ClientError::ProviderUnavailable(_) => {
            "\nhint: no wallet provider found; install one or point --rpc at a signing node"
        }
        ClientError::StoreUnreachable(_) => {
            "\nhint: start the local storage daemon (`ipfs daemon`) and retry"
        }
        ClientError::UserRejected(_) => "\nhint: the request was declined; retry when ready",
        ClientError::LedgerUnreachable(_) => "\nhint: transient network failure; retry shortly",
        _ => "",
    };
    format!("{error}{hint}")
}

fn render_timestamp(secs: u64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn print_article(article: &Article, url: String) {
    println!("#{} {}", article.id, article.title);
    println!("    author: {}", article.author);
    println!("    posted: {}", render_timestamp(article.timestamp));
    println!("    access: {}", article.access);
    println!("    raw:    {url}");
}

async fn run_status(app: &App, watch: bool) -> Result<()> {
    match app.connect().await {
        Ok(identity) => {
            let session = app.session.current_session();
            if let Some(network) = &session.network_id {
                println!("network: {} ({network})", network_name(network));
            }
            match app.service.role_for_identity(&identity).await {
                Ok(role) => println!("role: {role}"),
                Err(e) => println!("role: unknown ({})", render_error(&e)),
            }
        }
        Err(e) => println!("wallet: not connected ({e})"),
    }

    let monitor = LivenessMonitor::start(
        Arc::clone(&app.gateway),
        Duration::from_secs(app.config.liveness_poll_secs),
    );
    let mut status = monitor.subscribe();
    status
        .changed()
        .await
        .context("liveness monitor stopped unexpectedly")?;
    let alive = *status.borrow();
    println!(
        "content store: {}",
        if alive {
            "connected"
        } else {
            "not detected (start your storage daemon with `ipfs daemon`)"
        }
    );

    if watch {
        app.wallet
            .start_polling(Duration::from_secs(app.config.wallet_poll_secs));
        let mut sessions = app.session.subscribe_changes();
        println!("watching for changes (ctrl-c to stop)...");
        loop {
            tokio::select! {
                changed = status.changed() => {
                    changed.context("liveness monitor stopped")?;
                    let alive = *status.borrow();
                    println!("content store: {}", if alive { "connected" } else { "lost" });
                }
                changed = sessions.changed() => {
                    changed.context("session closed")?;
                    let session = sessions.borrow().clone();
                    match (&session.active_identity, &session.network_id) {
                        (Some(identity), Some(network)) => {
                            println!("wallet: {} on {}", identity.short(), network_name(network));
                        }
                        _ => println!("wallet: disconnected"),
                    }
                }
            }
        }
    }
    // Monitor and poller are torn down on drop; in-flight probes are
    // discarded.
    Ok(())
}

async fn run_list(app: &App, mine: bool, newest_first: bool) -> Result<()> {
    println!("loading articles...");
    let mut articles = if mine {
        let identity = app.connect().await?;
        app.service
            .list_by_author(&identity)
            .await
            .map_err(|e| anyhow!(render_error(&e)))?
    } else {
        app.service
            .list_public()
            .await
            .map_err(|e| anyhow!(render_error(&e)))?
    };

    // Display-only re-sort; ledger id order is the base ordering.
    if newest_first {
        articles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }

    if articles.is_empty() {
        println!("no articles found");
        return Ok(());
    }
    for article in &articles {
        print_article(article, app.service.public_url(&article.content_hash));
    }
    Ok(())
}

async fn run_read(app: &App, id: u64) -> Result<()> {
    // Single-item fetch: errors surface directly, no skip-and-continue.
    let article = app
        .service
        .article(id)
        .await
        .map_err(|e| anyhow!(render_error(&e)))?;

    print_article(&article, app.service.public_url(&article.content_hash));
    println!("fetching content...");
    let body = app
        .service
        .read_body(&article.content_hash)
        .await
        .map_err(|e| anyhow!(render_error(&e)))?;
    println!("\n{body}");
    Ok(())
}

async fn run_publish(app: &App, title: &str, file: &str, restricted: bool) -> Result<()> {
    app.connect().await?;
    let content = if file == "-" {
        std::io::read_to_string(std::io::stdin()).context("reading body from stdin")?
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading body from {file}"))?
    };

    let draft = ArticleDraft {
        title: title.to_string(),
        content,
        access: if restricted {
            AccessLevel::Restricted
        } else {
            AccessLevel::Public
        },
    };

    let printer = app.spawn_progress_printer();
    let outcome = app.service.publish(&draft).await;
    printer.abort();

    match outcome {
        Ok(receipt) => {
            println!("published article #{}", receipt.article_id);
            println!("content: {}", app.service.public_url(&receipt.content_hash));
            Ok(())
        }
        Err(err) => report_publish_failure(err),
    }
}

async fn run_resubmit(
    app: &App,
    title: &str,
    hash: &ContentHash,
    restricted: bool,
) -> Result<()> {
    app.connect().await?;
    let access = if restricted {
        AccessLevel::Restricted
    } else {
        AccessLevel::Public
    };

    let printer = app.spawn_progress_printer();
    let outcome = app.service.resubmit(title, hash, access).await;
    printer.abort();

    match outcome {
        Ok(receipt) => {
            println!("published article #{}", receipt.article_id);
            Ok(())
        }
        Err(err) => report_publish_failure(err),
    }
}

fn report_publish_failure(err: PublishError) -> Result<()> {
    match &err {
        PublishError::BeforeUpload { source } => {
            eprintln!("publish failed before upload: {}", render_error(source));
            eprintln!("retry the whole publish once the cause is fixed");
        }
        PublishError::AfterUpload {
            content_hash,
            source,
        } => {
            eprintln!("content uploaded, publish rejected: {}", render_error(source));
            eprintln!(
                "the body is already stored; resubmit without re-uploading:\n  denews resubmit --title <title> --hash {content_hash}"
            );
        }
    }
    Err(anyhow!("publish failed"))
}

async fn run_add_author(app: &App, author: &Address) -> Result<()> {
    let identity = app.connect().await?;

    // Panel gate: only the admin sees the author-management surface. The
    // ledger still enforces authorization on the write itself.
    let role = app
        .service
        .role_for_identity(&identity)
        .await
        .map_err(|e| anyhow!(render_error(&e)))?;
    if role != Role::Admin {
        eprintln!("access denied: the admin panel requires the contract admin");
        eprintln!("  current identity:  {identity}");
        eprintln!("  required identity: {}", app.config.admin_address);
        return Err(anyhow!("not admin"));
    }

    let printer = app.spawn_progress_printer();
    let outcome = app.service.add_author(author).await;
    printer.abort();

    match outcome {
        Ok(_) => {
            println!("author authorized: {author}");
            Ok(())
        }
        Err(e) => Err(anyhow!(render_error(&e))),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();
    let app = App::new(args.config())?;

    let result = match &args.command {
        Command::Status { watch } => run_status(&app, *watch).await,
        Command::List { mine, newest_first } => run_list(&app, *mine, *newest_first).await,
        Command::Read { id } => run_read(&app, *id).await,
        Command::Publish {
            title,
            file,
            restricted,
        } => run_publish(&app, title, file, *restricted).await,
        Command::Resubmit {
            title,
            hash,
            restricted,
        } => run_resubmit(&app, title, hash, *restricted).await,
        Command::AddAuthor { address } => run_add_author(&app, address).await,
    };

    app.session.teardown();
    app.wallet.stop_polling();
    result
}
