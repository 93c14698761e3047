//! Index inspector.
//!
//! Opens the block file named by `BTREE_PATH` (formatting a new one if it
//! does not exist), checks the tree and prints it in the configured format.

use std::io::Write;
use std::process::ExitCode;

use blocktree::btree::{BTreeError, BTreeIndex, Layout};
use blocktree::config::IndexConfig;
use blocktree::store::{BlockStore, FileStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blocktree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match IndexConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        "Loaded configuration: path={}, key_size={}, value_size={}, block_size={}",
        config.path.display(),
        config.key_size,
        config.value_size,
        config.block_size
    );

    let mut stdout = std::io::stdout().lock();
    match inspect(&config, &mut stdout) {
        Ok(()) => {
            if let Err(e) = stdout.flush() {
                tracing::error!("Failed to flush output: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn inspect(config: &IndexConfig, out: &mut impl Write) -> Result<(), BTreeError> {
    let create = !config.path.exists();
    let mut store = if create {
        FileStore::create(&config.path, config.block_size, config.block_count)?
    } else {
        FileStore::open(&config.path, config.block_size)?
    };
    tracing::info!(
        path = %store.path().display(),
        blocks = store.block_count(),
        created = create,
        "opened block store"
    );

    let layout = Layout::new(config.key_size, config.value_size);
    let mut index = BTreeIndex::attach(&mut store, 0, layout, create)?;

    index.sanity_check()?;
    tracing::info!(
        root = index.root_block(),
        height = index.height()?,
        keys = index.key_count(),
        free_blocks = index.free_block_count()?,
        "index is consistent"
    );

    index.write_display(config.display, out)?;
    index.detach()?;
    store.sync()?;

    Ok(())
}
