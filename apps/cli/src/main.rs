//! kbsite CLI: builds a static knowledge-base site from a content tree.
//!
//! Sources markdown articles, `category.yml` files, a troubleshooter tree,
//! and image assets, then writes the route and redirect tables the site
//! templates render from.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
