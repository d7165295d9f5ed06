//! # TrustScan CLI
//!
//! TrustScan GatewayのHTTP APIを呼び出すコマンドラインクライアント。
//! 結果は整形済みJSONで標準出力に書き出す。

mod cli;
mod client;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use cli::{Cli, Commands};
use client::GatewayClient;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_file(path: &std::path::Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = GatewayClient::new(&cli.gateway, cli.requester_id, cli.role.into());

    match cli.command {
        Commands::ScanImage { path, product_name } => {
            let image = read_file(&path).await?;
            print_json(&client.scan_image(&image, product_name).await?)
        }
        Commands::ScanQr { data } => print_json(&client.scan_qr(&data).await?),
        Commands::Verify { hash } => print_json(&client.verify(&hash).await?),
        Commands::History => print_json(&client.history().await?),
        Commands::Show { id } => print_json(&client.show(id).await?),
        Commands::Register {
            name,
            description,
            image,
        } => {
            let image = match image {
                Some(path) => Some(read_file(&path).await?),
                None => None,
            };
            print_json(&client.register(&name, description, image.as_deref()).await?)
        }
        Commands::Products => print_json(&client.products().await?),
    }
}
