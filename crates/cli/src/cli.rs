use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use trustscan_types::RequesterRole;

pub const DEFAULT_GATEWAY: &str = "http://localhost:3000";

#[derive(Parser, Debug)]
#[command(name = "trustscan", version, about = "TrustScan CLI")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "TRUSTSCAN_GATEWAY",
        default_value = DEFAULT_GATEWAY,
        help = "Gateway base URL"
    )]
    pub gateway: String,
    #[arg(
        long,
        global = true,
        env = "TRUSTSCAN_REQUESTER_ID",
        help = "Requester id sent in the x-requester-id header"
    )]
    pub requester_id: Option<u64>,
    #[arg(long, global = true, value_enum, default_value_t = Role::Consumer)]
    pub role: Role,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a product image
    ScanImage {
        path: PathBuf,
        #[arg(long)]
        product_name: Option<String>,
    },
    /// Score decoded QR data
    ScanQr {
        data: String,
    },
    /// Look up a product hash
    Verify {
        hash: String,
    },
    /// List your scans
    History,
    /// Show a single scan
    Show {
        id: u64,
    },
    /// Register a product (business accounts)
    Register {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// List your registered products (business accounts)
    Products,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Consumer,
    Business,
}

impl From<Role> for RequesterRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Consumer => RequesterRole::Consumer,
            Role::Business => RequesterRole::Business,
        }
    }
}
