//! # sledストア
//!
//! 組み込みDB sled による永続ストア実装。
//!
//! ## ツリー構成
//! - `products`: 製品ID (8バイトBE) → 製品JSON
//! - `scans`: スキャンID (8バイトBE) → スキャンJSON
//! - `products_by_fingerprint`: 長さ付きフィンガープリント ‖ 製品ID → 製品ID
//! - `scans_by_fingerprint`: 長さ付きフィンガープリント ‖ スキャンID → スキャンID
//! - `products_by_business`: 事業者ID ‖ 製品ID → 製品ID
//! - `scans_by_requester`: ユーザーID ‖ スキャンID → スキャンID
//!
//! IDはビッグエンディアンで格納するため、プレフィックス走査の順序が作成順になる。
//! レコードとインデックスは1つのトランザクションで書き込む。

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::{Transactional, Tree};
use trustscan_core::store::now_unix_secs;
use trustscan_core::{ScanStore, StoreError};
use trustscan_types::{Fingerprint, NewProduct, NewScan, Product, RequesterId, Scan};

const PRODUCTS_TREE: &str = "products";
const SCANS_TREE: &str = "scans";
const PRODUCTS_BY_FINGERPRINT_TREE: &str = "products_by_fingerprint";
const SCANS_BY_FINGERPRINT_TREE: &str = "scans_by_fingerprint";
const PRODUCTS_BY_BUSINESS_TREE: &str = "products_by_business";
const SCANS_BY_REQUESTER_TREE: &str = "scans_by_requester";

/// sledによる永続ストア。
pub struct SledStore {
    db: sled::Db,
    products: Tree,
    scans: Tree,
    products_by_fingerprint: Tree,
    scans_by_fingerprint: Tree,
    products_by_business: Tree,
    scans_by_requester: Tree,
}

impl SledStore {
    /// 指定ディレクトリのデータベースを開く（存在しなければ作成）。
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let db = sled::open(path)
            .with_context(|| format!("sledデータベースを開けません: {}", path.display()))?;
        Self::from_db(db)
    }

    /// 一時データベースを開く。ドロップ時に削除される。
    #[cfg(test)]
    pub fn temporary() -> anyhow::Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .context("一時sledデータベースを開けません")?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> anyhow::Result<Self> {
        let tree = |name: &str| {
            db.open_tree(name)
                .with_context(|| format!("ツリーを開けません: {name}"))
        };
        Ok(Self {
            products: tree(PRODUCTS_TREE)?,
            scans: tree(SCANS_TREE)?,
            products_by_fingerprint: tree(PRODUCTS_BY_FINGERPRINT_TREE)?,
            scans_by_fingerprint: tree(SCANS_BY_FINGERPRINT_TREE)?,
            products_by_business: tree(PRODUCTS_BY_BUSINESS_TREE)?,
            scans_by_requester: tree(SCANS_BY_REQUESTER_TREE)?,
            db,
        })
    }

    /// 1始まりのIDを採番する。
    fn next_id(&self) -> Result<u64, StoreError> {
        self.db
            .generate_id()
            .map(|id| id + 1)
            .map_err(|e| StoreError::Backend(format!("ID採番失敗: {e}")))
    }

    /// フィンガープリントのインデックス用プレフィックス（4バイト長 ‖ 本体）。
    /// 長さを前置するので、別のフィンガープリントの前方一致にはならない。
    fn fingerprint_prefix(fingerprint: &Fingerprint) -> Vec<u8> {
        let bytes = fingerprint.as_str().as_bytes();
        let mut prefix = Vec::with_capacity(4 + bytes.len());
        prefix.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        prefix.extend_from_slice(bytes);
        prefix
    }

    fn index_key(prefix: &[u8], id: u64) -> Vec<u8> {
        let mut key = Vec::with_capacity(prefix.len() + 8);
        key.extend_from_slice(prefix);
        key.extend_from_slice(&id.to_be_bytes());
        key
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn load<T: DeserializeOwned>(tree: &Tree, id: u64) -> Result<Option<T>, StoreError> {
        tree.get(id.to_be_bytes())
            .map_err(|e| StoreError::Backend(format!("読み取り失敗: {e}")))?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    /// インデックスをプレフィックス走査し、値に格納されたIDのレコードを読み込む。
    fn load_indexed<T: DeserializeOwned>(
        index: &Tree,
        records: &Tree,
        prefix: &[u8],
        limit: Option<usize>,
    ) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for entry in index.scan_prefix(prefix) {
            if limit.is_some_and(|max| out.len() >= max) {
                break;
            }
            let (_, value) = entry.map_err(|e| StoreError::Backend(format!("走査失敗: {e}")))?;
            let id_bytes: [u8; 8] = value
                .as_ref()
                .try_into()
                .map_err(|_| StoreError::Serialization("インデックス値が8バイトではありません".into()))?;
            let id = u64::from_be_bytes(id_bytes);
            match Self::load(records, id)? {
                Some(record) => out.push(record),
                None => tracing::warn!(id, "インデックスが存在しないレコードを指しています"),
            }
        }
        Ok(out)
    }

    fn transaction_error(e: TransactionError<()>) -> StoreError {
        StoreError::Backend(format!("トランザクション失敗: {e:?}"))
    }
}

#[async_trait::async_trait]
impl ScanStore for SledStore {
    fn backend_name(&self) -> &str {
        "sled"
    }

    async fn find_product_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Product>, StoreError> {
        let prefix = Self::fingerprint_prefix(fingerprint);
        let mut found =
            Self::load_indexed(&self.products_by_fingerprint, &self.products, &prefix, Some(1))?;
        Ok(found.pop())
    }

    async fn find_scans_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Vec<Scan>, StoreError> {
        let prefix = Self::fingerprint_prefix(fingerprint);
        Self::load_indexed(&self.scans_by_fingerprint, &self.scans, &prefix, None)
    }

    async fn create_scan(&self, scan: NewScan) -> Result<Scan, StoreError> {
        let id = self.next_id()?;
        let scan = scan.into_scan(id, now_unix_secs()?);
        let record = Self::encode(&scan)?;
        let id_bytes = id.to_be_bytes();
        let fingerprint_key = scan
            .fingerprint
            .as_ref()
            .map(|fp| Self::index_key(&Self::fingerprint_prefix(fp), id));
        let requester_key = Self::index_key(&scan.requester_id.0.to_be_bytes(), id);

        (&self.scans, &self.scans_by_fingerprint, &self.scans_by_requester)
            .transaction(
                |(scans, by_fingerprint, by_requester)| -> ConflictableTransactionResult<(), ()> {
                    scans.insert(&id_bytes[..], record.as_slice())?;
                    if let Some(key) = &fingerprint_key {
                        by_fingerprint.insert(key.as_slice(), &id_bytes[..])?;
                    }
                    by_requester.insert(requester_key.as_slice(), &id_bytes[..])?;
                    Ok(())
                },
            )
            .map_err(Self::transaction_error)?;

        Ok(scan)
    }

    async fn get_scan(&self, id: u64) -> Result<Option<Scan>, StoreError> {
        Self::load(&self.scans, id)
    }

    async fn scans_by_requester(&self, requester: RequesterId) -> Result<Vec<Scan>, StoreError> {
        Self::load_indexed(
            &self.scans_by_requester,
            &self.scans,
            &requester.0.to_be_bytes(),
            None,
        )
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let id = self.next_id()?;
        let product = product.into_product(id, now_unix_secs()?);
        let record = Self::encode(&product)?;
        let id_bytes = id.to_be_bytes();
        let fingerprint_key = product
            .fingerprint
            .as_ref()
            .map(|fp| Self::index_key(&Self::fingerprint_prefix(fp), id));
        let business_key = Self::index_key(&product.business_id.0.to_be_bytes(), id);

        (&self.products, &self.products_by_fingerprint, &self.products_by_business)
            .transaction(
                |(products, by_fingerprint, by_business)| -> ConflictableTransactionResult<(), ()> {
                    products.insert(&id_bytes[..], record.as_slice())?;
                    if let Some(key) = &fingerprint_key {
                        by_fingerprint.insert(key.as_slice(), &id_bytes[..])?;
                    }
                    by_business.insert(business_key.as_slice(), &id_bytes[..])?;
                    Ok(())
                },
            )
            .map_err(Self::transaction_error)?;

        Ok(product)
    }

    async fn products_by_business(
        &self,
        business: RequesterId,
    ) -> Result<Vec<Product>, StoreError> {
        Self::load_indexed(
            &self.products_by_business,
            &self.products,
            &business.0.to_be_bytes(),
            None,
        )
    }
}
