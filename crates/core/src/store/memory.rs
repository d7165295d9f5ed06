//! # インメモリストア
//!
//! テスト・ローカル開発用。プロセス終了でデータは失われる。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use trustscan_types::{Fingerprint, NewProduct, NewScan, Product, RequesterId, Scan};

use super::{now_unix_secs, ScanStore, StoreError};

/// `RwLock` で保護したマップによるストア実装。
///
/// IDは1から順に採番する。`BTreeMap` のキー順がそのまま作成順になる。
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: RwLock<BTreeMap<u64, Product>>,
    scans: RwLock<BTreeMap<u64, Scan>>,
    next_product_id: AtomicU64,
    next_scan_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
        lock.read()
            .map_err(|_| StoreError::Backend("ロックが汚染されています".to_string()))
    }

    fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
        lock.write()
            .map_err(|_| StoreError::Backend("ロックが汚染されています".to_string()))
    }
}

#[async_trait::async_trait]
impl ScanStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn find_product_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Product>, StoreError> {
        let products = Self::read(&self.products)?;
        Ok(products
            .values()
            .find(|p| p.fingerprint.as_ref() == Some(fingerprint))
            .cloned())
    }

    async fn find_scans_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Vec<Scan>, StoreError> {
        let scans = Self::read(&self.scans)?;
        Ok(scans
            .values()
            .filter(|s| s.fingerprint.as_ref() == Some(fingerprint))
            .cloned()
            .collect())
    }

    async fn create_scan(&self, scan: NewScan) -> Result<Scan, StoreError> {
        let id = self.next_scan_id.fetch_add(1, Ordering::SeqCst) + 1;
        let scan = scan.into_scan(id, now_unix_secs()?);
        Self::write(&self.scans)?.insert(id, scan.clone());
        Ok(scan)
    }

    async fn get_scan(&self, id: u64) -> Result<Option<Scan>, StoreError> {
        Ok(Self::read(&self.scans)?.get(&id).cloned())
    }

    async fn scans_by_requester(&self, requester: RequesterId) -> Result<Vec<Scan>, StoreError> {
        let scans = Self::read(&self.scans)?;
        Ok(scans
            .values()
            .filter(|s| s.requester_id == requester)
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let id = self.next_product_id.fetch_add(1, Ordering::SeqCst) + 1;
        let product = product.into_product(id, now_unix_secs()?);
        Self::write(&self.products)?.insert(id, product.clone());
        Ok(product)
    }

    async fn products_by_business(
        &self,
        business: RequesterId,
    ) -> Result<Vec<Product>, StoreError> {
        let products = Self::read(&self.products)?;
        Ok(products
            .values()
            .filter(|p| p.business_id == business)
            .cloned()
            .collect())
    }
}
