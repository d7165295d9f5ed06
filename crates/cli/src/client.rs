//! Gateway HTTPクライアント。

use anyhow::Context;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use trustscan_types::{
    BlockchainVerifyRequest, BlockchainVerifyResponse, ImageScanRequest, ImageScanResponse,
    Product, QrScanRequest, QrScanResponse, RegisterProductRequest, RequesterRole, Scan,
    REQUESTER_ID_HEADER, REQUESTER_ROLE_HEADER,
};

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    requester_id: Option<u64>,
    role: RequesterRole,
}

impl GatewayClient {
    pub fn new(base_url: &str, requester_id: Option<u64>, role: RequesterRole) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            requester_id,
            role,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> anyhow::Result<reqwest::RequestBuilder> {
        let requester_id = self
            .requester_id
            .context("requester id is required (--requester-id or TRUSTSCAN_REQUESTER_ID)")?;
        Ok(self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .header(REQUESTER_ID_HEADER, requester_id.to_string())
            .header(REQUESTER_ROLE_HEADER, self.role.as_str()))
    }

    /// 非2xxはステータスとボディを含むエラーにする。
    async fn send<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> anyhow::Result<T> {
        let response = builder.send().await.context("failed to reach gateway")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("gateway returned {status}: {body}");
        }
        response
            .json()
            .await
            .context("failed to decode gateway response")
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> anyhow::Result<T> {
        Self::send(self.request(reqwest::Method::POST, path)?.json(body)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        Self::send(self.request(reqwest::Method::GET, path)?).await
    }

    pub async fn scan_image(
        &self,
        image: &[u8],
        product_name: Option<String>,
    ) -> anyhow::Result<ImageScanResponse> {
        let body = ImageScanRequest {
            image: base64::engine::general_purpose::STANDARD.encode(image),
            product_name,
        };
        self.post("/api/scan/upload", &body).await
    }

    pub async fn scan_qr(&self, data: &str) -> anyhow::Result<QrScanResponse> {
        let body = QrScanRequest {
            qr_data: Some(data.to_string()),
        };
        self.post("/api/scan/qr", &body).await
    }

    pub async fn verify(&self, hash: &str) -> anyhow::Result<BlockchainVerifyResponse> {
        let body = BlockchainVerifyRequest {
            hash: Some(hash.to_string()),
        };
        self.post("/api/verify/blockchain", &body).await
    }

    pub async fn history(&self) -> anyhow::Result<Vec<Scan>> {
        self.get("/api/scans").await
    }

    pub async fn show(&self, id: u64) -> anyhow::Result<Scan> {
        self.get(&format!("/api/scan/{id}")).await
    }

    pub async fn register(
        &self,
        name: &str,
        description: Option<String>,
        image: Option<&[u8]>,
    ) -> anyhow::Result<Product> {
        let body = RegisterProductRequest {
            name: name.to_string(),
            description,
            image: image.map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
        };
        self.post("/api/product/register", &body).await
    }

    pub async fn products(&self) -> anyhow::Result<Vec<Product>> {
        self.get("/api/products").await
    }
}
