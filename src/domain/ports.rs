use crate::config::settings::CompareSettings;
use crate::domain::model::RawOfferDocument;
use crate::domain::session::Session;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn compare_settings(&self) -> Result<CompareSettings>;
    fn export_dir(&self) -> Option<&str>;
}

/// 取得報價的外部來源：頁面 → 內部 API 路徑 → 原始文件
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// 抓取頁面並取出內嵌的內部 API 路徑
    async fn resolve(&self, page_url: &str, session: &Session) -> Result<String>;

    /// 呼叫內部 API 並解析成通用結構
    async fn fetch(
        &self,
        endpoint_path: &str,
        page_url: &str,
        session: &Session,
    ) -> Result<RawOfferDocument>;
}
