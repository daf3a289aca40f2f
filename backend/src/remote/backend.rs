//! The seam between the explorer and the remote analysis service.

use async_trait::async_trait;

use super::error::RemoteResult;
use crate::api::{
    AnalysisQuery, AnalysisResult, ParcelSearchResponse, PixelQuery, PixelValues,
    VisualizeRequest, VisualizeResponse,
};

/// Remote satellite analysis service.
///
/// One method per endpoint. Implementations translate every failure into a
/// [`RemoteError`](super::RemoteError); none of them panic on a bad response.
#[async_trait]
pub trait ExplorerBackend: Send + Sync {
    /// `POST /calculate/biomass`
    async fn analyze(&self, query: &AnalysisQuery) -> RemoteResult<AnalysisResult>;

    /// `POST /visualize/batch`
    async fn visualize_batch(&self, request: &VisualizeRequest) -> RemoteResult<VisualizeResponse>;

    /// `POST /api/pixel-value`
    async fn pixel_value(&self, query: &PixelQuery) -> RemoteResult<PixelValues>;

    /// `GET /api/uldk/search?q=`
    async fn search_parcel(&self, query: &str) -> RemoteResult<ParcelSearchResponse>;

    /// `GET /api/uldk/locate?lat=&lng=`
    async fn locate_parcel(&self, lat: f64, lng: f64) -> RemoteResult<ParcelSearchResponse>;

    /// Short name for logs and the health endpoint.
    fn name(&self) -> &'static str;
}
