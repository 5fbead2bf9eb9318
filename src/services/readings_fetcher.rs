use crate::error::DexcomError;
use crate::models::app_config::DexcomEndpoints;
use crate::models::readings::{EgvsResponse, RangeQuery, Reading, format_timestamp};
use crate::services::http;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct ReadingsFetcher {
    http: reqwest::Client,
    endpoints: DexcomEndpoints,
}

impl ReadingsFetcher {
    pub fn new(http: reqwest::Client, endpoints: DexcomEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Fetches the estimated glucose values inside `range`, in the order the
    /// API returned them. Failures are returned as-is; nothing is retried.
    pub async fn fetch_readings(
        &self,
        access_token: &str,
        range: &RangeQuery,
    ) -> Result<Vec<Reading>, DexcomError> {
        if !range.is_ordered() {
            return Err(DexcomError::InvalidRange);
        }

        let format = |ts| {
            format_timestamp(&ts)
                .map_err(|e| DexcomError::InvalidInput(format!("cannot format timestamp: {e}")))
        };
        let start = format(range.start())?;
        let end = format(range.end())?;

        let response = self
            .http
            .get(self.endpoints.egvs.clone())
            .bearer_auth(access_token)
            .query(&[("startDate", start.as_str()), ("endDate", end.as_str())])
            .send()
            .await
            .map_err(http::transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(http::transport_error)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "egvs request failed");
            return Err(http::data_status_error(status, &body));
        }

        let parsed: EgvsResponse = serde_json::from_str(&body).map_err(|e| DexcomError::Api {
            status: status.as_u16(),
            message: format!("malformed egvs response: {e}"),
        })?;

        let readings = parsed
            .egvs
            .into_iter()
            .map(Reading::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DexcomError::Api {
                status: status.as_u16(),
                message: e.to_string(),
            })?;

        info!(count = readings.len(), start = %start, end = %end, "fetched glucose readings");
        Ok(readings)
    }
}
