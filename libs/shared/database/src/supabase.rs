use anyhow::{Result, anyhow};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

/// PostgREST client for the hosted Supabase project.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // Without a caller token PostgREST evaluates RLS as the anon role.
        let bearer = auth_token.unwrap_or(&self.anon_key);
        if !bearer.is_empty() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", bearer))?,
            );
        }

        Ok(headers)
    }

    /// GET `/rest/v1/{table}` with PostgREST filters as query pairs, decoding
    /// every row. Values are percent-encoded, so caller-supplied ids cannot
    /// reshape the URL.
    pub async fn select<T>(&self, table: &str, filters: &[(&str, String)], auth_token: Option<&str>) -> Result<Vec<T>>
    where T: DeserializeOwned {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        debug!("Selecting from {} with {:?}", table, filters);

        let req = self.client.get(&url)
            .headers(self.get_headers(auth_token)?)
            .query(filters);

        let rows: Vec<Value> = self.send(req).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| anyhow!("Failed to decode {} row: {}", table, e)))
            .collect()
    }

    async fn send<T>(&self, req: RequestBuilder) -> Result<T>
    where T: DeserializeOwned {
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}
