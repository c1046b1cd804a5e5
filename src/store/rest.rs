use reqwest::{Client, Method, RequestBuilder, Response};

use super::*;

/// Scores stored behind a PostgREST endpoint, such as the one Supabase exposes.
pub struct RestStore {
    client: Client,
    endpoint: String,
    service_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, service_key: impl Into<String>, table: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            service_key: service_key.into(),
        }
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

fn order_param(query: &ScoreQuery) -> String {
    query
        .order
        .iter()
        .map(|order| {
            let direction = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            format!("{}.{}", order.key.column(), direction)
        })
        .collect::<Vec<_>>()
        .join(",")
}

async fn read_rows(response: Response) -> StoreResult<Vec<ScoreEntry>> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[rocket::async_trait]
impl ScoreStore for RestStore {
    async fn query(&self, query: &ScoreQuery) -> StoreResult<Vec<ScoreEntry>> {
        let mut params = vec![("select", COLUMNS.to_owned())];
        if !query.order.is_empty() {
            params.push(("order", order_param(query)));
        }
        params.push(("limit", query.limit.to_string()));

        let response = self.request(Method::GET).query(&params).send().await?;
        read_rows(response).await
    }

    async fn insert(&self, score: &NewScore) -> StoreResult<ScoreEntry> {
        let response = self
            .request(Method::POST)
            .query(&[("select", COLUMNS)])
            .header("Prefer", "return=representation")
            .json(&[score])
            .send()
            .await?;

        read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed("insert returned no rows".to_owned()))
    }
}
