use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::Url;

use crate::api::dto::MoveStageRequest;
use crate::domain::{Card, CardId, MutationResponse, PipelineError, PipelineStage};

use super::PipelineStore;

/// Store client for a remote pipeline API.
pub struct HttpStore<S> {
    http_client: reqwest::Client,
    base_url: String,
    _stage: PhantomData<fn() -> S>,
}

impl<S: PipelineStage> HttpStore<S> {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            _stage: PhantomData,
        }
    }

    fn cards_url(&self) -> String {
        format!("{}/api/pipelines/{}/cards", self.base_url, S::PIPELINE)
    }

    /// Card ids are free-form, so they go in as one percent-encoded path segment.
    fn stage_url(&self, card_id: &CardId) -> Result<Url, PipelineError> {
        let mut url = Url::parse(&self.cards_url())
            .map_err(|e| PipelineError::Internal(format!("Invalid pipeline API url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PipelineError::Internal(format!("Pipeline API url cannot take a path: {}", self.base_url)))?
            .push(card_id.as_str())
            .push("stage");
        Ok(url)
    }
}

#[async_trait]
impl<S: PipelineStage> PipelineStore<S> for HttpStore<S> {
    async fn list_cards(&self) -> Result<Vec<Card<S>>, PipelineError> {
        let response = self.http_client.get(self.cards_url()).send().await?;

        if !response.status().is_success() {
            return Err(PipelineError::Internal(format!(
                "Listing {} failed with status {}",
                S::PIPELINE,
                response.status()
            )));
        }

        let cards = response.json::<Vec<Card<S>>>().await?;
        Ok(cards)
    }

    async fn move_card(
        &self,
        card_id: &CardId,
        new_stage: S,
    ) -> Result<MutationResponse, PipelineError> {
        let response = self
            .http_client
            .patch(self.stage_url(card_id)?)
            .json(&MoveStageRequest {
                stage: new_stage.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<MutationResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Ok(MutationResponse::error(format!(
                "Request failed with status {}",
                status
            ))),
            Err(err) => Err(PipelineError::Serialization(err)),
        }
    }
}
