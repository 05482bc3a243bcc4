//! DynamoDB text store

use super::{DocumentTextRecord, TextStore, ID_ATTRIBUTE, TEXT_ATTRIBUTE};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::Region;
use aws_sdk_dynamodb::config::retry::RetryConfig;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;

const DEFAULT_REGION: &str = "us-east-1";

/// Writes records to a DynamoDB table with `PutItem`
#[derive(Debug, Clone)]
pub struct DynamoDbTextStore {
    client: Client,
    table_name: String,
}

impl DynamoDbTextStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Build a client from the ambient AWS configuration.
    ///
    /// Region resolution order: the configured region, the AWS provider chain
    /// (e.g. `AWS_REGION`), then `us-east-1`. SDK retries are disabled so each
    /// write is attempted exactly once.
    pub async fn from_config(config: &StoreConfig) -> Self {
        let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));

        let sdk_config = aws_config::from_env().region(region).load().await;

        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &config.endpoint_url {
            tracing::info!(endpoint = %endpoint, "Using custom DynamoDB endpoint");
            builder = builder.endpoint_url(endpoint.as_str());
        }

        Self::new(Client::from_conf(builder.build()), config.table_name.clone())
    }
}

#[async_trait]
impl TextStore for DynamoDbTextStore {
    async fn put_text(&self, record: &DocumentTextRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(ID_ATTRIBUTE, AttributeValue::S(record.id.clone()))
            .item(TEXT_ATTRIBUTE, AttributeValue::S(record.text.clone()))
            .send()
            .await
            .map_err(|e| Error::Storage {
                reason: format!("PutItem on `{}` failed: {}", self.table_name, DisplayErrorContext(&e)),
            })?;

        tracing::debug!(table = %self.table_name, id = %record.id, "Stored document text");
        Ok(())
    }
}
