//! DynamoDB-backed record store.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use coffer_core::outbound::{OutboundFailure, OutboundGuard};
use coffer_core::owner::{
    OwnerRecord, PageToken, PutCondition, RecordFilter, RecordStore, RecordStoreError, ScanPage,
    fields,
};
use coffer_shared::config::RecordStoreConfig;

use super::filter;
use super::item::{from_item, to_item};

/// [`RecordStore`] over one DynamoDB table.
///
/// The table's composite primary key is (`PKey`, `SKey`). Records are
/// written whole with `PutItem`; there is no partial update.
pub struct DynamoRecordStore {
    client: Client,
    table_name: String,
    guard: OutboundGuard,
}

impl DynamoRecordStore {
    /// Create a store, loading AWS settings from the environment.
    pub async fn new(config: &RecordStoreConfig, guard: OutboundGuard) -> Self {
        let client = build_client(config).await;
        Self::from_client(client, config, guard)
    }

    /// Create a store over an existing client.
    pub fn from_client(client: Client, config: &RecordStoreConfig, guard: OutboundGuard) -> Self {
        Self {
            client,
            table_name: config.table_name.clone(),
            guard,
        }
    }

    /// Table name in use.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Build a DynamoDB client for `config`, honoring `endpoint_url`.
pub async fn build_client(config: &RecordStoreConfig) -> Client {
    let mut aws_config =
        aws_config::from_env().region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        aws_config = aws_config.endpoint_url(endpoint);
    }

    let sdk_config = aws_config.load().await;
    Client::new(&sdk_config)
}

fn flatten(failure: OutboundFailure<RecordStoreError>) -> RecordStoreError {
    match failure {
        OutboundFailure::Timeout(after) => RecordStoreError::Timeout(after),
        OutboundFailure::Failed(err) => err,
    }
}

fn key_of(item: &HashMap<String, AttributeValue>) -> Option<PageToken> {
    match (item.get(fields::PARTITION_KEY), item.get(fields::SORT_KEY)) {
        (Some(AttributeValue::S(pk)), Some(AttributeValue::S(sk))) => Some(PageToken {
            partition_key: pk.clone(),
            sort_key: sk.clone(),
        }),
        _ => None,
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn get(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<OwnerRecord>, RecordStoreError> {
        let request = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(fields::PARTITION_KEY, AttributeValue::S(partition_key.to_owned()))
            .key(fields::SORT_KEY, AttributeValue::S(sort_key.to_owned()))
            .send();

        let result = self
            .guard
            .call("get", partition_key, async {
                request
                    .await
                    .map_err(|e| RecordStoreError::Backend(e.to_string()))
            })
            .await
            .map_err(flatten)?;

        result.item().map(from_item).transpose()
    }

    async fn put(
        &self,
        record: &OwnerRecord,
        condition: Option<PutCondition>,
    ) -> Result<(), RecordStoreError> {
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(record)));

        if condition == Some(PutCondition::NotExists) {
            request = request
                .condition_expression("attribute_not_exists(#pk)")
                .expression_attribute_names("#pk", fields::PARTITION_KEY);
        }

        self.guard
            .call("put", &record.id, async {
                match request.send().await {
                    Ok(_) => Ok(()),
                    Err(err) => {
                        let service_err = err.into_service_error();
                        if service_err.is_conditional_check_failed_exception() {
                            Err(RecordStoreError::ConditionFailed {
                                partition_key: record.id.clone(),
                            })
                        } else {
                            Err(RecordStoreError::Backend(service_err.to_string()))
                        }
                    }
                }
            })
            .await
            .map_err(flatten)
    }

    async fn delete(&self, partition_key: &str, sort_key: &str) -> Result<(), RecordStoreError> {
        let request = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(fields::PARTITION_KEY, AttributeValue::S(partition_key.to_owned()))
            .key(fields::SORT_KEY, AttributeValue::S(sort_key.to_owned()))
            .send();

        self.guard
            .call("delete", partition_key, async {
                request
                    .await
                    .map(|_| ())
                    .map_err(|e| RecordStoreError::Backend(e.to_string()))
            })
            .await
            .map_err(flatten)
    }

    async fn scan(
        &self,
        filter: &RecordFilter,
        start: Option<PageToken>,
    ) -> Result<ScanPage, RecordStoreError> {
        let mut request = self.client.scan().table_name(&self.table_name);

        if let Some(expr) = filter::build(filter) {
            request = request
                .filter_expression(expr.expression)
                .set_expression_attribute_names(Some(expr.names))
                .set_expression_attribute_values(Some(expr.values));
        }
        if let Some(token) = start {
            request = request.set_exclusive_start_key(Some(HashMap::from([
                (
                    fields::PARTITION_KEY.to_string(),
                    AttributeValue::S(token.partition_key),
                ),
                (
                    fields::SORT_KEY.to_string(),
                    AttributeValue::S(token.sort_key),
                ),
            ])));
        }

        let response = self
            .guard
            .call("scan", &self.table_name, async {
                request
                    .send()
                    .await
                    .map_err(|e| RecordStoreError::Backend(e.to_string()))
            })
            .await
            .map_err(flatten)?;

        let records = response
            .items()
            .iter()
            .map(from_item)
            .collect::<Result<Vec<_>, _>>()?;
        let next = response.last_evaluated_key().and_then(key_of);

        Ok(ScanPage { records, next })
    }
}
