use crate::record::{RecordDescriptor, RecordQuery, WeightedRecord, DEFAULT_TTL};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_route53::operation::list_resource_record_sets::ListResourceRecordSetsOutput;
use aws_sdk_route53::types::{
    AliasTarget, Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client as Route53Client;
use std::future::Future;
use tracing::{debug, info};

/// The two calls the failover flow needs from a DNS provider.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Returns `Ok(None)` when no record matches the query.
    async fn find_record(
        &self,
        hosted_zone_id: &str,
        query: &RecordQuery,
    ) -> Result<Option<RecordDescriptor>>;

    /// Upserts the record and returns the provider's change id.
    async fn upsert_record(&self, hosted_zone_id: &str, record: &WeightedRecord) -> Result<String>;
}

pub struct Route53Provider {
    client: Route53Client,
}

impl Route53Provider {
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        Self {
            client: Route53Client::new(&config),
        }
    }

    async fn list_page(&self, hosted_zone_id: &str, cursor: PageCursor) -> Result<RecordPage> {
        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(hosted_zone_id)
            .start_record_name(cursor.name)
            .start_record_type(cursor.record_type)
            .set_start_record_identifier(cursor.identifier)
            .send()
            .await
            .with_context(|| format!("listing record sets in zone {}", hosted_zone_id))?;

        Ok(RecordPage::from(output))
    }
}

/// Where a `ListResourceRecordSets` call starts listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub name: String,
    pub record_type: RrType,
    pub identifier: Option<String>, // only set when resuming a truncated listing
}

impl PageCursor {
    pub fn start(query: &RecordQuery) -> Self {
        Self {
            name: query.name.clone(),
            record_type: RrType::from(query.record_type.as_str()),
            identifier: None,
        }
    }

    /// Cursor for the following page, if the provider says there is one.
    pub fn resume(
        is_truncated: bool,
        name: Option<String>,
        record_type: Option<RrType>,
        identifier: Option<String>,
    ) -> Option<Self> {
        if !is_truncated {
            return None;
        }

        match (name, record_type) {
            (Some(name), Some(record_type)) => Some(Self {
                name,
                record_type,
                identifier,
            }),
            _ => None,
        }
    }
}

/// One page of listed record sets plus the cursor for the next one.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub record_sets: Vec<ResourceRecordSet>,
    pub next: Option<PageCursor>,
}

impl From<ListResourceRecordSetsOutput> for RecordPage {
    fn from(output: ListResourceRecordSetsOutput) -> Self {
        let next = PageCursor::resume(
            output.is_truncated,
            output.next_record_name,
            output.next_record_type,
            output.next_record_identifier,
        );

        Self {
            record_sets: output.resource_record_sets,
            next,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanStep {
    Found(RecordDescriptor),
    NotFound,
    NextPage,
}

/// Decides what one page says about the query.
pub fn scan_page(record_sets: &[ResourceRecordSet], query: &RecordQuery) -> ScanStep {
    for record_set in record_sets {
        // Listing is sorted by name then type; past our pair means no match.
        if !is_same_set(record_set, query) {
            debug!(
                "Stopped scan at {} {}",
                record_set.name(),
                record_set.r#type().as_str()
            );
            return ScanStep::NotFound;
        }

        if record_set.set_identifier.as_deref() == Some(query.identifier.as_str()) {
            return match descriptor_from_record_set(record_set) {
                Some(descriptor) => ScanStep::Found(descriptor),
                None => ScanStep::NotFound,
            };
        }
    }

    ScanStep::NextPage
}

/// Walks pages from the query's name and type until the record turns up or
/// the listing moves past it.
pub async fn scan_record_sets<F, Fut>(
    query: &RecordQuery,
    mut fetch_page: F,
) -> Result<Option<RecordDescriptor>>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<RecordPage>>,
{
    let mut cursor = PageCursor::start(query);

    loop {
        let page = fetch_page(cursor).await?;

        match scan_page(&page.record_sets, query) {
            ScanStep::Found(descriptor) => return Ok(Some(descriptor)),
            ScanStep::NotFound => return Ok(None),
            ScanStep::NextPage => match page.next {
                Some(next) => cursor = next,
                None => return Ok(None),
            },
        }
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn find_record(
        &self,
        hosted_zone_id: &str,
        query: &RecordQuery,
    ) -> Result<Option<RecordDescriptor>> {
        scan_record_sets(query, move |cursor| {
            self.list_page(hosted_zone_id, cursor)
        })
        .await
    }

    async fn upsert_record(&self, hosted_zone_id: &str, record: &WeightedRecord) -> Result<String> {
        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(build_record_set(record)?)
            .build()?;

        let batch = ChangeBatch::builder().changes(change).build()?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(hosted_zone_id)
            .change_batch(batch)
            .send()
            .await
            .with_context(|| {
                format!(
                    "upserting {} (identifier '{}') in zone {}",
                    record.name, record.identifier, hosted_zone_id
                )
            })?;

        let change_id = output
            .change_info()
            .map(|info| info.id().to_string())
            .unwrap_or_default();

        info!(
            "DNS record {} - {} weight updated to {}. Change ID: {}",
            record.name, record.identifier, record.weight, change_id
        );

        Ok(change_id)
    }
}

fn is_same_set(record_set: &ResourceRecordSet, query: &RecordQuery) -> bool {
    record_set.name() == query.name && record_set.r#type().as_str() == query.record_type
}

/// Maps a listed record set onto a descriptor. Alias targets win; a set with
/// neither alias nor values has nothing to preserve and yields `None`.
pub fn descriptor_from_record_set(record_set: &ResourceRecordSet) -> Option<RecordDescriptor> {
    if let Some(alias) = record_set.alias_target() {
        return Some(RecordDescriptor::Alias {
            dns_name: alias.dns_name().to_string(),
            hosted_zone_id: alias.hosted_zone_id().to_string(),
        });
    }

    record_set
        .resource_records
        .as_ref()
        .map(|records| RecordDescriptor::Standard {
            values: records.iter().map(|rr| rr.value().to_string()).collect(),
            ttl: record_set.ttl.unwrap_or(DEFAULT_TTL),
        })
}

/// Builds the UPSERT payload, carrying either the alias target or the
/// TTL and values of the original record.
pub fn build_record_set(record: &WeightedRecord) -> Result<ResourceRecordSet> {
    let builder = ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(RrType::from(record.record_type.as_str()))
        .set_identifier(&record.identifier)
        .weight(record.weight);

    let builder = match &record.descriptor {
        RecordDescriptor::Alias {
            dns_name,
            hosted_zone_id,
        } => builder.alias_target(
            AliasTarget::builder()
                .dns_name(dns_name)
                .hosted_zone_id(hosted_zone_id)
                .evaluate_target_health(false)
                .build()?,
        ),
        RecordDescriptor::Standard { values, ttl } => {
            let resource_records = values
                .iter()
                .map(|value| ResourceRecord::builder().value(value).build())
                .collect::<Result<Vec<_>, _>>()?;

            builder
                .ttl(*ttl)
                .set_resource_records(Some(resource_records))
        }
    };

    Ok(builder.build()?)
}
