//! Object-id and feature queries against a layer's `query` operation.
//!
//! ArcGIS servers cap how many records one query returns, so features are
//! fetched in two steps: first the ids of every matching record, then the
//! features themselves in batches of at most [`MAX_BATCH_SIZE`] ids.

use esri_json::{RawFeature, parse_feature_response, parse_object_ids};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use log::{debug, info, warn};

use crate::config::{MAX_BATCH_SIZE, OUT_SR};
use crate::error::{Esri2SfError, Result};
use crate::service::ServiceUrl;
use crate::transport::{Transport, form_fields};

/// Object ids matching a where clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdSet {
    /// No record matches.
    Empty,
    /// Matching ids in server order; never empty.
    Ids(Vec<i64>),
}

impl ObjectIdSet {
    fn from_ids(ids: Option<Vec<i64>>) -> Self {
        match ids {
            Some(ids) if !ids.is_empty() => ObjectIdSet::Ids(ids),
            _ => ObjectIdSet::Empty,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ObjectIdSet::Empty => 0,
            ObjectIdSet::Ids(ids) => ids.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, ObjectIdSet::Empty)
    }
}

/// Query the ids of all records matching `where_clause`.
///
/// # Errors
///
/// Returns a transport error if the request fails and a protocol error if
/// the response cannot be parsed or is an ArcGIS error.
pub async fn fetch_object_ids<T: Transport + ?Sized>(
    transport: &T,
    service: &ServiceUrl,
    where_clause: &str,
    token: &str,
) -> Result<ObjectIdSet> {
    let query_url = service.query_url();
    let form = form_fields(&[
        ("where", where_clause),
        ("returnIdsOnly", "true"),
        ("token", token),
        ("f", "json"),
    ]);

    let body = transport.post(&query_url, &form).await?;
    let response = parse_object_ids(&body, &format!("object ids of {service}"))?;
    let ids = ObjectIdSet::from_ids(response.object_ids);
    info!("{} object id(s) match '{where_clause}'", ids.len());
    Ok(ids)
}

/// Parameters of the batched feature queries.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// The `outFields` parameter, comma separated.
    pub out_fields: String,
    pub token: String,
    /// Ids per request, clamped to `1..=MAX_BATCH_SIZE`.
    pub batch_size: usize,
    /// Requests in flight at once; at least 1.
    pub concurrency: usize,
}

impl Default for BatchRequest {
    fn default() -> Self {
        Self {
            out_fields: "*".to_string(),
            token: String::new(),
            batch_size: MAX_BATCH_SIZE,
            concurrency: 1,
        }
    }
}

impl BatchRequest {
    fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    /// Number of requests needed for `id_count` ids.
    #[must_use]
    pub fn batch_count(&self, id_count: usize) -> usize {
        id_count.div_ceil(self.effective_batch_size())
    }
}

/// Features returned for one batch of ids.
#[derive(Debug, Clone)]
pub struct FeatureBatch {
    /// Position of the batch in the id sequence.
    pub index: usize,
    /// Number of ids requested.
    pub requested: usize,
    pub features: Vec<RawFeature>,
}

/// Lazily fetch the features of `ids`, one item per batch.
///
/// Batch `i` holds ids `[size * i, size * (i + 1))`. Items come out in batch
/// order even when several requests are in flight. Dropping the stream
/// abandons the requests still in flight.
pub fn feature_batches<'a, T: Transport + ?Sized>(
    transport: &'a T,
    service: &'a ServiceUrl,
    ids: &'a [i64],
    request: &'a BatchRequest,
) -> impl Stream<Item = Result<FeatureBatch>> + 'a {
    let query_url = service.query_url();
    stream::iter(ids.chunks(request.effective_batch_size()).enumerate())
        .map(move |(index, chunk)| fetch_batch(transport, query_url.clone(), index, chunk, request))
        .buffered(request.concurrency.max(1))
}

async fn fetch_batch<T: Transport + ?Sized>(
    transport: &T,
    query_url: String,
    index: usize,
    ids: &[i64],
    request: &BatchRequest,
) -> Result<FeatureBatch> {
    let object_ids = ids
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let form = form_fields(&[
        ("objectIds", object_ids.as_str()),
        ("outFields", request.out_fields.as_str()),
        ("token", request.token.as_str()),
        ("outSR", OUT_SR),
        ("f", "json"),
    ]);

    let body = transport.post(&query_url, &form).await?;
    let response = parse_feature_response(&body, &format!("batch {index} of {query_url}"))?;

    if response.exceeded_transfer_limit {
        warn!(
            "Batch {index}: server truncated the response at its transfer limit; lower the batch size"
        );
    }
    if response.features.len() < ids.len() {
        debug!(
            "Batch {index}: {} of {} requested features returned",
            response.features.len(),
            ids.len()
        );
    }

    Ok(FeatureBatch {
        index,
        requested: ids.len(),
        features: response.features,
    })
}

/// Fetch the features of `ids` in batches and concatenate them in id order.
///
/// # Errors
///
/// The first failing batch fails the whole fetch; no partial result is
/// returned.
pub async fn fetch_features<T: Transport + ?Sized>(
    transport: &T,
    service: &ServiceUrl,
    ids: &[i64],
    request: &BatchRequest,
) -> Result<Vec<RawFeature>> {
    info!(
        "Fetching {} feature(s) in {} batch(es)",
        ids.len(),
        request.batch_count(ids.len())
    );

    let features = feature_batches(transport, service, ids, request)
        .try_fold(Vec::with_capacity(ids.len()), |mut features, batch| async move {
            features.extend(batch.features);
            Ok::<_, Esri2SfError>(features)
        })
        .await?;

    if features.len() < ids.len() {
        info!(
            "{} of {} requested feature(s) returned",
            features.len(),
            ids.len()
        );
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_set_from_response() {
        assert_eq!(ObjectIdSet::from_ids(None), ObjectIdSet::Empty);
        assert_eq!(ObjectIdSet::from_ids(Some(Vec::new())), ObjectIdSet::Empty);
        assert_eq!(
            ObjectIdSet::from_ids(Some(vec![4, 2])),
            ObjectIdSet::Ids(vec![4, 2])
        );
        assert_eq!(ObjectIdSet::Ids(vec![1, 2, 3]).len(), 3);
        assert!(ObjectIdSet::Empty.is_empty());
    }

    #[test]
    fn batch_counts() {
        let request = BatchRequest::default();
        assert_eq!(request.batch_count(0), 0);
        assert_eq!(request.batch_count(1), 1);
        assert_eq!(request.batch_count(500), 1);
        assert_eq!(request.batch_count(501), 2);
        assert_eq!(request.batch_count(1000), 2);
        assert_eq!(request.batch_count(1200), 3);
    }

    #[test]
    fn batch_size_is_clamped() {
        let request = BatchRequest {
            batch_size: 10_000,
            ..BatchRequest::default()
        };
        assert_eq!(request.batch_count(1200), 3);

        let request = BatchRequest {
            batch_size: 0,
            ..BatchRequest::default()
        };
        assert_eq!(request.batch_count(3), 3);
    }
}
