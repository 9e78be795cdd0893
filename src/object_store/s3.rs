//! # S3-Compatible Object Store
//!
//! `aws-sdk-s3` client configured for path-style access against MinIO or any
//! other S3-compatible endpoint. Reads, listings and uploads run under their
//! own deadlines; bucket checks and deletes use the SDK defaults.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::client::{with_timeout, ObjectInfo, ObjectStore, PutObject, StoredObject, NAME_METADATA_KEY};
use super::errors::{ObjectStoreError, ObjectStoreResult};

/// Connection and timeout settings for the S3 store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Endpoint, with or without scheme (e.g. `localhost:9000`)
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Use https when the endpoint carries no scheme
    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_get_timeout_secs")]
    pub get_timeout_secs: u64,

    #[serde(default = "default_list_timeout_secs")]
    pub list_timeout_secs: u64,

    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_get_timeout_secs() -> u64 {
    5
}

fn default_list_timeout_secs() -> u64 {
    10
}

fn default_upload_timeout_secs() -> u64 {
    10
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            region: default_region(),
            secure: false,
            get_timeout_secs: default_get_timeout_secs(),
            list_timeout_secs: default_list_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
        }
    }
}

impl S3Config {
    /// Endpoint URL with an explicit scheme
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else if self.secure {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

/// Per-call deadlines
#[derive(Debug, Clone, Copy)]
struct Timeouts {
    get: Duration,
    list: Duration,
    upload: Duration,
}

/// Object store backed by an S3-compatible service
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    timeouts: Timeouts,
}

impl S3ObjectStore {
    /// Build a client from configuration. No network call is made here.
    pub fn new(config: &S3Config) -> ObjectStoreResult<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ObjectStoreError::InvalidConfig("endpoint is empty".into()));
        }

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "media-storage-static",
        );

        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            timeouts: Timeouts {
                get: Duration::from_secs(config.get_timeout_secs),
                list: Duration::from_secs(config.list_timeout_secs),
                upload: Duration::from_secs(config.upload_timeout_secs),
            },
        })
    }
}

fn request_error<E>(err: E) -> ObjectStoreError
where
    E: std::error::Error,
{
    ObjectStoreError::Request(DisplayErrorContext(err).to_string())
}

/// Not-found for a missing bucket or key; a bare 404 without an error code
/// also counts.
fn missing_object_error(
    bucket: &str,
    key: &str,
    code: Option<&str>,
    status: Option<u16>,
) -> Option<ObjectStoreError> {
    match (code, status) {
        (Some("NoSuchBucket"), _) => Some(ObjectStoreError::BucketNotFound(bucket.to_string())),
        (Some("NoSuchKey"), _) | (_, Some(404)) => Some(ObjectStoreError::object_not_found(bucket, key)),
        _ => None,
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<StoredObject> {
        with_timeout("get object", self.timeouts.get, async {
            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    let status = e.raw_response().map(|r| r.status().as_u16());
                    missing_object_error(bucket, key, e.code(), status)
                        .unwrap_or_else(|| request_error(e))
                })?;

            let metadata = output.metadata().cloned().unwrap_or_default();
            let content_length = output
                .content_length()
                .and_then(|len| u64::try_from(len).ok());
            let content = output
                .body
                .collect()
                .await
                .map_err(|e| ObjectStoreError::IoError(e.to_string()))?
                .into_bytes();
            let size = content_length.unwrap_or(content.len() as u64);

            Ok(StoredObject {
                info: ObjectInfo {
                    key: key.to_string(),
                    size,
                    metadata,
                },
                body: Box::pin(io::Cursor::new(content)),
            })
        })
        .await
    }

    async fn list_objects(&self, bucket: &str) -> ObjectStoreResult<Vec<ObjectInfo>> {
        with_timeout("list objects", self.timeouts.list, async {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .into_paginator()
                .send();

            let mut objects = Vec::new();
            while let Some(page) = pages.next().await {
                let page = match page {
                    Ok(page) => page,
                    Err(e) => {
                        if e.as_service_error().map(|s| s.is_no_such_bucket()).unwrap_or(false) {
                            debug!(bucket, "bucket does not exist, listing as empty");
                        } else {
                            warn!(bucket, error = %DisplayErrorContext(&e), "failed to list objects");
                        }
                        break;
                    }
                };

                for object in page.contents() {
                    let Some(key) = object.key() else { continue };
                    objects.push(ObjectInfo {
                        key: key.to_string(),
                        size: object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0),
                        metadata: Default::default(),
                    });
                }
            }
            Ok(objects)
        })
        .await
    }

    async fn bucket_exists(&self, bucket: &str) -> ObjectStoreResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().map(|s| s.is_not_found()).unwrap_or(false) => Ok(false),
            Err(e) => Err(request_error(e)),
        }
    }

    async fn make_bucket(&self, bucket: &str) -> ObjectStoreResult<()> {
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let exists = e
                    .as_service_error()
                    .map(|s| s.is_bucket_already_owned_by_you() || s.is_bucket_already_exists())
                    .unwrap_or(false);
                if exists {
                    Err(ObjectStoreError::BucketAlreadyExists(bucket.to_string()))
                } else {
                    Err(request_error(e))
                }
            }
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, object: PutObject) -> ObjectStoreResult<()> {
        debug!(
            bucket,
            key,
            name = %object.name,
            declared_size = object.size,
            "put object"
        );
        let content_length = object.body.len() as i64;
        with_timeout("put object", self.timeouts.upload, async {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .metadata(NAME_METADATA_KEY, object.name)
                .content_type(object.content_type)
                .content_length(content_length)
                .body(ByteStream::from(object.body))
                .send()
                .await
                .map_err(request_error)?;
            Ok(())
        })
        .await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(request_error)?;
        Ok(())
    }
}
