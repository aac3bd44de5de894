//! S3/MinIO-backed object store

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::time::Duration;

use crate::config::OssConfig;
use crate::error::{AppError, AppResult};

use super::{normalize_public_read_prefix, ObjectInfo, ObjectStore};

/// Object store speaking the S3 API, path-style, suitable for MinIO.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    /// Separate client built against the public address, used for presigning
    /// so returned URLs are reachable from outside the deployment network.
    presign_client: Client,
    bucket: String,
}

fn build_client(endpoint: &str, access_key: &str, secret_key: &str) -> Client {
    let credentials = Credentials::new(access_key, secret_key, None, None, "pathjudge");

    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .endpoint_url(endpoint)
        .credentials_provider(credentials)
        .force_path_style(true)
        .build();

    Client::from_conf(config)
}

impl S3ObjectStore {
    pub fn new(cfg: &OssConfig) -> Self {
        let client = build_client(&cfg.address, &cfg.access_key, &cfg.secret_key);
        let presign_client = if cfg.public_address == cfg.address {
            client.clone()
        } else {
            build_client(&cfg.public_address, &cfg.access_key, &cfg.secret_key)
        };

        Self {
            client,
            presign_client,
            bucket: cfg.bucket_name.clone(),
        }
    }

    fn storage_err(context: &str, e: impl std::fmt::Display) -> AppError {
        AppError::Storage(format!("{}: {}", context, e))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn create_bucket_if_absent(&self) -> AppResult<()> {
        let exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok();

        if !exists {
            self.client
                .create_bucket()
                .bucket(&self.bucket)
                .send()
                .await
                .map_err(|e| Self::storage_err("create bucket", e))?;
            tracing::info!(bucket = %self.bucket, "created object-store bucket");
        }
        Ok(())
    }

    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> AppResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| Self::storage_err("upload", e))?;
        Ok(())
    }

    async fn get_bytes(&self, key: &str) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::storage_err(&format!("get object {}", key), e))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Self::storage_err("read object body", e))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::storage_err("delete object", e))?;
        Ok(())
    }

    async fn stat(&self, key: &str) -> AppResult<ObjectInfo> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::storage_err(&format!("stat object {}", key), e))?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size: head.content_length().unwrap_or(0),
            last_modified: head
                .last_modified()
                .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
            content_type: head.content_type().map(str::to_string),
            is_dir: key.ends_with('/'),
        })
    }

    async fn list(&self, prefix: &str, recursive: bool) -> AppResult<Vec<String>> {
        Ok(self
            .list_info(prefix, recursive)
            .await?
            .into_iter()
            .map(|o| o.key)
            .collect())
    }

    async fn list_info(&self, prefix: &str, recursive: bool) -> AppResult<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if !recursive {
                // the delimiter makes S3 fold sub-keys into common prefixes,
                // which we surface as pseudo-directories
                req = req.delimiter("/");
            }
            if let Some(token) = &continuation {
                req = req.continuation_token(token);
            }

            let page = req
                .send()
                .await
                .map_err(|e| Self::storage_err("list objects", e))?;

            for cp in page.common_prefixes() {
                if let Some(dir) = cp.prefix() {
                    objects.push(ObjectInfo {
                        key: dir.to_string(),
                        size: 0,
                        last_modified: None,
                        content_type: None,
                        is_dir: true,
                    });
                }
            }

            for obj in page.contents() {
                let key = obj.key().unwrap_or_default().to_string();
                objects.push(ObjectInfo {
                    is_dir: key.ends_with('/'),
                    key,
                    size: obj.size().unwrap_or(0),
                    last_modified: obj
                        .last_modified()
                        .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
                    content_type: None,
                });
            }

            match page.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(objects)
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let cfg = PresigningConfig::expires_in(ttl)
            .map_err(|e| Self::storage_err("presign config", e))?;
        let presigned = self
            .presign_client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(cfg)
            .await
            .map_err(|e| Self::storage_err("presign get", e))?;
        Ok(presigned.uri().to_string())
    }

    async fn presign_put(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let cfg = PresigningConfig::expires_in(ttl)
            .map_err(|e| Self::storage_err("presign config", e))?;
        let presigned = self
            .presign_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(cfg)
            .await
            .map_err(|e| Self::storage_err("presign put", e))?;
        Ok(presigned.uri().to_string())
    }

    async fn set_public_read_prefixes(&self, prefixes: &[String]) -> AppResult<()> {
        let mut resources = Vec::new();
        for prefix in prefixes {
            let Some(p) = normalize_public_read_prefix(prefix) else {
                continue;
            };
            let arn = format!("arn:aws:s3:::{}/{}*", self.bucket, p);
            if !resources.contains(&arn) {
                resources.push(arn);
            }
        }
        if resources.is_empty() {
            return Ok(());
        }

        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": "*",
                "Action": ["s3:GetObject"],
                "Resource": resources,
            }],
        });

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(policy.to_string())
            .send()
            .await
            .map_err(|e| Self::storage_err("set bucket policy", e))?;
        Ok(())
    }
}
