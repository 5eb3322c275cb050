use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bank_core::object_store::ObjectStore;
use bank_core::StoreError;

/// Connection settings for an S3 bucket or an S3-compatible endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3Settings {
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint such as a local MinIO; enables path-style addressing.
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    bucket: String,
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(bucket: impl Into<String>, client: aws_sdk_s3::Client) -> Self {
        Self {
            bucket: bucket.into(),
            client,
        }
    }

    /// Credentials come from the default AWS provider chain.
    pub async fn connect(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint_url).force_path_style(true);
        }

        Self::new(
            settings.bucket.clone(),
            aws_sdk_s3::Client::from_conf(builder.build()),
        )
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn transport_error(action: &str, key: &str, error: impl std::error::Error) -> StoreError {
    StoreError::Transport(format!(
        "failed to {action} s3 object {key}: {}",
        DisplayErrorContext(error)
    ))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| transport_error("write", key, error))
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                let missing = error
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_no_such_key());
                if missing {
                    return Err(StoreError::NotFound {
                        key: key.to_string(),
                    });
                }
                return Err(transport_error("read", key, error));
            }
        };

        let body = response
            .body
            .collect()
            .await
            .map_err(|error| transport_error("stream", key, error))?;
        Ok(body.into_bytes().to_vec())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|error| transport_error("list", prefix, error))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| transport_error("delete", key, error))
    }
}
