//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};

/// Settings for the external species classifier endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierSettings {
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,
    /// Bearer token for the API
    pub api_key: String,
    /// Model name to request
    pub model: String,
}

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the S3 bucket name for uploaded images
    ///
    /// # Panics
    ///
    /// Panics if `S3_BUCKET_NAME` is not set outside development
    #[must_use]
    pub fn s3_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => {
                env::var("S3_BUCKET_NAME").expect("S3_BUCKET_NAME environment variable is not set")
            }
            Self::Development => {
                env::var("S3_BUCKET_NAME").unwrap_or_else(|_| "species-lens-images".to_string())
            }
        }
    }

    /// Returns the `DynamoDB` table name for recognition records
    ///
    /// # Panics
    ///
    /// Panics if `RECOGNITION_TABLE_NAME` is not set outside development
    #[must_use]
    pub fn recognition_table(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("RECOGNITION_TABLE_NAME")
                .expect("RECOGNITION_TABLE_NAME environment variable is not set"),
            Self::Development => env::var("RECOGNITION_TABLE_NAME")
                .unwrap_or_else(|_| "species-recognitions".to_string()),
        }
    }

    /// Returns the classifier endpoint settings
    ///
    /// # Panics
    ///
    /// Panics if `CLASSIFIER_API_KEY` is not set outside development
    #[must_use]
    pub fn classifier_settings(&self) -> ClassifierSettings {
        let api_base = env::var("CLASSIFIER_API_BASE")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model =
            env::var("CLASSIFIER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let api_key = match self {
            Self::Production | Self::Staging => env::var("CLASSIFIER_API_KEY")
                .expect("CLASSIFIER_API_KEY environment variable is not set"),
            Self::Development => {
                env::var("CLASSIFIER_API_KEY").unwrap_or_else(|_| "local-dev-key".to_string())
            }
        };

        ClassifierSettings {
            api_base,
            api_key,
            model,
        }
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        // Test development (default)
        env::remove_var("APP_ENV");
        assert_eq!(Environment::from_env(), Environment::Development);

        // Test explicit development
        env::set_var("APP_ENV", "development");
        assert_eq!(Environment::from_env(), Environment::Development);

        // Test staging
        env::set_var("APP_ENV", "staging");
        assert_eq!(Environment::from_env(), Environment::Staging);

        // Test production
        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Invalid environment: invalid")]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let _ = Environment::from_env();
    }

    #[test]
    #[serial]
    fn test_development_defaults() {
        env::remove_var("S3_BUCKET_NAME");
        env::remove_var("RECOGNITION_TABLE_NAME");

        let env = Environment::Development;
        assert_eq!(env.s3_bucket(), "species-lens-images");
        assert_eq!(env.recognition_table(), "species-recognitions");
        assert_eq!(
            env.override_aws_endpoint_url(),
            Some("http://localhost:4566")
        );
    }

    #[test]
    #[serial]
    fn test_classifier_settings_defaults() {
        env::remove_var("CLASSIFIER_API_BASE");
        env::remove_var("CLASSIFIER_API_KEY");
        env::remove_var("CLASSIFIER_MODEL");

        let settings = Environment::Development.classifier_settings();
        assert_eq!(settings.api_base, "https://api.openai.com/v1");
        assert_eq!(settings.model, "gpt-4o-mini");

        env::set_var("CLASSIFIER_MODEL", "gpt-4o");
        let settings = Environment::Development.classifier_settings();
        assert_eq!(settings.model, "gpt-4o");

        env::remove_var("CLASSIFIER_MODEL");
    }

    #[test]
    #[serial]
    fn test_bucket_env_override() {
        env::set_var("S3_BUCKET_NAME", "species-lens-staging");
        assert_eq!(Environment::Staging.s3_bucket(), "species-lens-staging");
        env::remove_var("S3_BUCKET_NAME");
    }
}
