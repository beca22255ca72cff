use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use tracing_subscriber::{fmt, EnvFilter};

use backend::{
    classifier::SpeciesClassifier,
    object_store::ImageStore,
    recognition::{HistoryService, RecognitionPipeline},
    server,
    types::Environment,
};
use recognition_storage::recognition::RecognitionStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // Configure logging format based on environment
    // Use JSON format for staging/production, regular format for development
    match environment {
        Environment::Production | Environment::Staging => {
            fmt()
                .json()
                .with_env_filter(EnvFilter::from_default_env())
                .init();
        }
        Environment::Development => {
            fmt().with_env_filter(EnvFilter::from_default_env()).init();
        }
    }

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));

    let image_store = Arc::new(ImageStore::new(s3_client, environment.s3_bucket()));
    let classifier = Arc::new(SpeciesClassifier::new(environment.classifier_settings())?);
    let recognition_storage = Arc::new(RecognitionStorage::new(
        dynamodb_client,
        environment.recognition_table(),
    ));

    let pipeline = Arc::new(RecognitionPipeline::new(
        image_store.clone(),
        classifier,
        recognition_storage.clone(),
    ));
    let history = Arc::new(HistoryService::new(recognition_storage, image_store.clone()));

    server::start(image_store, pipeline, history).await
}
