use lambda_runtime::{service_fn, Error, LambdaEvent};
use nr2backlog::config::secret_name_from_env;
use nr2backlog::handler::EventProcessor;
use nr2backlog::secrets::AwsSecretStore;
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    nr2backlog::logging::init();

    let secret_name = secret_name_from_env()?;
    let store = AwsSecretStore::from_env().await;
    let processor = Arc::new(EventProcessor::new(Box::new(store), secret_name));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let processor = Arc::clone(&processor);
        async move { processor.process(event.payload).await.map_err(Error::from) }
    }))
    .await
}
