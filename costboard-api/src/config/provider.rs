use super::settings::{ConfigError, Settings};
use costboard_providers::CostProvider;
use std::sync::Arc;

pub struct ProviderManager;

impl ProviderManager {
    /// Provider codes compiled into this binary.
    pub fn available() -> Vec<&'static str> {
        let mut names = Vec::new();
        if cfg!(feature = "provider-aws") {
            names.push("aws");
        }
        if cfg!(feature = "provider-mock") {
            names.push("mock");
        }
        names
    }

    pub async fn get_provider(settings: &Settings) -> Result<Arc<dyn CostProvider>, ConfigError> {
        match settings.provider.as_str() {
            #[cfg(feature = "provider-aws")]
            "aws" => {
                let provider =
                    costboard_providers::aws::AwsCostExplorerProvider::with_region(&settings.aws_region)
                        .await;
                Ok(Arc::new(provider))
            }
            #[cfg(feature = "provider-mock")]
            "mock" => {
                let today = chrono::Utc::now().date_naive();
                Ok(Arc::new(costboard_providers::mock::MockCostProvider::sample(today)))
            }
            other => Err(ConfigError::UnknownProvider(
                other.to_string(),
                Self::available().join(", "),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_provider_is_rejected() {
        let settings = Settings {
            provider: "gcp".to_string(),
            ..Settings::default()
        };
        let err = ProviderManager::get_provider(&settings).await.err().unwrap();
        assert!(matches!(err, ConfigError::UnknownProvider(ref name, _) if name == "gcp"));
    }

    #[cfg(feature = "provider-mock")]
    #[tokio::test]
    async fn mock_provider_is_available() {
        let settings = Settings {
            provider: "mock".to_string(),
            ..Settings::default()
        };
        let provider = ProviderManager::get_provider(&settings).await.unwrap();
        assert_eq!(provider.name(), "mock");
    }
}
