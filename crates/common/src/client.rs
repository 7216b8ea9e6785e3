#[async_trait::async_trait]
pub trait ModuleClient: Clone + Send + Sync + 'static {
    const NAME: &'static str;
    type Client;

    fn validate_env() -> anyhow::Result<()>;
    async fn setup_connection() -> anyhow::Result<Self>;

    fn get_client(&self) -> &Self::Client;
}

/// Declares a cloneable client wrapper whose connection is built from
/// environment variables.
///
/// The `setup` block runs only after every listed variable is present and must
/// evaluate to a future of `anyhow::Result<$client_type>`.
#[macro_export]
macro_rules! define_module_client {
    {
        (struct $struct_name:ident, $client_name:expr)
        client_type: $client_type:ty,
        env: [ $( $env_var:literal ),* ],
        setup: $setup_logic:expr
    } => {
        #[derive(Clone)]
        pub struct $struct_name {
            client: std::sync::Arc<$client_type>,
        }

        impl $struct_name {
            pub fn from_client(client: $client_type) -> Self {
                Self { client: std::sync::Arc::new(client) }
            }
        }

        #[async_trait::async_trait]
        impl $crate::ModuleClient for $struct_name {
            const NAME: &'static str = $client_name;
            type Client = std::sync::Arc<$client_type>;

            fn validate_env() -> anyhow::Result<()> {
                const ENV_VARS: &'static [&'static str] = &[ $( $env_var ),* ];
                let missing_vars: Vec<&'static str> = ENV_VARS.iter().cloned().filter(|var| std::env::var(var).is_err()).collect();

                if missing_vars.is_empty() {
                    return Ok(());
                }

                let vars_str = missing_vars.join(", ");
                $crate::tracing::error!("[Client: {}] Required environment variables are not set: [{}]", $client_name, &vars_str);
                anyhow::bail!("[Client: {}] missing environment variables: [{}]", $client_name, vars_str)
            }

            async fn setup_connection() -> anyhow::Result<Self> {
                Self::validate_env()?;

                let client_instance: $client_type = $setup_logic.await?;
                $crate::tracing::info!("[Client: {}] connected", $client_name);
                Ok(Self::from_client(client_instance))
            }

            fn get_client(&self) -> &Self::Client {
                &self.client
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ModuleClient;

    define_module_client! {
        (struct GreetingClient, "greeting")
        client_type: String,
        env: ["HOTWHEELS_COMMON_TEST_GREETING_UNSET"],
        setup: async {
            Ok::<_, anyhow::Error>("hello".to_string())
        }
    }

    #[tokio::test]
    async fn missing_env_blocks_setup() {
        assert!(GreetingClient::validate_env().is_err());
        assert!(GreetingClient::setup_connection().await.is_err());

        let client = GreetingClient::from_client("hi".to_string());
        assert_eq!(client.get_client().as_str(), "hi");
    }
}
