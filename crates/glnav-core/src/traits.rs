//! Core traits for glnav configuration.
//!
//! The primary trait is [`ConfigProvider`], which abstracts the connection
//! settings a remote client needs so that the client crate does not depend
//! on how (or where) the CLI loads its configuration.

use std::time::Duration;

use crate::Result;

/// Trait for connection configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use glnav_core::traits::ConfigProvider;
/// use glnav_core::Result;
///
/// #[derive(Clone)]
/// struct StaticConfig;
///
/// impl ConfigProvider for StaticConfig {
///     fn project_name(&self) -> &str {
///         "glnav"
///     }
///
///     fn instance_url(&self) -> Result<String> {
///         Ok("https://gitlab.example.com".into())
///     }
///
///     fn private_token(&self) -> Result<String> {
///         Ok("glpat-xxxx".into())
///     }
/// }
///
/// assert_eq!(StaticConfig.request_timeout(), Duration::from_secs(20));
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Base URL of the remote instance.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no URL is configured.
    fn instance_url(&self) -> Result<String>;

    /// Personal access token used to authenticate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no token is configured.
    fn private_token(&self) -> Result<String>;

    /// Timeout applied to every remote request.
    fn request_timeout(&self) -> Duration {
        Duration::from_secs(20)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Clone)]
    struct TestConfig {
        url: Option<String>,
        token: Option<String>,
    }

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            "test"
        }

        fn instance_url(&self) -> Result<String> {
            self.url.clone().ok_or_else(|| Error::config("missing url"))
        }

        fn private_token(&self) -> Result<String> {
            self.token.clone().ok_or_else(|| Error::config("missing token"))
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(5)
        }
    }

    #[test]
    fn test_config_provider_values() {
        let config = TestConfig {
            url: Some("https://gitlab.example.com".into()),
            token: Some("secret".into()),
        };
        assert_eq!(config.instance_url().unwrap(), "https://gitlab.example.com");
        assert_eq!(config.private_token().unwrap(), "secret");
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_provider_missing_values() {
        let config = TestConfig {
            url: None,
            token: None,
        };
        assert!(matches!(config.instance_url(), Err(Error::Config(_))));
        assert!(matches!(config.private_token(), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_provider_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TestConfig>();
    }
}
