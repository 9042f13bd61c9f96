//! Application state management
//!
//! Shared resources handed to every handler. All fields are Arc-backed or
//! otherwise cheap to clone; state is read-only during request handling.

use crate::auth::JwtVerifier;
use crate::config::AppConfig;
use crate::gateway::FoodAnalysisGateway;
use crate::repositories::{DailyLogRepository, ProfileRepository};
use crate::services::{LedgerService, OnboardingService};
use crate::store::DocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Document store behind the repository layer
    pub store: Arc<dyn DocumentStore>,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized token verifier
    pub jwt: JwtVerifier,
    /// Generative analysis gateway
    pub gateway: Arc<FoodAnalysisGateway>,
    /// Prometheus render handle for the /metrics endpoint
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: AppConfig,
        gateway: Arc<FoodAnalysisGateway>,
        metrics: PrometheusHandle,
    ) -> Self {
        // The decoding key is derived once, not per request
        let jwt = JwtVerifier::new(&config.auth.jwt_secret);
        Self {
            store,
            config: Arc::new(config),
            jwt,
            gateway,
            metrics,
        }
    }

    #[inline]
    pub fn jwt(&self) -> &JwtVerifier {
        &self.jwt
    }

    /// Ledger service bound to this state's store and gateway
    pub fn ledger(&self) -> LedgerService {
        LedgerService::new(
            DailyLogRepository::new(Arc::clone(&self.store)),
            ProfileRepository::new(Arc::clone(&self.store)),
            Arc::clone(&self.gateway),
        )
    }

    /// Onboarding service bound to this state's store
    pub fn onboarding(&self) -> OnboardingService {
        OnboardingService::new(ProfileRepository::new(Arc::clone(&self.store)))
    }
}
