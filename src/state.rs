use std::sync::Arc;

use crate::config::Config;
use crate::services::notify::Notifier;
use crate::services::payment::{PaymentGateway, PaymentVerifier};
use crate::store::Store;

/// Shared, request-independent dependencies handed to every handler through
/// `web::Data<AppState>`.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: PaymentVerifier,
    pub jwt_secret: String,
    /// ISO currency code used for gateway orders.
    pub currency: String,
    /// Base URL of the web client, used to build password-reset links.
    pub frontend_url: String,
}

impl AppState {
    pub fn from_config(
        config: &Config,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            store,
            notifier,
            gateway,
            verifier: PaymentVerifier::new(&config.razorpay_secret),
            jwt_secret: config.jwt_secret.clone(),
            currency: config.payment_currency.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }
}
