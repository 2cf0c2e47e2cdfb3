// src/config.rs

use std::{env, sync::Arc};

use anyhow::Context;

use crate::{
    common::error::AppError,
    db::Repositories,
    services::{
        auth::AuthService,
        availability_service::AvailabilityLedger,
        catalog_service::{CatalogService, StaticCatalog},
        message_service::MessageService,
        notification_service::{LiveTransport, NotificationService, NotificationTransport},
        payment_service::{MercadoPagoGateway, PaymentGateway, PaymentGateways, StripeGateway},
        quote_service::QuoteService,
        reservation_service::ReservationService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_CURRENCY: &str = "usd";
const DEFAULT_WHATSAPP_BUSINESS_NUMBER: &str = "526351200217";

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: Option<String>,
}

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    /// Sem `DATABASE_URL` a API sobe com o armazenamento em memória.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub bind_addr: String,
    pub app_url: String,
    pub payment_currency: String,
    pub stripe_secret_key: Option<String>,
    pub mercadopago_access_token: Option<String>,
    pub payment_webhook_secret: Option<String>,
    pub twilio: Option<TwilioConfig>,
    pub staff_whatsapp_to: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub whatsapp_business_number: String,
    pub featured_tour_id: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

// Variável ausente ou vazia vira None
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = optional("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bcrypt_cost = match optional("BCRYPT_COST") {
            Some(cost) => cost.parse().context("BCRYPT_COST inválido")?,
            None => bcrypt::DEFAULT_COST,
        };

        let twilio = match (
            optional("TWILIO_ACCOUNT_SID"),
            optional("TWILIO_AUTH_TOKEN"),
            optional("TWILIO_WHATSAPP_FROM"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from)) => Some(TwilioConfig { account_sid, auth_token, from }),
            _ => None,
        };

        let smtp = match (optional("SMTP_HOST"), optional("SMTP_USER"), optional("SMTP_PASS")) {
            (Some(host), Some(user), Some(password)) => Some(SmtpConfig {
                host,
                port: match optional("SMTP_PORT") {
                    Some(port) => port.parse().context("SMTP_PORT inválida")?,
                    None => 587,
                },
                user,
                password,
                from: optional("SMTP_FROM"),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            jwt_secret,
            bcrypt_cost,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            app_url: optional("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.into()),
            payment_currency: optional("PAYMENT_CURRENCY")
                .unwrap_or_else(|| DEFAULT_CURRENCY.into())
                .to_lowercase(),
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            mercadopago_access_token: optional("MERCADOPAGO_ACCESS_TOKEN"),
            payment_webhook_secret: optional("PAYMENT_WEBHOOK_SECRET"),
            twilio,
            staff_whatsapp_to: optional("STAFF_WHATSAPP_TO"),
            smtp,
            whatsapp_business_number: optional("WHATSAPP_BUSINESS_NUMBER")
                .unwrap_or_else(|| DEFAULT_WHATSAPP_BUSINESS_NUMBER.into()),
            featured_tour_id: optional("FEATURED_TOUR_ID"),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }

    /// Configuração mínima, sem provedores externos.
    pub fn local(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            app_url: DEFAULT_APP_URL.into(),
            payment_currency: DEFAULT_CURRENCY.into(),
            stripe_secret_key: None,
            mercadopago_access_token: None,
            payment_webhook_secret: None,
            twilio: None,
            staff_whatsapp_to: None,
            smtp: None,
            whatsapp_business_number: DEFAULT_WHATSAPP_BUSINESS_NUMBER.into(),
            featured_tour_id: None,
            admin_email: None,
            admin_password: None,
        }
    }

    // Provedores com credenciais presentes
    pub fn payment_gateways(&self, http: &reqwest::Client) -> PaymentGateways {
        PaymentGateways {
            stripe: self
                .stripe_secret_key
                .clone()
                .map(|key| Arc::new(StripeGateway::new(http.clone(), key)) as Arc<dyn PaymentGateway>),
            mercadopago: self.mercadopago_access_token.clone().map(|token| {
                Arc::new(MercadoPagoGateway::new(http.clone(), token, self.app_url.clone())) as Arc<dyn PaymentGateway>
            }),
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub ledger: AvailabilityLedger,
    pub reservations: ReservationService,
    pub messages: MessageService,
    pub notifications: NotificationService,
    pub auth_service: AuthService,
    pub quotes: QuoteService,
}

impl AppState {
    /// Estado de produção: provedores reais conforme a configuração.
    pub fn from_config(config: &Config, repos: Repositories) -> anyhow::Result<Self> {
        let http = reqwest::Client::new();
        let gateways = config.payment_gateways(&http);
        let transport = Arc::new(LiveTransport::new(http, config.twilio.clone(), config.smtp.clone())?);

        tracing::info!(
            "Provedores: stripe={} mercadopago={} whatsapp={} smtp={}",
            gateways.stripe.is_some(),
            gateways.mercadopago.is_some(),
            config.twilio.is_some(),
            config.smtp.is_some()
        );

        Ok(Self::build(config, repos, gateways, transport)?)
    }

    // --- Monta o gráfico de dependências ---
    pub fn build(
        config: &Config,
        repos: Repositories,
        gateways: PaymentGateways,
        transport: Arc<dyn NotificationTransport>,
    ) -> Result<Self, AppError> {
        let fallback = Arc::new(StaticCatalog::load()?);

        let catalog = CatalogService::new(
            repos.catalog.clone(),
            repos.availability.clone(),
            fallback,
            config.featured_tour_id.clone(),
        );
        let ledger = AvailabilityLedger::new(repos.availability.clone(), repos.catalog.clone());
        let notifications = NotificationService::new(
            repos.notifications.clone(),
            repos.users.clone(),
            transport,
            config.staff_whatsapp_to.clone(),
        );
        let reservations = ReservationService::new(
            repos.reservations.clone(),
            catalog.clone(),
            gateways,
            notifications.clone(),
            config.payment_currency.clone(),
            config.payment_webhook_secret.clone(),
        );
        let messages = MessageService::new(repos.messages.clone(), repos.users.clone(), notifications.clone());
        let auth_service =
            AuthService::new(repos.users.clone(), config.jwt_secret.clone()).with_bcrypt_cost(config.bcrypt_cost);
        let quotes = QuoteService::new(catalog.clone(), config.whatsapp_business_number.clone());

        Ok(Self {
            catalog,
            ledger,
            reservations,
            messages,
            notifications,
            auth_service,
            quotes,
        })
    }
}
