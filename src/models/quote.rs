// src/models/quote.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Um tour escolhido no passo 1 do assistente de cotação
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItemInput {
    pub tour_id: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub participants: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

// Rascunho completo enviado pelo site ao final do assistente
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub tours: Vec<QuoteItemInput>,
    pub vehicle_id: Option<String>,
    pub contact: QuoteContact,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub message: String,
    pub whatsapp_url: String,
    pub total_participants: i32,
}
