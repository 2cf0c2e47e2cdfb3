// src/services/quote_service.rs

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidateEmail;

use crate::{
    common::error::AppError,
    models::{
        quote::{QuoteContact, QuoteItemInput, QuoteRequest, QuoteResponse},
        tour::{Tour, Vehicle},
    },
    services::catalog_service::CatalogService,
};

const BLANK: &str = "_________________";
const SEPARATOR: &str = "------------------------------";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Agrega al menos un tour a tu cotización")]
    NoTours,

    #[error("Tour no encontrado: {0}")]
    UnknownTour(String),

    #[error("Vehículo no encontrado: {0}")]
    UnknownVehicle(String),

    #[error("El tour {tour} admite entre 1 y {max} personas")]
    ParticipantsOutOfRange { tour: String, max: i32 },

    #[error("Nombre y teléfono son requeridos")]
    MissingContact,

    #[error("Email inválido")]
    InvalidEmail,

    #[error("No existe el tour #{0} en la cotización")]
    InvalidIndex(usize),

    #[error("Acción no permitida en el paso {0:?}")]
    WrongStep(QuoteStep),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStep {
    #[default]
    Tours,
    Vehicle,
    Contact,
    Confirmation,
}

// Item já resolvido contra o catálogo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteItem {
    pub tour_id: String,
    pub tour_title: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub participants: i32,
}

#[derive(Debug, Clone)]
pub enum QuoteAction {
    AddTour(QuoteItemInput),
    RemoveTour { index: usize },
    SelectVehicle(Option<String>),
    SetContact(QuoteContact),
    Next,
    Back,
}

// Visão do catálogo que o assistente consulta
pub struct QuoteCatalog {
    pub tours: Vec<Tour>,
    pub vehicles: Vec<Vehicle>,
}

impl QuoteCatalog {
    fn tour(&self, id: &str) -> Option<&Tour> {
        self.tours.iter().find(|t| t.id == id)
    }

    fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }
}

/// Estado do assistente de cotação. Cada ação devolve um rascunho novo ou o
/// erro da regra violada; o rascunho anterior nunca é alterado.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteDraft {
    pub step: QuoteStep,
    pub items: Vec<QuoteItem>,
    pub vehicle_id: Option<String>,
    pub contact: Option<QuoteContact>,
}

impl QuoteDraft {
    pub fn apply(self, action: QuoteAction, catalog: &QuoteCatalog) -> Result<QuoteDraft, QuoteError> {
        let mut next = self;

        match (next.step, action) {
            (QuoteStep::Tours, QuoteAction::AddTour(input)) => {
                let tour = catalog
                    .tour(&input.tour_id)
                    .ok_or_else(|| QuoteError::UnknownTour(input.tour_id.clone()))?;
                if input.participants < 1 || input.participants > tour.max_capacity {
                    return Err(QuoteError::ParticipantsOutOfRange {
                        tour: tour.title.clone(),
                        max: tour.max_capacity,
                    });
                }
                next.items.push(QuoteItem {
                    tour_id: tour.id.clone(),
                    tour_title: tour.title.clone(),
                    date: input.date,
                    time: input.time.filter(|t| !t.trim().is_empty()),
                    participants: input.participants,
                });
            }
            (QuoteStep::Tours, QuoteAction::RemoveTour { index }) => {
                if index >= next.items.len() {
                    return Err(QuoteError::InvalidIndex(index));
                }
                next.items.remove(index);
            }
            (QuoteStep::Vehicle, QuoteAction::SelectVehicle(vehicle_id)) => {
                if let Some(id) = &vehicle_id {
                    catalog.vehicle(id).ok_or_else(|| QuoteError::UnknownVehicle(id.clone()))?;
                }
                next.vehicle_id = vehicle_id;
            }
            (QuoteStep::Contact, QuoteAction::SetContact(contact)) => {
                validate_contact(&contact)?;
                next.contact = Some(contact);
            }
            (QuoteStep::Tours, QuoteAction::Next) => {
                if next.items.is_empty() {
                    return Err(QuoteError::NoTours);
                }
                next.step = QuoteStep::Vehicle;
            }
            (QuoteStep::Vehicle, QuoteAction::Next) => next.step = QuoteStep::Contact,
            (QuoteStep::Contact, QuoteAction::Next) => {
                if next.contact.is_none() {
                    return Err(QuoteError::MissingContact);
                }
                next.step = QuoteStep::Confirmation;
            }
            (QuoteStep::Vehicle, QuoteAction::Back) => next.step = QuoteStep::Tours,
            (QuoteStep::Contact, QuoteAction::Back) => next.step = QuoteStep::Vehicle,
            (QuoteStep::Confirmation, QuoteAction::Back) => next.step = QuoteStep::Contact,
            (step, _) => return Err(QuoteError::WrongStep(step)),
        }

        Ok(next)
    }

    pub fn total_participants(&self) -> i32 {
        self.items.iter().map(|i| i.participants).sum()
    }
}

fn validate_contact(contact: &QuoteContact) -> Result<(), QuoteError> {
    if contact.name.trim().is_empty() || contact.phone.trim().is_empty() {
        return Err(QuoteError::MissingContact);
    }
    match contact.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() && !email.validate_email() => Err(QuoteError::InvalidEmail),
        _ => Ok(()),
    }
}

const WEEKDAYS: [&str; 7] = ["lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo"];
const MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre",
    "octubre", "noviembre", "diciembre",
];

// "viernes, 20 de noviembre de 2026"
pub fn format_date_es(date: NaiveDate) -> String {
    format!(
        "{}, {} de {} de {}",
        WEEKDAYS[date.weekday().num_days_from_monday() as usize],
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

fn or_blank(value: Option<&str>) -> &str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(BLANK)
}

/// Texto enviado ao guia pelo WhatsApp no fim do assistente.
pub fn build_whatsapp_message(draft: &QuoteDraft, vehicle_name: Option<&str>) -> String {
    let contact = draft.contact.as_ref();
    let tours = draft
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. {}\n   - Fecha: {}\n   - Hora: {}\n   - Personas: {}",
                i + 1,
                item.tour_title,
                item.date.map(format_date_es).unwrap_or_else(|| "Por definir".into()),
                item.time.as_deref().unwrap_or("Por definir"),
                item.participants
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let country = contact
        .and_then(|c| c.country.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Mexico");

    format!(
        "*NUEVA SOLICITUD DE COTIZACION*\n{SEPARATOR}\n\n\
         *DATOS DEL CLIENTE*\n\
         - Nombre: {}\n\
         - Telefono: {}\n\
         - Email: {}\n\
         - Pais: {}\n\n\
         *TOURS SOLICITADOS*\n{}\n\n\
         *TRANSPORTE*\n\
         - Preferencia: {}\n\n\
         {SEPARATOR}\n\
         Quedo a la espera de su cotizacion.\nGracias.",
        or_blank(contact.map(|c| c.name.as_str())),
        or_blank(contact.map(|c| c.phone.as_str())),
        or_blank(contact.and_then(|c| c.email.as_deref())),
        country,
        tours,
        vehicle_name.unwrap_or("Sin preferencia (asignacion automatica)")
    )
}

pub fn whatsapp_url(business_number: &str, message: &str) -> Result<String, AppError> {
    let url = reqwest::Url::parse_with_params(
        &format!("https://wa.me/{}", business_number.trim_start_matches('+')),
        &[("text", message)],
    )
    .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("link do WhatsApp inválido: {e}")))?;
    Ok(url.into())
}

#[derive(Clone)]
pub struct QuoteService {
    catalog: CatalogService,
    business_number: String,
}

impl QuoteService {
    pub fn new(catalog: CatalogService, business_number: String) -> Self {
        Self { catalog, business_number }
    }

    // Reaplica o rascunho enviado pelo site passo a passo
    pub async fn submit(&self, request: QuoteRequest) -> Result<QuoteResponse, AppError> {
        let catalog = QuoteCatalog {
            tours: self.catalog.list_tours().await,
            vehicles: self.catalog.list_vehicles().await,
        };

        let mut actions: Vec<QuoteAction> = request.tours.into_iter().map(QuoteAction::AddTour).collect();
        actions.extend([
            QuoteAction::Next,
            QuoteAction::SelectVehicle(request.vehicle_id.filter(|v| !v.is_empty())),
            QuoteAction::Next,
            QuoteAction::SetContact(request.contact),
            QuoteAction::Next,
        ]);

        let draft = actions
            .into_iter()
            .try_fold(QuoteDraft::default(), |draft, action| draft.apply(action, &catalog))?;

        let vehicle_name = draft
            .vehicle_id
            .as_deref()
            .and_then(|id| catalog.vehicle(id))
            .map(|v| v.name.as_str());
        let message = build_whatsapp_message(&draft, vehicle_name);
        let whatsapp_url = whatsapp_url(&self.business_number, &message)?;

        tracing::info!("Cotização gerada: {} tours, {} pessoas", draft.items.len(), draft.total_participants());

        Ok(QuoteResponse {
            whatsapp_url,
            total_participants: draft.total_participants(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog_service::StaticCatalog;

    fn catalog() -> QuoteCatalog {
        let static_catalog = StaticCatalog::load().unwrap();
        QuoteCatalog {
            tours: static_catalog.tours,
            vehicles: static_catalog.vehicles,
        }
    }

    fn item(tour_id: &str, participants: i32) -> QuoteItemInput {
        QuoteItemInput {
            tour_id: tour_id.into(),
            date: NaiveDate::from_ymd_opt(2026, 11, 20),
            time: None,
            participants,
        }
    }

    fn contact() -> QuoteContact {
        QuoteContact {
            name: "Ana López".into(),
            phone: "+5216141234567".into(),
            email: None,
            country: None,
        }
    }

    #[test]
    fn cannot_leave_tours_step_empty() {
        let err = QuoteDraft::default().apply(QuoteAction::Next, &catalog()).unwrap_err();
        assert_eq!(err, QuoteError::NoTours);
    }

    #[test]
    fn going_back_keeps_contact_and_tours() {
        let catalog = catalog();
        let at_confirmation = [
            QuoteAction::AddTour(item("tour-creel", 2)),
            QuoteAction::Next,
            QuoteAction::Next,
            QuoteAction::SetContact(contact()),
            QuoteAction::Next,
        ]
        .into_iter()
        .try_fold(QuoteDraft::default(), |draft, action| draft.apply(action, &catalog))
        .unwrap();
        assert_eq!(at_confirmation.step, QuoteStep::Confirmation);

        let round_trip = at_confirmation
            .clone()
            .apply(QuoteAction::Back, &catalog)
            .and_then(|draft| draft.apply(QuoteAction::Next, &catalog))
            .unwrap();
        assert_eq!(round_trip, at_confirmation);
        assert_eq!(round_trip.contact, Some(contact()));
    }

    #[test]
    fn participants_are_bounded_by_tour_capacity() {
        let catalog = catalog();
        let err = QuoteDraft::default()
            .apply(QuoteAction::AddTour(item("tour-basaseachi", 19)), &catalog)
            .unwrap_err();
        assert!(matches!(err, QuoteError::ParticipantsOutOfRange { max: 18, .. }));

        let err = QuoteDraft::default()
            .apply(QuoteAction::AddTour(item("tour-basaseachi", 0)), &catalog)
            .unwrap_err();
        assert!(matches!(err, QuoteError::ParticipantsOutOfRange { .. }));
    }

    #[test]
    fn actions_outside_their_step_are_rejected() {
        let err = QuoteDraft::default()
            .apply(QuoteAction::SetContact(contact()), &catalog())
            .unwrap_err();
        assert_eq!(err, QuoteError::WrongStep(QuoteStep::Tours));
    }

    #[test]
    fn back_keeps_selected_tours() {
        let catalog = catalog();
        let draft = QuoteDraft::default()
            .apply(QuoteAction::AddTour(item("tour-creel", 2)), &catalog)
            .and_then(|d| d.apply(QuoteAction::Next, &catalog))
            .and_then(|d| d.apply(QuoteAction::Back, &catalog))
            .unwrap();
        assert_eq!(draft.step, QuoteStep::Tours);
        assert_eq!(draft.items.len(), 1);
    }

    #[test]
    fn invalid_email_is_rejected_when_present() {
        let mut c = contact();
        c.email = Some("not-an-email".into());
        assert_eq!(validate_contact(&c), Err(QuoteError::InvalidEmail));
        c.email = Some(String::new());
        assert!(validate_contact(&c).is_ok());
    }

    #[test]
    fn spanish_long_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 20).unwrap();
        assert_eq!(format_date_es(date), "viernes, 20 de noviembre de 2026");
    }

    #[test]
    fn message_lists_tours_and_transport() {
        let catalog = catalog();
        let draft = [
            QuoteAction::AddTour(item("tour-basaseachi", 4)),
            QuoteAction::AddTour(QuoteItemInput {
                tour_id: "tour-creel".into(),
                date: None,
                time: Some("09:00".into()),
                participants: 2,
            }),
            QuoteAction::Next,
            QuoteAction::SelectVehicle(None),
            QuoteAction::Next,
            QuoteAction::SetContact(contact()),
            QuoteAction::Next,
        ]
        .into_iter()
        .try_fold(QuoteDraft::default(), |d, a| d.apply(a, &catalog))
        .unwrap();

        assert_eq!(draft.step, QuoteStep::Confirmation);
        assert_eq!(draft.total_participants(), 6);

        let message = build_whatsapp_message(&draft, None);
        assert!(message.starts_with("*NUEVA SOLICITUD DE COTIZACION*"));
        assert!(message.contains("- Nombre: Ana López"));
        assert!(message.contains("- Email: _________________"));
        assert!(message.contains("- Pais: Mexico"));
        assert!(message.contains("1. Cascada de Basaseachi\n   - Fecha: viernes, 20 de noviembre de 2026"));
        assert!(message.contains("   - Fecha: Por definir\n   - Hora: 09:00\n   - Personas: 2"));
        assert!(message.contains("- Preferencia: Sin preferencia (asignacion automatica)"));
        assert!(message.ends_with("Quedo a la espera de su cotizacion.\nGracias."));
    }

    #[test]
    fn whatsapp_link_targets_business_number() {
        let url = whatsapp_url("526351200217", "Hola *guía*").unwrap();
        assert!(url.starts_with("https://wa.me/526351200217?text="));
        assert!(!url.contains(' '));
    }
}
