//! Event request message

use garage_core::{DEFAULT_FLOOR, Event, EventKind, EventStatus, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{decode, timestamp};
use crate::error::TransportError;

fn default_floor() -> String {
    DEFAULT_FLOOR.to_string()
}

/// Lane transaction as sent to the central authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Captured plate
    pub placa: String,
    /// entrada | saida | erro | manutencao
    pub tipo: EventKind,
    #[serde(with = "timestamp")]
    pub timestamp: Timestamp,
    /// Recognition confidence in `[0, 1]`
    pub confianca_lpr: f64,
    #[serde(default = "default_floor")]
    pub andar: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub valor_calculado: Option<Decimal>,
    #[serde(default)]
    pub tempo_permanencia_minutos: Option<i64>,
    #[serde(default)]
    pub erro_descricao: Option<String>,
    /// Slot reserved by the entry lane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaga: Option<usize>,
}

impl EventMessage {
    /// Decode a request frame
    pub fn decode(frame: &str) -> Result<Self, TransportError> {
        decode(frame)
    }
}

impl From<&Event> for EventMessage {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            placa: event.plate.clone(),
            tipo: event.kind,
            timestamp: event.timestamp,
            confianca_lpr: event.confidence,
            andar: event.floor.clone(),
            status: event.status,
            valor_calculado: event.fee,
            tempo_permanencia_minutos: event.duration_minutes,
            erro_descricao: event.error_description.clone(),
            vaga: event.slot,
        }
    }
}

impl From<EventMessage> for Event {
    fn from(msg: EventMessage) -> Self {
        Self {
            id: msg.id,
            plate: msg.placa,
            kind: msg.tipo,
            timestamp: msg.timestamp,
            confidence: msg.confianca_lpr,
            floor: msg.andar,
            status: msg.status,
            fee: msg.valor_calculado,
            duration_minutes: msg.tempo_permanencia_minutos,
            error_description: msg.erro_descricao,
            slot: msg.vaga,
        }
    }
}
