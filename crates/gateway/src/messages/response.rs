//! Response message

use garage_core::{EventResponse, GateAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::decode;
use crate::error::TransportError;

/// Central authority decision as sent back to the lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub evento_id: String,
    pub sucesso: bool,
    /// abrir_cancela | cobrar_valor | negar_entrada | negar_saida | erro
    pub acao: GateAction,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub valor: Option<Decimal>,
    #[serde(default)]
    pub tempo_permanencia: Option<i64>,
    #[serde(default)]
    pub mensagem: Option<String>,
}

impl ResponseMessage {
    /// Decode a reply frame
    pub fn decode(frame: &str) -> Result<Self, TransportError> {
        decode(frame)
    }
}

impl From<&EventResponse> for ResponseMessage {
    fn from(response: &EventResponse) -> Self {
        Self {
            evento_id: response.event_id.clone(),
            sucesso: response.success,
            acao: response.action,
            valor: response.fee,
            tempo_permanencia: response.duration_minutes,
            mensagem: response.message.clone(),
        }
    }
}

impl From<ResponseMessage> for EventResponse {
    fn from(msg: ResponseMessage) -> Self {
        Self {
            event_id: msg.evento_id,
            success: msg.sucesso,
            action: msg.acao,
            fee: msg.valor,
            duration_minutes: msg.tempo_permanencia,
            message: msg.mensagem,
        }
    }
}
