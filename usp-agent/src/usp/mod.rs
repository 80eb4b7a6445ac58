/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! USP protobuf schema plus the codec and message construction helpers used by the agent.

use prost::Message;

mod msg;
mod record;

pub use msg::*;
pub use record::{
    record::{PayloadSecurity, RecordType},
    DisconnectRecord, NoSessionContextRecord, Record, WebSocketConnectRecord,
};

use header::MsgType;
use request::ReqType;
use response::RespType;

/// USP error code: generic message failure
pub const ERR_MESSAGE_FAILED: u32 = 7000;
/// USP error code: internal error
pub const ERR_INTERNAL_ERROR: u32 = 7003;
/// USP error code: command failure
pub const ERR_COMMAND_FAILURE: u32 = 7022;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Failed to decode USP record: {0}")]
    Record(#[source] prost::DecodeError),
    #[error("Failed to decode USP message: {0}")]
    Msg(#[source] prost::DecodeError),
    #[error("Unsupported record type, expected a no-session-context record")]
    UnsupportedRecordType,
}

pub fn decode_record(bytes: &[u8]) -> Result<Record, CodecError> {
    Record::decode(bytes).map_err(CodecError::Record)
}

pub fn decode_msg(bytes: &[u8]) -> Result<Msg, CodecError> {
    Msg::decode(bytes).map_err(CodecError::Msg)
}

/// Get the encoded `Msg` carried by a session-less record
pub fn record_payload(record: &Record) -> Result<&[u8], CodecError> {
    match &record.record_type {
        Some(RecordType::NoSessionContext(ctx)) => Ok(&ctx.payload),
        _ => Err(CodecError::UnsupportedRecordType),
    }
}

/// Decode one inbound transport frame, Record first, then the enclosed Msg.
pub fn decode_frame(bytes: &[u8]) -> Result<(Record, Msg), CodecError> {
    let record = decode_record(bytes)?;
    let msg = decode_msg(record_payload(&record)?)?;
    Ok((record, msg))
}

/// Wrap `msg` into a plaintext, session-less record and encode the lot.
pub fn encode_no_session_record(version: &str, from_id: &str, to_id: &str, msg: &Msg) -> Vec<u8> {
    Record {
        version: version.to_string(),
        to_id: to_id.to_string(),
        from_id: from_id.to_string(),
        payload_security: PayloadSecurity::Plaintext.into(),
        record_type: Some(RecordType::NoSessionContext(NoSessionContextRecord {
            payload: msg.encode_to_vec(),
        })),
        ..Default::default()
    }
    .encode_to_vec()
}

pub fn msg_id(msg: &Msg) -> &str {
    msg.header.as_ref().map(|h| h.msg_id.as_str()).unwrap_or("")
}

pub fn msg_type(msg: &Msg) -> MsgType {
    msg.header
        .as_ref()
        .map(|h| h.msg_type())
        .unwrap_or(MsgType::Error)
}

pub fn request_body(msg: &Msg) -> Option<&ReqType> {
    match msg.body.as_ref()?.msg_body.as_ref()? {
        body::MsgBody::Request(Request { req_type }) => req_type.as_ref(),
        _ => None,
    }
}

pub fn response_body(msg: &Msg) -> Option<&RespType> {
    match msg.body.as_ref()?.msg_body.as_ref()? {
        body::MsgBody::Response(Response { resp_type }) => resp_type.as_ref(),
        _ => None,
    }
}

fn make_header(msg_id: &str, msg_type: MsgType) -> Option<Header> {
    Some(Header {
        msg_id: msg_id.to_string(),
        msg_type: msg_type.into(),
    })
}

/// Build a request message with the given id
pub fn request(msg_id: &str, req: ReqType) -> Msg {
    let msg_type = match req {
        ReqType::Get(_) => MsgType::Get,
        ReqType::Set(_) => MsgType::Set,
        ReqType::Add(_) => MsgType::Add,
        ReqType::Delete(_) => MsgType::Delete,
        ReqType::Operate(_) => MsgType::Operate,
        ReqType::Notify(_) => MsgType::Notify,
    };
    Msg {
        header: make_header(msg_id, msg_type),
        body: Some(Body {
            msg_body: Some(body::MsgBody::Request(Request { req_type: Some(req) })),
        }),
    }
}

/// Build a response message, `msg_id` being the id of the request this answers
pub fn response(msg_id: &str, resp: RespType) -> Msg {
    let msg_type = match resp {
        RespType::GetResp(_) => MsgType::GetResp,
        RespType::SetResp(_) => MsgType::SetResp,
        RespType::AddResp(_) => MsgType::AddResp,
        RespType::DeleteResp(_) => MsgType::DeleteResp,
        RespType::OperateResp(_) => MsgType::OperateResp,
        RespType::NotifyResp(_) => MsgType::NotifyResp,
    };
    Msg {
        header: make_header(msg_id, msg_type),
        body: Some(Body {
            msg_body: Some(body::MsgBody::Response(Response {
                resp_type: Some(resp),
            })),
        }),
    }
}

pub fn error_message<T>(msg_id: &str, err_code: u32, err_msg: T) -> Msg
where
    T: Into<String>,
{
    Msg {
        header: make_header(msg_id, MsgType::Error),
        body: Some(Body {
            msg_body: Some(body::MsgBody::Error(Error {
                err_code,
                err_msg: err_msg.into(),
                param_errs: vec![],
            })),
        }),
    }
}

/// Build an agent-originated Notify request with a fresh random message id
pub fn notify_message(subscription_id: &str, notification: notify::Notification) -> Msg {
    request(
        &uuid::Uuid::new_v4().to_string(),
        ReqType::Notify(Notify {
            subscription_id: subscription_id.to_string(),
            send_resp: true,
            notification: Some(notification),
        }),
    )
}
