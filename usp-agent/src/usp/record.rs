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

//! Record-level USP schema (subset of `usp-record-1-2.proto`).

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Record {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(string, tag = "2")]
    pub to_id: String,
    #[prost(string, tag = "3")]
    pub from_id: String,
    #[prost(enumeration = "record::PayloadSecurity", tag = "4")]
    pub payload_security: i32,
    #[prost(bytes = "vec", tag = "5")]
    pub mac_signature: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub sender_cert: Vec<u8>,
    #[prost(oneof = "record::RecordType", tags = "7, 9, 12")]
    pub record_type: ::core::option::Option<record::RecordType>,
}

pub mod record {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RecordType {
        #[prost(message, tag = "7")]
        NoSessionContext(super::NoSessionContextRecord),
        #[prost(message, tag = "9")]
        WebsocketConnect(super::WebSocketConnectRecord),
        #[prost(message, tag = "12")]
        Disconnect(super::DisconnectRecord),
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum PayloadSecurity {
        Plaintext = 0,
        Tls12 = 1,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NoSessionContextRecord {
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WebSocketConnectRecord {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisconnectRecord {
    #[prost(string, tag = "1")]
    pub reason: String,
    #[prost(fixed32, tag = "2")]
    pub reason_code: u32,
}
