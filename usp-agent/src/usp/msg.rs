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

//! Message-level USP schema (subset of `usp-msg-1-2.proto`), field numbers as per the published definition.

use std::collections::HashMap;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Msg {
    #[prost(message, optional, tag = "1")]
    pub header: ::core::option::Option<Header>,
    #[prost(message, optional, tag = "2")]
    pub body: ::core::option::Option<Body>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Header {
    #[prost(string, tag = "1")]
    pub msg_id: String,
    #[prost(enumeration = "header::MsgType", tag = "2")]
    pub msg_type: i32,
}

pub mod header {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum MsgType {
        Error = 0,
        Get = 1,
        GetResp = 2,
        Notify = 3,
        Set = 4,
        SetResp = 5,
        Operate = 6,
        OperateResp = 7,
        Add = 8,
        AddResp = 9,
        Delete = 10,
        DeleteResp = 11,
        GetSupportedDm = 12,
        GetSupportedDmResp = 13,
        GetInstances = 14,
        GetInstancesResp = 15,
        NotifyResp = 16,
        GetSupportedProto = 17,
        GetSupportedProtoResp = 18,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Body {
    #[prost(oneof = "body::MsgBody", tags = "1, 2, 3")]
    pub msg_body: ::core::option::Option<body::MsgBody>,
}

pub mod body {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum MsgBody {
        #[prost(message, tag = "1")]
        Request(super::Request),
        #[prost(message, tag = "2")]
        Response(super::Response),
        #[prost(message, tag = "3")]
        Error(super::Error),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(oneof = "request::ReqType", tags = "1, 4, 5, 6, 7, 8")]
    pub req_type: ::core::option::Option<request::ReqType>,
}

pub mod request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ReqType {
        #[prost(message, tag = "1")]
        Get(super::Get),
        #[prost(message, tag = "4")]
        Set(super::Set),
        #[prost(message, tag = "5")]
        Add(super::Add),
        #[prost(message, tag = "6")]
        Delete(super::Delete),
        #[prost(message, tag = "7")]
        Operate(super::Operate),
        #[prost(message, tag = "8")]
        Notify(super::Notify),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(oneof = "response::RespType", tags = "1, 4, 5, 6, 7, 8")]
    pub resp_type: ::core::option::Option<response::RespType>,
}

pub mod response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RespType {
        #[prost(message, tag = "1")]
        GetResp(super::GetResp),
        #[prost(message, tag = "4")]
        SetResp(super::SetResp),
        #[prost(message, tag = "5")]
        AddResp(super::AddResp),
        #[prost(message, tag = "6")]
        DeleteResp(super::DeleteResp),
        #[prost(message, tag = "7")]
        OperateResp(super::OperateResp),
        #[prost(message, tag = "8")]
        NotifyResp(super::NotifyResp),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    #[prost(fixed32, tag = "1")]
    pub err_code: u32,
    #[prost(string, tag = "2")]
    pub err_msg: String,
    #[prost(message, repeated, tag = "3")]
    pub param_errs: Vec<error::ParamError>,
}

pub mod error {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ParamError {
        #[prost(string, tag = "1")]
        pub param_path: String,
        #[prost(fixed32, tag = "2")]
        pub err_code: u32,
        #[prost(string, tag = "3")]
        pub err_msg: String,
    }
}

// Get

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Get {
    #[prost(string, repeated, tag = "1")]
    pub param_paths: Vec<String>,
    #[prost(fixed32, tag = "2")]
    pub max_depth: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResp {
    #[prost(message, repeated, tag = "1")]
    pub req_path_results: Vec<get_resp::RequestedPathResult>,
}

pub mod get_resp {
    use std::collections::HashMap;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct RequestedPathResult {
        #[prost(string, tag = "1")]
        pub requested_path: String,
        #[prost(fixed32, tag = "2")]
        pub err_code: u32,
        #[prost(string, tag = "3")]
        pub err_msg: String,
        #[prost(message, repeated, tag = "4")]
        pub resolved_path_results: Vec<ResolvedPathResult>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ResolvedPathResult {
        #[prost(string, tag = "1")]
        pub resolved_path: String,
        #[prost(map = "string, string", tag = "2")]
        pub result_params: HashMap<String, String>,
    }
}

// Set

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Set {
    #[prost(bool, tag = "1")]
    pub allow_partial: bool,
    #[prost(message, repeated, tag = "2")]
    pub update_objs: Vec<set::UpdateObject>,
}

pub mod set {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UpdateObject {
        #[prost(string, tag = "1")]
        pub obj_path: String,
        #[prost(message, repeated, tag = "2")]
        pub param_settings: Vec<UpdateParamSetting>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UpdateParamSetting {
        #[prost(string, tag = "1")]
        pub param: String,
        #[prost(string, tag = "2")]
        pub value: String,
        #[prost(bool, tag = "3")]
        pub required: bool,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetResp {
    #[prost(message, repeated, tag = "1")]
    pub updated_obj_results: Vec<set_resp::UpdatedObjectResult>,
}

pub mod set_resp {
    use std::collections::HashMap;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UpdatedObjectResult {
        #[prost(string, tag = "1")]
        pub requested_path: String,
        #[prost(message, optional, tag = "2")]
        pub oper_status: ::core::option::Option<updated_object_result::OperationStatus>,
    }

    pub mod updated_object_result {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct OperationStatus {
            #[prost(oneof = "operation_status::OperStatus", tags = "1, 2")]
            pub oper_status: ::core::option::Option<operation_status::OperStatus>,
        }

        pub mod operation_status {
            #[derive(Clone, PartialEq, ::prost::Oneof)]
            pub enum OperStatus {
                #[prost(message, tag = "1")]
                OperFailure(OperationFailure),
                #[prost(message, tag = "2")]
                OperSuccess(OperationSuccess),
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct OperationFailure {
                #[prost(fixed32, tag = "1")]
                pub err_code: u32,
                #[prost(string, tag = "2")]
                pub err_msg: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct OperationSuccess {
                #[prost(message, repeated, tag = "1")]
                pub updated_inst_results: Vec<super::super::UpdatedInstanceResult>,
            }
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UpdatedInstanceResult {
        #[prost(string, tag = "1")]
        pub affected_path: String,
        #[prost(message, repeated, tag = "2")]
        pub param_errs: Vec<ParameterError>,
        #[prost(map = "string, string", tag = "3")]
        pub updated_params: HashMap<String, String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ParameterError {
        #[prost(string, tag = "1")]
        pub param: String,
        #[prost(fixed32, tag = "2")]
        pub err_code: u32,
        #[prost(string, tag = "3")]
        pub err_msg: String,
    }
}

// Add

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Add {
    #[prost(bool, tag = "1")]
    pub allow_partial: bool,
    #[prost(message, repeated, tag = "2")]
    pub create_objs: Vec<add::CreateObject>,
}

pub mod add {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreateObject {
        #[prost(string, tag = "1")]
        pub obj_path: String,
        #[prost(message, repeated, tag = "2")]
        pub param_settings: Vec<CreateParamSetting>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreateParamSetting {
        #[prost(string, tag = "1")]
        pub param: String,
        #[prost(string, tag = "2")]
        pub value: String,
        #[prost(bool, tag = "3")]
        pub required: bool,
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddResp {
    #[prost(message, repeated, tag = "1")]
    pub created_obj_results: Vec<add_resp::CreatedObjectResult>,
}

pub mod add_resp {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CreatedObjectResult {
        #[prost(string, tag = "1")]
        pub requested_path: String,
        #[prost(message, optional, tag = "2")]
        pub oper_status: ::core::option::Option<created_object_result::OperationStatus>,
    }

    pub mod created_object_result {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct OperationStatus {
            #[prost(oneof = "operation_status::OperStatus", tags = "1, 2")]
            pub oper_status: ::core::option::Option<operation_status::OperStatus>,
        }

        pub mod operation_status {
            use std::collections::HashMap;

            #[derive(Clone, PartialEq, ::prost::Oneof)]
            pub enum OperStatus {
                #[prost(message, tag = "1")]
                OperFailure(OperationFailure),
                #[prost(message, tag = "2")]
                OperSuccess(OperationSuccess),
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct OperationFailure {
                #[prost(fixed32, tag = "1")]
                pub err_code: u32,
                #[prost(string, tag = "2")]
                pub err_msg: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct OperationSuccess {
                #[prost(string, tag = "1")]
                pub instantiated_path: String,
                #[prost(message, repeated, tag = "2")]
                pub param_errs: Vec<super::super::ParameterError>,
                #[prost(map = "string, string", tag = "3")]
                pub unique_keys: HashMap<String, String>,
            }
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ParameterError {
        #[prost(string, tag = "1")]
        pub param: String,
        #[prost(fixed32, tag = "2")]
        pub err_code: u32,
        #[prost(string, tag = "3")]
        pub err_msg: String,
    }
}

// Delete

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Delete {
    #[prost(bool, tag = "1")]
    pub allow_partial: bool,
    #[prost(string, repeated, tag = "2")]
    pub obj_paths: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteResp {
    #[prost(message, repeated, tag = "1")]
    pub deleted_obj_results: Vec<delete_resp::DeletedObjectResult>,
}

pub mod delete_resp {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeletedObjectResult {
        #[prost(string, tag = "1")]
        pub requested_path: String,
        #[prost(message, optional, tag = "2")]
        pub oper_status: ::core::option::Option<deleted_object_result::OperationStatus>,
    }

    pub mod deleted_object_result {
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct OperationStatus {
            #[prost(oneof = "operation_status::OperStatus", tags = "1, 2")]
            pub oper_status: ::core::option::Option<operation_status::OperStatus>,
        }

        pub mod operation_status {
            #[derive(Clone, PartialEq, ::prost::Oneof)]
            pub enum OperStatus {
                #[prost(message, tag = "1")]
                OperFailure(OperationFailure),
                #[prost(message, tag = "2")]
                OperSuccess(OperationSuccess),
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct OperationFailure {
                #[prost(fixed32, tag = "1")]
                pub err_code: u32,
                #[prost(string, tag = "2")]
                pub err_msg: String,
            }

            #[derive(Clone, PartialEq, ::prost::Message)]
            pub struct OperationSuccess {
                #[prost(string, repeated, tag = "1")]
                pub affected_paths: Vec<String>,
                #[prost(message, repeated, tag = "2")]
                pub unaffected_path_errs: Vec<super::super::UnaffectedPathError>,
            }
        }
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UnaffectedPathError {
        #[prost(string, tag = "1")]
        pub unaffected_path: String,
        #[prost(fixed32, tag = "2")]
        pub err_code: u32,
        #[prost(string, tag = "3")]
        pub err_msg: String,
    }
}

// Operate

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operate {
    #[prost(string, tag = "1")]
    pub command: String,
    #[prost(string, tag = "2")]
    pub command_key: String,
    #[prost(bool, tag = "3")]
    pub send_resp: bool,
    #[prost(map = "string, string", tag = "4")]
    pub input_args: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OperateResp {
    #[prost(message, repeated, tag = "1")]
    pub operation_results: Vec<operate_resp::OperationResult>,
}

pub mod operate_resp {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct OperationResult {
        #[prost(string, tag = "1")]
        pub executed_command: String,
        #[prost(oneof = "operation_result::OperationResp", tags = "2, 3, 4")]
        pub operation_resp: ::core::option::Option<operation_result::OperationResp>,
    }

    pub mod operation_result {
        use std::collections::HashMap;

        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum OperationResp {
            #[prost(string, tag = "2")]
            ReqObjPath(String),
            #[prost(message, tag = "3")]
            ReqOutputArgs(OutputArgs),
            #[prost(message, tag = "4")]
            CmdFailure(CommandFailure),
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct OutputArgs {
            #[prost(map = "string, string", tag = "1")]
            pub output_args: HashMap<String, String>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct CommandFailure {
            #[prost(fixed32, tag = "1")]
            pub err_code: u32,
            #[prost(string, tag = "2")]
            pub err_msg: String,
        }
    }
}

// Notify

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Notify {
    #[prost(string, tag = "1")]
    pub subscription_id: String,
    #[prost(bool, tag = "2")]
    pub send_resp: bool,
    #[prost(oneof = "notify::Notification", tags = "3, 4, 5, 6, 7")]
    pub notification: ::core::option::Option<notify::Notification>,
}

pub mod notify {
    use std::collections::HashMap;

    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Notification {
        #[prost(message, tag = "3")]
        Event(Event),
        #[prost(message, tag = "4")]
        ValueChange(ValueChange),
        #[prost(message, tag = "5")]
        ObjCreation(ObjectCreation),
        #[prost(message, tag = "6")]
        ObjDeletion(ObjectDeletion),
        #[prost(message, tag = "7")]
        OperComplete(OperationComplete),
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Event {
        #[prost(string, tag = "1")]
        pub obj_path: String,
        #[prost(string, tag = "2")]
        pub event_name: String,
        #[prost(map = "string, string", tag = "3")]
        pub params: HashMap<String, String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ValueChange {
        #[prost(string, tag = "1")]
        pub param_path: String,
        #[prost(string, tag = "2")]
        pub param_value: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectCreation {
        #[prost(string, tag = "1")]
        pub obj_path: String,
        #[prost(map = "string, string", tag = "2")]
        pub unique_keys: HashMap<String, String>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ObjectDeletion {
        #[prost(string, tag = "1")]
        pub obj_path: String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct OperationComplete {
        #[prost(string, tag = "1")]
        pub obj_path: String,
        #[prost(string, tag = "2")]
        pub command_name: String,
        #[prost(string, tag = "3")]
        pub command_key: String,
        #[prost(oneof = "operation_complete::OperationResp", tags = "4, 5")]
        pub operation_resp: ::core::option::Option<operation_complete::OperationResp>,
    }

    pub mod operation_complete {
        use std::collections::HashMap;

        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum OperationResp {
            #[prost(message, tag = "4")]
            ReqOutputArgs(OutputArgs),
            #[prost(message, tag = "5")]
            CmdFailure(CommandFailure),
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct OutputArgs {
            #[prost(map = "string, string", tag = "1")]
            pub output_args: HashMap<String, String>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct CommandFailure {
            #[prost(fixed32, tag = "1")]
            pub err_code: u32,
            #[prost(string, tag = "2")]
            pub err_msg: String,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotifyResp {
    #[prost(string, tag = "1")]
    pub subscription_id: String,
}
