//! Name-addressed operation registry.
//!
//! An [`OperationDescriptor`] is a pair of plain function pointers generated
//! from an [`Operation`] impl. Arguments go in and outputs come out as
//! `serde_json::Value`, so callers that only know an operation's name can
//! still drive it. Registering one operation never touches another.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::{RawResponse, RequestPayload};
use crate::operation::{GetCardList, GetModelRoot, GetNextCard, GetVersion, GradeCard, Operation, Test};

pub type SendFn = fn(&Value) -> Result<RequestPayload, ApiError>;
pub type RecvFn = fn(&RawResponse) -> Result<Value, ApiError>;

#[derive(Clone, Copy)]
pub struct OperationDescriptor {
    name: &'static str,
    send: SendFn,
    recv: RecvFn,
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor").field("name", &self.name).finish()
    }
}

impl OperationDescriptor {
    pub fn of<O: Operation>() -> Self {
        Self {
            name: O::NAME,
            send: send_erased::<O>,
            recv: recv_erased::<O>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Shape a request. `Value::Null` stands for "no arguments".
    pub fn send(&self, args: &Value) -> Result<RequestPayload, ApiError> {
        (self.send)(args)
    }

    pub fn recv(&self, raw: &RawResponse) -> Result<Value, ApiError> {
        (self.recv)(raw)
    }
}

fn send_erased<O: Operation>(args: &Value) -> Result<RequestPayload, ApiError> {
    let args: O::Args = decode_args(O::NAME, args)?;
    O::send(&args)
}

fn recv_erased<O: Operation>(raw: &RawResponse) -> Result<Value, ApiError> {
    let output = O::recv(raw)?;
    serde_json::to_value(output).map_err(|e| ApiError::Serialization(e.to_string()))
}

// `null` and `{}` both mean "no arguments": either must decode unit arguments
// and structs whose fields all default. The error reported is the one for the
// value the caller passed.
fn decode_args<A: DeserializeOwned>(operation: &'static str, args: &Value) -> Result<A, ApiError> {
    let decoded = match args {
        Value::Null => serde_json::from_value(Value::Null)
            .or_else(|e| serde_json::from_value(Value::Object(Map::new())).map_err(|_| e)),
        Value::Object(map) if map.is_empty() => serde_json::from_value(args.clone())
            .or_else(|e| serde_json::from_value(Value::Null).map_err(|_| e)),
        other => serde_json::from_value(other.clone()),
    };
    decoded.map_err(|e| ApiError::InvalidArguments {
        operation,
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: BTreeMap<&'static str, OperationDescriptor>,
}

impl OperationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// `Test`, `GetVersion`, `GetCardList`, `GetNextCard` and `GradeCard`.
    pub fn baseline() -> Self {
        let mut registry = Self::new();
        registry.insert(OperationDescriptor::of::<Test>());
        registry.insert(OperationDescriptor::of::<GetVersion>());
        registry.insert(OperationDescriptor::of::<GetModelRoot>());
        registry.insert(OperationDescriptor::of::<GetCardList>());
        registry.insert(OperationDescriptor::of::<GetNextCard>());
        registry.insert(OperationDescriptor::of::<GradeCard>());
        registry
    }

    /// Add `descriptor`, returning whatever was registered under its name.
    pub fn insert(&mut self, descriptor: OperationDescriptor) -> Option<OperationDescriptor> {
        self.operations.insert(descriptor.name, descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }
}
