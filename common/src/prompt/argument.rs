use std::collections::HashMap;

use crate::crypto::Hash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgError {
    #[error("Invalid value for argument '{}'", _0)]
    InvalidType(String),
    #[error("Argument '{}' not found", _0)]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Bool(bool),
    Number(u64),
    String(String),
    Hash(Hash),
}

impl ArgValue {
    fn kind(&self) -> &'static str {
        match self {
            ArgValue::Bool(_) => "bool",
            ArgValue::Number(_) => "number",
            ArgValue::String(_) => "string",
            ArgValue::Hash(_) => "hash",
        }
    }

    pub fn to_bool(self) -> Result<bool, ArgError> {
        match self {
            ArgValue::Bool(b) => Ok(b),
            other => Err(ArgError::InvalidType(other.kind().to_owned())),
        }
    }

    pub fn to_number(self) -> Result<u64, ArgError> {
        match self {
            ArgValue::Number(n) => Ok(n),
            other => Err(ArgError::InvalidType(other.kind().to_owned())),
        }
    }

    pub fn to_string_value(self) -> Result<String, ArgError> {
        match self {
            ArgValue::String(s) => Ok(s),
            other => Err(ArgError::InvalidType(other.kind().to_owned())),
        }
    }

    pub fn to_hash(self) -> Result<Hash, ArgError> {
        match self {
            ArgValue::Hash(hash) => Ok(hash),
            other => Err(ArgError::InvalidType(other.kind().to_owned())),
        }
    }
}

pub enum ArgType {
    Bool,
    Number,
    String,
    Hash,
}

impl ArgType {
    pub fn to_value(&self, name: &str, value: &str) -> Result<ArgValue, ArgError> {
        let invalid = || ArgError::InvalidType(name.to_owned());
        Ok(match self {
            ArgType::Bool => {
                let value = value.to_lowercase();
                if ["true", "yes", "y", "1"].contains(&value.as_str()) {
                    ArgValue::Bool(true)
                } else if ["false", "no", "n", "0"].contains(&value.as_str()) {
                    ArgValue::Bool(false)
                } else {
                    return Err(invalid());
                }
            }
            ArgType::Number => ArgValue::Number(value.parse().map_err(|_| invalid())?),
            ArgType::String => ArgValue::String(value.to_owned()),
            ArgType::Hash => ArgValue::Hash(value.parse().map_err(|_| invalid())?),
        })
    }
}

pub struct Arg {
    name: String,
    arg_type: ArgType,
    description: String,
}

impl Arg {
    pub fn new(name: &str, arg_type: ArgType, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            arg_type,
            description: description.to_owned(),
        }
    }

    pub fn get_name(&self) -> &String {
        &self.name
    }

    pub fn get_description(&self) -> &String {
        &self.description
    }

    pub fn parse(&self, value: &str) -> Result<ArgValue, ArgError> {
        self.arg_type.to_value(&self.name, value)
    }
}

pub struct ArgumentManager {
    arguments: HashMap<String, ArgValue>,
}

impl ArgumentManager {
    pub fn new(arguments: HashMap<String, ArgValue>) -> Self {
        Self { arguments }
    }

    pub fn get_value(&mut self, name: &str) -> Result<ArgValue, ArgError> {
        self.arguments
            .remove(name)
            .ok_or_else(|| ArgError::NotFound(name.to_owned()))
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    // Get flag value
    // If its not present, return false
    pub fn get_flag(&mut self, name: &str) -> Result<bool, ArgError> {
        self.arguments
            .remove(name)
            .map(|value| value.to_bool())
            .unwrap_or(Ok(false))
    }

    pub fn size(&self) -> usize {
        self.arguments.len()
    }
}
